//! Nostr relay connection using nostr-sdk.

use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bridge::SourceNotification;
use crate::common::error::{ConfigError, ConnectError};
use crate::common::SourceEvent;

use super::EventSource;

/// How often the connection state is checked while waiting to connect.
const CONNECT_POLL: Duration = Duration::from_millis(250);

/// Parse the hex public key of the author whose notes are bridged.
pub fn parse_author(hex: &str) -> Result<PublicKey, ConfigError> {
    PublicKey::from_hex(hex).map_err(|e| ConfigError::ValidationError {
        message: format!("NOSTR_PUBLIC_KEY is not a valid public key: {}", e),
    })
}

/// Convert a verified nostr-sdk event into the bridge's event type.
pub fn to_source_event(event: &Event) -> SourceEvent {
    SourceEvent {
        id: event.id.to_hex(),
        author: event.pubkey.to_hex(),
        created_at: event.created_at.as_u64(),
        content: event.content.clone(),
        tags: event
            .tags
            .iter()
            .map(|tag| tag.as_slice().to_vec())
            .collect(),
    }
}

/// A single relay subscribed to one author's text notes.
pub struct NostrRelay {
    url: String,
    relay_url: RelayUrl,
    author: PublicKey,
    connect_timeout: Duration,
}

impl NostrRelay {
    pub fn new(url: &str, author: PublicKey, connect_timeout: Duration) -> Result<Self, ConnectError> {
        let relay_url = RelayUrl::parse(url).map_err(|e| ConnectError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            url: url.to_string(),
            relay_url,
            author,
            connect_timeout,
        })
    }

    fn subscription_filter(&self) -> Filter {
        Filter::new().kind(Kind::TextNote).author(self.author)
    }

    /// Wait until the relay reports connected, up to `connect_timeout`.
    async fn wait_connected(&self, client: &Client) -> Result<(), ConnectError> {
        let deadline = Instant::now() + self.connect_timeout;

        loop {
            let connected = client
                .relays()
                .await
                .values()
                .any(|relay| relay.status() == RelayStatus::Connected);
            if connected {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ConnectError::Timeout {
                    url: self.url.clone(),
                    secs: self.connect_timeout.as_secs(),
                });
            }
            tokio::time::sleep(CONNECT_POLL).await;
        }
    }

    /// Subscribe and forward notifications until the channel or pool closes.
    async fn pump(
        &self,
        client: &Client,
        tx: &mpsc::Sender<SourceNotification>,
    ) -> Result<(), ConnectError> {
        self.wait_connected(client).await?;
        info!(relay = %self.url, "Connected!");

        // Take the receiver before subscribing so no stored event is missed.
        let mut notifications = client.notifications();

        let output = client
            .subscribe(self.subscription_filter(), None)
            .await
            .map_err(|e| ConnectError::SubscribeFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        let subscription = output.val;
        debug!(relay = %self.url, "Subscribed with ID: {:?}", subscription);

        loop {
            let notification = match notifications.recv().await {
                Ok(n) => n,
                Err(RecvError::Lagged(count)) => {
                    warn!(relay = %self.url, "Dropped {} relay notifications", count);
                    continue;
                }
                Err(RecvError::Closed) => {
                    return Err(ConnectError::ConnectionClosed {
                        url: self.url.clone(),
                    })
                }
            };

            match notification {
                RelayPoolNotification::Message { message, .. } => {
                    let Some(forwarded) = self.forward(&subscription, &message)? else {
                        continue;
                    };
                    if tx.send(forwarded).await.is_err() {
                        debug!(relay = %self.url, "Notification channel closed");
                        return Ok(());
                    }
                }
                RelayPoolNotification::Shutdown => {
                    return Err(ConnectError::ConnectionClosed {
                        url: self.url.clone(),
                    })
                }
                // Sent only the first time the pool sees an id; every delivery
                // also arrives as a `Message`, which is what gets forwarded.
                RelayPoolNotification::Event { .. } => {}
            }
        }
    }

    /// Map one relay message on `subscription` to a bridge notification.
    ///
    /// Every `EVENT` is forwarded, repeats included, so a note whose publish
    /// failed is offered again when the relay replays it. The pool skips
    /// verification for ids it has seen, so signatures are checked here.
    /// A `CLOSED` for the subscription is an error so the caller resubscribes.
    fn forward(
        &self,
        subscription: &SubscriptionId,
        message: &RelayMessage,
    ) -> Result<Option<SourceNotification>, ConnectError> {
        match message {
            RelayMessage::Event {
                subscription_id,
                event,
            } if **subscription_id == *subscription => {
                let event: &Event = event;
                if let Err(e) = event.verify() {
                    warn!(relay = %self.url, event_id = %event.id, "Dropping event with invalid signature: {}", e);
                    return Ok(None);
                }
                if event.kind != Kind::TextNote || event.pubkey != self.author {
                    debug!(relay = %self.url, event_id = %event.id, "Ignoring event outside subscription");
                    return Ok(None);
                }
                Ok(Some(SourceNotification::Event {
                    relay: self.url.clone(),
                    event: to_source_event(event),
                }))
            }
            RelayMessage::EndOfStoredEvents(subscription_id) if **subscription_id == *subscription => {
                Ok(Some(SourceNotification::EndOfStoredEvents {
                    relay: self.url.clone(),
                }))
            }
            RelayMessage::Closed {
                subscription_id,
                message,
            } if **subscription_id == *subscription => Err(ConnectError::SubscribeFailed {
                url: self.url.clone(),
                message: format!("relay closed the subscription: {}", message),
            }),
            RelayMessage::Notice(notice) => {
                warn!(relay = %self.url, "Relay notice: {}", notice);
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl EventSource for NostrRelay {
    fn url(&self) -> &str {
        &self.url
    }

    async fn stream(&self, tx: &mpsc::Sender<SourceNotification>) -> Result<(), ConnectError> {
        let client = Client::default();
        client
            .add_relay(self.relay_url.clone())
            .await
            .map_err(|e| ConnectError::InvalidUrl {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        client.connect().await;

        let result = self.pump(&client, tx).await;
        client.disconnect().await;
        result
    }
}

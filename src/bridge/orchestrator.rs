//! Bridge orchestrator that ties the relays and Mastodon together.
//!
//! Receives notifications from every relay, admits eligible notes through
//! the [`EventFilter`] and runs each admitted note in its own task:
//! transform, upload images, publish, record.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::common::{BridgedPost, SourceEvent};
use crate::content::{extract_image_urls, strip_and_truncate};
use crate::mastodon::{MediaUploader, Publisher};

use super::channels::SourceNotification;
use super::dedup::DedupStore;
use super::filter::EventFilter;
use super::state::{InFlightGuard, InFlightSet};

/// How long shutdown waits for running event tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Terminal state of one processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Posted and recorded in the dedup store.
    Published { url: String },
    /// Publishing failed; the note stays eligible for a later delivery.
    Abandoned,
}

/// The main bridge that orchestrates note flow.
pub struct Bridge {
    filter: EventFilter,
    dedup: Arc<DedupStore>,
    in_flight: Arc<InFlightSet>,
    uploader: MediaUploader,
    publisher: Publisher,
    max_post_chars: usize,
}

impl Bridge {
    pub fn new(
        filter: EventFilter,
        dedup: Arc<DedupStore>,
        uploader: MediaUploader,
        publisher: Publisher,
        max_post_chars: usize,
    ) -> Self {
        Self {
            filter,
            dedup,
            in_flight: InFlightSet::new(),
            uploader,
            publisher,
            max_post_chars,
        }
    }

    /// Consume notifications until every relay sender is gone or shutdown
    /// is signalled, then wait briefly for running event tasks.
    pub async fn run(
        self: Arc<Self>,
        mut notification_rx: mpsc::Receiver<SourceNotification>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                notification = notification_rx.recv() => match notification {
                    Some(notification) => self.dispatch(notification, &mut tasks),
                    None => {
                        info!("All relay sources closed");
                        break;
                    }
                },
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        error!("Event task failed: {}", e);
                    }
                }
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, no longer accepting notes");
                        break;
                    }
                }
            }
        }

        if tasks.is_empty() {
            return;
        }

        info!("Waiting for {} event task(s) to finish...", tasks.len());
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!("Event task failed: {}", e);
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                "Event tasks still running after {}s, abandoning them",
                SHUTDOWN_GRACE.as_secs()
            );
        }
    }

    /// Handle one notification; admitted notes are processed on a new task.
    fn dispatch(self: &Arc<Self>, notification: SourceNotification, tasks: &mut JoinSet<()>) {
        match notification {
            SourceNotification::EndOfStoredEvents { relay } => {
                info!(
                    relay = %relay,
                    "Relay sent all stored events. Now listening for new notes..."
                );
            }
            SourceNotification::Event { relay, event } => {
                let Some(guard) = self.filter.admit(&relay, &event, &self.dedup, &self.in_flight)
                else {
                    return;
                };
                let bridge = Arc::clone(self);
                tasks.spawn(async move {
                    bridge.process(&relay, event, guard).await;
                });
            }
        }
    }

    /// Admit and process one note on the current task.
    ///
    /// Returns `None` if the filter rejected it.
    #[cfg(test)]
    pub async fn handle(&self, relay: &str, event: SourceEvent) -> Option<Outcome> {
        let guard = self
            .filter
            .admit(relay, &event, &self.dedup, &self.in_flight)?;
        Some(self.process(relay, event, guard).await)
    }

    /// Bridge an admitted note. `guard` is released when this returns.
    async fn process(&self, relay: &str, event: SourceEvent, guard: InFlightGuard) -> Outcome {
        info!(relay, event_id = %event.id, "New Nostr event: {}", event.content);

        let image_urls = extract_image_urls(&event.content);
        let text = strip_and_truncate(&event.content, &image_urls, self.max_post_chars);

        // Uploads run concurrently; join_all keeps the note's image order.
        let uploads = join_all(image_urls.iter().map(|url| self.uploader.upload(url))).await;
        let media = uploads
            .into_iter()
            .filter_map(|result| match result {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(relay, event_id = %event.id, "Skipping image: {}", e);
                    None
                }
            })
            .collect();

        let post = BridgedPost { text, media };
        info!(
            relay,
            event_id = %event.id,
            media = post.media.len(),
            "Attempting to post to Mastodon: {}",
            post.text
        );

        let outcome = match self.publisher.publish(&post).await {
            Ok(url) => {
                info!(relay, event_id = %event.id, "Posted to Mastodon: {}", url);
                self.record(relay, guard.id()).await;
                Outcome::Published { url }
            }
            Err(e) => {
                error!(relay, event_id = %event.id, "Error posting to Mastodon: {}", e);
                Outcome::Abandoned
            }
        };

        drop(guard);
        outcome
    }

    /// Persist a published id. Failures are loud but do not undo the post.
    async fn record(&self, relay: &str, event_id: &str) {
        let dedup = Arc::clone(&self.dedup);
        let id = event_id.to_string();

        match tokio::task::spawn_blocking(move || dedup.mark_processed(&id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(
                relay,
                event_id,
                "Posted but could not persist processed event; it may be re-bridged after a restart: {}",
                e
            ),
            Err(e) => error!(relay, event_id, "Persist task failed: {}", e),
        }
    }
}

//! Relay sources.
//!
//! Each configured relay runs in its own task. A task connects, subscribes to
//! the configured author's text notes and pushes what it receives into the
//! shared notification channel. Failures are retried with backoff without
//! touching any other relay.
//!
//! # Architecture
//!
//! Relays implement [`EventSource`]; [`run_source`] owns the reconnect loop
//! and works the same for every implementation.

pub mod connector;
pub mod source;

pub use connector::{parse_author, NostrRelay};
pub use source::run_source;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::bridge::SourceNotification;
use crate::common::error::ConnectError;

/// One relay connection delivering notes.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Relay URL, used in logs and notifications.
    fn url(&self) -> &str;

    /// Connect, subscribe and forward notifications into `tx`.
    ///
    /// Returns `Ok(())` once `tx` is closed. Any connection problem is an
    /// error; the caller decides when to try again.
    async fn stream(&self, tx: &mpsc::Sender<SourceNotification>) -> Result<(), ConnectError>;
}

//! Bridge channel management.
//!
//! Relay tasks push notifications into one bounded channel consumed by the
//! orchestrator. A watch channel carries the shutdown signal to every task.

use tokio::sync::{mpsc, watch};

use crate::common::SourceEvent;

/// Capacity of the relay -> orchestrator channel. Relays wait when it is full.
pub const NOTIFICATION_CAPACITY: usize = 1024;

/// Something a relay delivered.
#[derive(Debug, Clone)]
pub enum SourceNotification {
    /// A note matching the subscription filter.
    Event { relay: String, event: SourceEvent },
    /// The relay finished sending stored events; everything after is live.
    EndOfStoredEvents { relay: String },
}

/// Channels shared by relay tasks, the orchestrator and `main`.
pub struct ChannelBundle {
    pub notification_tx: mpsc::Sender<SourceNotification>,
    pub notification_rx: mpsc::Receiver<SourceNotification>,
    pub shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (notification_tx, notification_rx) = mpsc::channel(NOTIFICATION_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            notification_tx,
            notification_rx,
            shutdown_tx,
            shutdown_rx,
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}

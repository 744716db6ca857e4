//! Per-relay reconnect loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::bridge::SourceNotification;
use crate::common::error::ConnectError;
use crate::common::reconnect::max_delay;

use super::EventSource;

/// Keep `source` streaming into `tx` until shutdown or until `tx` closes.
///
/// `backoff` creates a fresh delay sequence; it is called again after a
/// connection that was established and later dropped.
pub async fn run_source<B, I>(
    source: Arc<dyn EventSource>,
    tx: mpsc::Sender<SourceNotification>,
    mut shutdown_rx: watch::Receiver<bool>,
    backoff: B,
) where
    B: Fn() -> I,
    I: Iterator<Item = Duration>,
{
    let url = source.url().to_string();
    let mut delays = backoff();

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        info!(relay = %url, "Connecting to relay...");
        let result = tokio::select! {
            result = source.stream(&tx) => result,
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(relay = %url, "Shutdown signal received, closing relay");
                    break;
                }
                continue;
            }
        };

        match result {
            Ok(()) => {
                info!(relay = %url, "Bridge no longer accepting notes, closing relay");
                break;
            }
            Err(e @ ConnectError::ConnectionClosed { .. }) => {
                warn!(relay = %url, "{}", e);
                // The connection was up, so start the delays over.
                delays = backoff();
            }
            Err(e) => {
                error!(relay = %url, "Error connecting or subscribing: {}", e);
            }
        }

        if tx.is_closed() {
            break;
        }

        let delay = delays.next().unwrap_or_else(max_delay);
        info!(relay = %url, "Reconnecting in {:.1} seconds...", delay.as_secs_f64());

        // Wait for delay OR shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(delay) => {},
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(relay = %url, "Shutdown signal received during backoff");
                    break;
                }
            }
        }
    }

    info!(relay = %url, "Relay task ended");
}

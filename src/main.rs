//! Nostrdon - one-way Nostr to Mastodon bridge
//!
//! Subscribes to a set of Nostr relays for one author's text notes and
//! republishes each original note, with its images, on a Mastodon account.

mod bridge;
mod common;
mod config;
mod content;
mod mastodon;
mod relay;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use bridge::{Bridge, ChannelBundle, DedupStore, EventFilter};
use common::reconnect::relay_backoff;
use mastodon::client::build_http_client;
use mastodon::{HttpImageFetcher, MastodonClient, MediaUploader, Publisher};
use relay::{parse_author, run_source, NostrRelay};

/// How long a relay gets to report connected before the attempt fails.
const RELAY_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Bound on waiting for the bridge to drain after a shutdown signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load().context("Failed to load configuration")?;

    init_logging(&config.log_file)?;

    info!("Nostrdon v{} starting...", env!("CARGO_PKG_VERSION"));

    config::validate::validate_config(&config).map_err(|e| {
        error!("Invalid configuration: {}", e);
        error!("Set the required variables in the environment or in a .env file.");
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Nostr public key: {}", config.nostr.public_key);
    info!("  Mastodon API: {}", config.mastodon.api_url);
    info!("  Relays: {}", config.nostr.relays.join(", "));
    info!("  Processed events file: {}", config.bridge.processed_events_file.display());
    info!("  Log file: {}", config.log_file.display());

    let author = parse_author(&config.nostr.public_key)?;

    // The age cutoff is fixed here for the lifetime of the process.
    let started_at = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);

    // ============================================================
    // Bridge
    // ============================================================

    let dedup = DedupStore::load(&config.bridge.processed_events_file).map_err(|e| {
        error!("Failed to load processed events: {}", e);
        error!("Fix or move the file; starting empty would re-bridge old notes.");
        e
    })?;

    let filter = EventFilter::new(started_at, config.bridge.max_age_secs);
    info!("Skipping notes created before unix time {}", filter.cutoff());

    let http = build_http_client().context("Failed to build HTTP client")?;
    let target = Arc::new(MastodonClient::new(http.clone(), &config.mastodon)?);
    let fetcher = Arc::new(HttpImageFetcher::new(http));

    let bridge = Arc::new(Bridge::new(
        filter,
        Arc::new(dedup),
        MediaUploader::new(fetcher, target.clone()),
        Publisher::new(target),
        config.bridge.max_post_chars,
    ));

    // Create bridge channels (single source of truth)
    let channels = ChannelBundle::new();
    let shutdown_tx = channels.shutdown_tx;

    // ============================================================
    // Relay tasks
    // ============================================================

    info!("Bridge initialized. Listening for Nostr kind 1 notes...");
    info!("Subscribing to Nostr relays for kind 1 notes from your pubkey...");

    let mut relay_tasks = Vec::new();
    for url in &config.nostr.relays {
        let source = match NostrRelay::new(url, author, RELAY_CONNECT_TIMEOUT) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                error!(relay = %url, "Skipping relay: {}", e);
                continue;
            }
        };

        relay_tasks.push(tokio::spawn(run_source(
            source,
            channels.notification_tx.clone(),
            channels.shutdown_rx.clone(),
            relay_backoff,
        )));
    }

    if relay_tasks.is_empty() {
        error!("No usable relays configured");
        anyhow::bail!("no usable relays configured");
    }

    // Only relay tasks hold senders now; the bridge ends when they all stop.
    drop(channels.notification_tx);

    let heartbeat_task = tokio::spawn(heartbeat(channels.shutdown_rx.clone()));

    let mut bridge_task = tokio::spawn(bridge.run(channels.notification_rx, channels.shutdown_rx));

    // ============================================================
    // Run until signalled
    // ============================================================
    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping bridge...");
            true
        }
        result = &mut bridge_task => {
            if let Err(e) = result {
                error!("Bridge task failed: {}", e);
            }
            false
        }
    };

    // Fire-and-forget: if every receiver is gone there is nothing to stop.
    if let Err(e) = shutdown_tx.send(true) {
        debug!("Shutdown channel closed: {}", e);
    }

    if shutdown {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, bridge_task).await {
            Ok(Ok(())) => info!("Bridge stopped gracefully"),
            Ok(Err(e)) => warn!("Bridge task panicked: {}", e),
            Err(_) => warn!("Bridge shutdown timed out"),
        }
    }

    for task in relay_tasks {
        task.abort();
    }
    heartbeat_task.abort();

    info!("Exiting...");
    Ok(())
}

/// Log to stdout and append the same lines, without colors, to `log_file`.
fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();

    Ok(())
}

/// Periodic liveness line until shutdown.
async fn heartbeat(mut shutdown_rx: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                info!(
                    "[Status] Still listening for new Nostr events... ({})",
                    chrono::Utc::now().to_rfc3339()
                );
            }
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

/// Relays subscribed to when `NOSTR_RELAYS` is not set.
pub const DEFAULT_RELAYS: [&str; 5] = [
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://offchain.pub",
    "wss://relay.primal.net",
    "wss://mostr.pub",
];

pub const DEFAULT_MASTODON_API_URL: &str = "https://mastodon.social/api/v1/";
pub const DEFAULT_LOG_FILE: &str = "/tmp/nostr-mastodon-bridge.log";
pub const DEFAULT_PROCESSED_EVENTS_FILE: &str = "processed_nostr_events.json";
/// Four hours.
pub const DEFAULT_MAX_AGE_SECS: u64 = 4 * 60 * 60;
/// Mastodon's default status length limit.
pub const DEFAULT_MAX_POST_CHARS: usize = 500;

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub nostr: NostrConfig,
    pub mastodon: MastodonConfig,
    pub bridge: BridgeSettings,
    pub log_file: PathBuf,
}

/// Source identity and relay list.
#[derive(Clone)]
pub struct NostrConfig {
    /// 64-char lowercase hex public key of the mirrored author.
    pub public_key: String,
    pub private_key: String,
    pub relays: Vec<String>,
}

/// Target account configuration.
#[derive(Clone)]
pub struct MastodonConfig {
    pub access_token: String,
    /// API base, always ending in `/`.
    pub api_url: String,
}

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub processed_events_file: PathBuf,
    /// Events older than this at startup are never bridged.
    pub max_age_secs: u64,
    pub max_post_chars: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            processed_events_file: PathBuf::from(DEFAULT_PROCESSED_EVENTS_FILE),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            max_post_chars: DEFAULT_MAX_POST_CHARS,
        }
    }
}

impl fmt::Debug for NostrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NostrConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("relays", &self.relays)
            .finish()
    }
}

impl fmt::Debug for MastodonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonConfig")
            .field("access_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

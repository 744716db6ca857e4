//! Environment variable configuration.
//!
//! Reads the bridge configuration from the process environment:
//! - `NOSTR_PUBLIC_KEY` - hex public key of the mirrored author (required)
//! - `NOSTR_PRIVATE_KEY` - private key of the same identity (required)
//! - `MASTODON_ACCESS_TOKEN` - target account token (required)
//! - `MASTODON_API_URL` - API base URL
//! - `LOG_FILE` - file that log lines are appended to
//! - `PROCESSED_EVENTS_FILE` - dedup store path
//! - `NOSTR_RELAYS` - comma-separated relay URLs
//! - `BRIDGE_MAX_AGE_SECS` - age window for backlog events

use std::env;
use std::path::PathBuf;

use crate::common::error::ConfigError;
use crate::config::types::*;

/// Load variables from `.env` in the working directory, if present.
///
/// A missing file is not an error; a malformed one is.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::EnvFile {
            path: ".env".to_string(),
            message: e.to_string(),
        }),
    }
}

/// Build a config from the process environment.
pub fn from_env() -> Result<Config, ConfigError> {
    from_lookup(|key| env::var(key).ok())
}

/// Build a config from an arbitrary key lookup.
///
/// Missing required values are left empty and reported by validation.
/// Values that are present but unparseable fail here.
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

    let relays = match get("NOSTR_RELAYS") {
        Some(list) if !list.is_empty() => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => DEFAULT_RELAYS.iter().map(|s| s.to_string()).collect(),
    };

    let mut api_url = get("MASTODON_API_URL")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_MASTODON_API_URL.to_string());
    if !api_url.ends_with('/') {
        api_url.push('/');
    }

    let mut bridge = BridgeSettings::default();
    if let Some(path) = get("PROCESSED_EVENTS_FILE").filter(|s| !s.is_empty()) {
        bridge.processed_events_file = PathBuf::from(path);
    }
    if let Some(secs) = get("BRIDGE_MAX_AGE_SECS").filter(|s| !s.is_empty()) {
        bridge.max_age_secs = secs.parse().map_err(|_| ConfigError::ValidationError {
            message: format!("BRIDGE_MAX_AGE_SECS must be a number of seconds (got '{}')", secs),
        })?;
    }

    Ok(Config {
        nostr: NostrConfig {
            public_key: get("NOSTR_PUBLIC_KEY").unwrap_or_default(),
            private_key: get("NOSTR_PRIVATE_KEY").unwrap_or_default(),
            relays,
        },
        mastodon: MastodonConfig {
            access_token: get("MASTODON_ACCESS_TOKEN").unwrap_or_default(),
            api_url,
        },
        bridge,
        log_file: get("LOG_FILE")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    })
}

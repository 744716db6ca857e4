//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::config::types::Config;

static PUBKEY_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("static regex is valid"));

/// Returns true for a 64-character lowercase hex public key.
pub fn is_valid_public_key(key: &str) -> bool {
    PUBKEY_HEX.is_match(key).unwrap_or(false)
}

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Nostr identity
    if config.nostr.public_key.is_empty() {
        errors.push("NOSTR_PUBLIC_KEY is required".to_string());
    } else if !is_valid_public_key(&config.nostr.public_key) {
        errors.push(format!(
            "NOSTR_PUBLIC_KEY is not a valid 64-character lowercase hex string (got '{}')",
            config.nostr.public_key
        ));
    }
    if config.nostr.private_key.is_empty() {
        errors.push("NOSTR_PRIVATE_KEY is required".to_string());
    }
    if config.nostr.relays.is_empty() {
        errors.push("NOSTR_RELAYS is empty - no relays to subscribe to".to_string());
    }
    for relay in &config.nostr.relays {
        if !relay.starts_with("wss://") && !relay.starts_with("ws://") {
            errors.push(format!("relay '{}' must be a ws:// or wss:// URL", relay));
        }
    }

    // Mastodon account
    if config.mastodon.access_token.is_empty() {
        errors.push("MASTODON_ACCESS_TOKEN is required".to_string());
    }
    if !config.mastodon.api_url.starts_with("https://")
        && !config.mastodon.api_url.starts_with("http://")
    {
        errors.push(format!(
            "MASTODON_API_URL must be an http(s) URL (got '{}')",
            config.mastodon.api_url
        ));
    }

    // Pipeline
    if config.bridge.max_post_chars < 4 {
        errors.push(format!(
            "max post length must leave room for an ellipsis (got {})",
            config.bridge.max_post_chars
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

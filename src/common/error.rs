//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read env file '{path}': {message}")]
    EnvFile { path: String, message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Relay connection errors.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Invalid relay URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Timed out connecting to {url} after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Failed to subscribe on {url}: {message}")]
    SubscribeFailed { url: String, message: String },

    #[error("Connection to {url} closed")]
    ConnectionClosed { url: String },
}

/// Errors returned by the target platform API.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

/// Failure to turn one inline image into an attachment.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("Failed to upload {url}: {source}")]
    Upload {
        url: String,
        #[source]
        source: TargetError,
    },
}

/// Failure to create the post on the target platform.
#[derive(Debug, Error)]
#[error("Failed to publish post: {source}")]
pub struct PublishError {
    #[from]
    source: TargetError,
}

/// Dedup store read/write errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to read store '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store '{path}' is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write store '{path}': {message}")]
    Write { path: String, message: String },
}

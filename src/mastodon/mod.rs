//! Mastodon target platform.
//!
//! ## Module Structure
//!
//! - `client`: REST client implementing [`TargetPlatform`]
//! - `media`: image download and re-upload (`MediaUploader`)
//! - `publisher`: status creation (`Publisher`)

pub mod client;
pub mod media;
pub mod publisher;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::common::error::TargetError;
use crate::common::{ImageData, MediaHandle};

pub use client::MastodonClient;
pub use media::{HttpImageFetcher, ImageFetcher, MediaUploader};
pub use publisher::Publisher;

/// Operations the bridge needs from the target platform.
#[async_trait]
pub trait TargetPlatform: Send + Sync {
    /// Upload an image and return its media handle.
    async fn upload_media(
        &self,
        image: ImageData,
        description: &str,
    ) -> Result<MediaHandle, TargetError>;

    /// Create a public post and return its URL.
    async fn create_post(&self, status: &str, media: &[MediaHandle]) -> Result<String, TargetError>;
}

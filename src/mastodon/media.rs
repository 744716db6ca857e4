//! Inline image re-hosting.
//!
//! Each image URL found in a note is downloaded and uploaded to the target
//! as a media attachment. Failures are per image: the caller skips the
//! failed image and keeps the rest.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::common::error::MediaError;
use crate::common::{ImageData, MediaHandle};

use super::TargetPlatform;

/// Alt text attached to every uploaded image.
pub const MEDIA_DESCRIPTION: &str = "Image from Nostr note";

/// Largest image accepted for upload (Mastodon's default image limit).
pub const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

/// Source of image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ImageData, MediaError>;
}

/// Downloads images over HTTP.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageData, MediaError> {
        let download_err = |message: String| MediaError::Download {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_err(e.to_string()))?;

        if let Some(declared) = response.content_length() {
            check_size(declared).map_err(download_err)?;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Content-Length may be absent or wrong, so the body is capped as it streams.
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_err(e.to_string()))?
        {
            append_capped(&mut body, &chunk).map_err(download_err)?;
        }

        Ok(ImageData {
            bytes: body.freeze(),
            content_type,
            file_name: file_name_from_url(url),
        })
    }
}

/// Reject a body of `len` bytes if it is over [`MAX_IMAGE_BYTES`].
fn check_size(len: u64) -> Result<(), String> {
    if len > MAX_IMAGE_BYTES as u64 {
        return Err(format!(
            "image is {} bytes, limit is {}",
            len, MAX_IMAGE_BYTES
        ));
    }
    Ok(())
}

/// Append `chunk` unless the body would grow past [`MAX_IMAGE_BYTES`].
fn append_capped(body: &mut BytesMut, chunk: &[u8]) -> Result<(), String> {
    check_size((body.len() + chunk.len()) as u64)?;
    body.extend_from_slice(chunk);
    Ok(())
}

/// Last path segment of `url`, or `"image"` when there is none.
pub fn file_name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments()?.last().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Moves images from their original host to the target platform.
pub struct MediaUploader {
    fetcher: Arc<dyn ImageFetcher>,
    target: Arc<dyn TargetPlatform>,
}

impl MediaUploader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, target: Arc<dyn TargetPlatform>) -> Self {
        Self { fetcher, target }
    }

    /// Download `url` and upload it, returning the media handle.
    pub async fn upload(&self, url: &str) -> Result<MediaHandle, MediaError> {
        let image = self.fetcher.fetch(url).await?;
        self.target
            .upload_media(image, MEDIA_DESCRIPTION)
            .await
            .map_err(|source| MediaError::Upload {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mastodon::testing::{FakeFetcher, FakeTarget};

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(file_name_from_url("https://x.com/a/b/cat.png"), "cat.png");
        assert_eq!(file_name_from_url("https://x.com/cat.JPG?size=l"), "cat.JPG");
        assert_eq!(file_name_from_url("https://x.com/"), "image");
        assert_eq!(file_name_from_url("not a url"), "image");
    }

    #[test]
    fn test_declared_size_over_limit_rejected() {
        assert!(check_size(MAX_IMAGE_BYTES as u64).is_ok());
        let err = check_size(MAX_IMAGE_BYTES as u64 + 1).unwrap_err();
        assert!(err.contains("limit is"));
    }

    #[test]
    fn test_streamed_body_capped() {
        let mut body = BytesMut::new();
        let chunk = vec![0u8; 1024 * 1024];

        for _ in 0..16 {
            append_capped(&mut body, &chunk).unwrap();
        }
        assert_eq!(body.len(), MAX_IMAGE_BYTES);

        assert!(append_capped(&mut body, &[0u8]).is_err());
        assert_eq!(body.len(), MAX_IMAGE_BYTES);
    }

    #[tokio::test]
    async fn test_upload_success() {
        let fetcher = Arc::new(FakeFetcher::with_images(&["https://x.com/a.png"]));
        let target = Arc::new(FakeTarget::default());
        let uploader = MediaUploader::new(fetcher, target.clone());

        let handle = uploader.upload("https://x.com/a.png").await.unwrap();

        assert_eq!(handle, MediaHandle("media-1".to_string()));
        assert_eq!(target.uploaded_files(), vec!["a.png"]);
        assert_eq!(target.upload_descriptions(), vec![MEDIA_DESCRIPTION]);
    }

    #[tokio::test]
    async fn test_download_failure() {
        let fetcher = Arc::new(FakeFetcher::with_images(&[]));
        let target = Arc::new(FakeTarget::default());
        let uploader = MediaUploader::new(fetcher, target.clone());

        let err = uploader.upload("https://x.com/gone.png").await.unwrap_err();

        assert!(matches!(err, MediaError::Download { .. }));
        assert!(target.uploaded_files().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let fetcher = Arc::new(FakeFetcher::with_images(&["https://x.com/a.png"]));
        let target = Arc::new(FakeTarget::default());
        target.reject_uploads();
        let uploader = MediaUploader::new(fetcher, target);

        let err = uploader.upload("https://x.com/a.png").await.unwrap_err();
        assert!(matches!(err, MediaError::Upload { .. }));
    }
}

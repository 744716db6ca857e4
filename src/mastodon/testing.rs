//! In-memory target platform and image host for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::common::error::{MediaError, TargetError};
use crate::common::{ImageData, MediaHandle};

use super::media::{file_name_from_url, ImageFetcher};
use super::TargetPlatform;

/// Records uploads and posts; failures and latency are scriptable.
#[derive(Default)]
pub struct FakeTarget {
    uploads: Mutex<Vec<(String, String)>>,
    posts: Mutex<Vec<(String, Vec<String>)>>,
    post_attempts: AtomicUsize,
    failing_posts: AtomicUsize,
    reject_uploads: AtomicBool,
    post_delay: Mutex<Option<Duration>>,
}

impl FakeTarget {
    /// Make the next `n` post attempts fail.
    pub fn fail_next_posts(&self, n: usize) {
        self.failing_posts.store(n, Ordering::SeqCst);
    }

    pub fn reject_uploads(&self) {
        self.reject_uploads.store(true, Ordering::SeqCst);
    }

    /// Hold every post for `delay` before answering.
    pub fn delay_posts(&self, delay: Duration) {
        *self.post_delay.lock().unwrap() = Some(delay);
    }

    /// Successful posts as (text, media ids).
    pub fn posts(&self) -> Vec<(String, Vec<String>)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_attempts(&self) -> usize {
        self.post_attempts.load(Ordering::SeqCst)
    }

    pub fn uploaded_files(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(f, _)| f.clone()).collect()
    }

    pub fn upload_descriptions(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(_, d)| d.clone()).collect()
    }
}

#[async_trait]
impl TargetPlatform for FakeTarget {
    async fn upload_media(
        &self,
        image: ImageData,
        description: &str,
    ) -> Result<MediaHandle, TargetError> {
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(TargetError::Api {
                status: 422,
                message: "unsupported media".to_string(),
            });
        }

        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((image.file_name, description.to_string()));
        Ok(MediaHandle(format!("media-{}", uploads.len())))
    }

    async fn create_post(&self, status: &str, media: &[MediaHandle]) -> Result<String, TargetError> {
        self.post_attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.post_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .failing_posts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(TargetError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        let mut posts = self.posts.lock().unwrap();
        posts.push((
            status.to_string(),
            media.iter().map(|m| m.as_str().to_string()).collect(),
        ));
        Ok(format!("https://mastodon.example/@bridge/{}", posts.len()))
    }
}

/// Serves a fixed set of image URLs; anything else fails to download.
pub struct FakeFetcher {
    available: HashSet<String>,
}

impl FakeFetcher {
    pub fn with_images(urls: &[&str]) -> Self {
        Self {
            available: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageData, MediaError> {
        if !self.available.contains(url) {
            return Err(MediaError::Download {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            });
        }

        Ok(ImageData {
            bytes: Bytes::from_static(b"\x89PNG"),
            content_type: Some("image/png".to_string()),
            file_name: file_name_from_url(url),
        })
    }
}

//! Mastodon REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::error::TargetError;
use crate::common::{ImageData, MediaHandle};
use crate::config::MastodonConfig;

use super::TargetPlatform;

/// Whole-request timeout for downloads, uploads and posts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by image downloads and API calls.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[derive(Debug, Deserialize)]
struct MediaAttachment {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    url: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewStatus<'a> {
    status: &'a str,
    media_ids: Vec<&'a str>,
}

/// Client for one Mastodon account.
pub struct MastodonClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl MastodonClient {
    pub fn new(http: reqwest::Client, config: &MastodonConfig) -> Result<Self, TargetError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| TargetError::Endpoint(format!("{}: {}", config.api_url, e)))?;

        Ok(Self {
            http,
            base,
            token: config.access_token.clone(),
        })
    }

    /// Resolve an API path against the configured base URL.
    fn endpoint(&self, path: &str) -> Result<Url, TargetError> {
        self.base
            .join(path)
            .map_err(|e| TargetError::Endpoint(format!("{}{}: {}", self.base, path, e)))
    }
}

/// Turn a non-2xx response into an API error carrying the body.
async fn check_status(response: Response) -> Result<Response, TargetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TargetError::Api {
        status: status.as_u16(),
        message: body,
    })
}

#[async_trait]
impl TargetPlatform for MastodonClient {
    async fn upload_media(
        &self,
        image: ImageData,
        description: &str,
    ) -> Result<MediaHandle, TargetError> {
        let mut part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("description", description.to_string());

        let response = self
            .http
            .post(self.endpoint("media")?)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        let attachment: MediaAttachment = check_status(response).await?.json().await?;
        debug!(media_id = %attachment.id, "Uploaded media");
        Ok(MediaHandle(attachment.id))
    }

    async fn create_post(&self, status: &str, media: &[MediaHandle]) -> Result<String, TargetError> {
        let body = NewStatus {
            status,
            media_ids: media.iter().map(MediaHandle::as_str).collect(),
        };

        let response = self
            .http
            .post(self.endpoint("statuses")?)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let created: Status = check_status(response).await?.json().await?;
        Ok(created.url.or(created.uri).unwrap_or(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(api_url: &str) -> Result<MastodonClient, TargetError> {
        let config = MastodonConfig {
            access_token: "token".to_string(),
            api_url: api_url.to_string(),
        };
        MastodonClient::new(reqwest::Client::new(), &config)
    }

    #[test]
    fn test_endpoints_resolve_under_api_base() {
        let client = client_for("https://mastodon.social/api/v1/").unwrap();

        assert_eq!(
            client.endpoint("media").unwrap().as_str(),
            "https://mastodon.social/api/v1/media"
        );
        assert_eq!(
            client.endpoint("statuses").unwrap().as_str(),
            "https://mastodon.social/api/v1/statuses"
        );
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(matches!(
            client_for("not a url"),
            Err(TargetError::Endpoint(_))
        ));
    }

    #[test]
    fn test_status_body_shape() {
        let media = vec![MediaHandle("1".to_string()), MediaHandle("2".to_string())];
        let body = NewStatus {
            status: "hello",
            media_ids: media.iter().map(MediaHandle::as_str).collect(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"status": "hello", "media_ids": ["1", "2"]}));
    }

    #[test]
    fn test_status_url_fallbacks() {
        let status: Status =
            serde_json::from_str(r#"{"id":"9","url":null,"uri":"https://m.example/u/9"}"#).unwrap();
        assert_eq!(status.url.or(status.uri).unwrap_or(status.id), "https://m.example/u/9");
    }

    #[test]
    fn test_http_client_builds() {
        assert!(build_http_client().is_ok());
    }
}

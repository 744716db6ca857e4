//! Status publishing.

use std::sync::Arc;

use crate::common::error::PublishError;
use crate::common::BridgedPost;

use super::TargetPlatform;

/// Publishes finished posts to the target account.
pub struct Publisher {
    target: Arc<dyn TargetPlatform>,
}

impl Publisher {
    pub fn new(target: Arc<dyn TargetPlatform>) -> Self {
        Self { target }
    }

    /// Create the post and return its URL.
    pub async fn publish(&self, post: &BridgedPost) -> Result<String, PublishError> {
        let url = self.target.create_post(&post.text, &post.media).await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MediaHandle;
    use crate::mastodon::testing::FakeTarget;

    #[tokio::test]
    async fn test_publish_forwards_text_and_media() {
        let target = Arc::new(FakeTarget::default());
        let publisher = Publisher::new(target.clone());
        let post = BridgedPost {
            text: "hello".to_string(),
            media: vec![MediaHandle("m1".to_string())],
        };

        let url = publisher.publish(&post).await.unwrap();

        assert_eq!(url, "https://mastodon.example/@bridge/1");
        assert_eq!(target.posts(), vec![("hello".to_string(), vec!["m1".to_string()])]);
    }

    #[test]
    fn test_publish_failure_surfaces() {
        let target = Arc::new(FakeTarget::default());
        target.fail_next_posts(1);
        let publisher = Publisher::new(target.clone());
        let post = BridgedPost {
            text: "hello".to_string(),
            media: Vec::new(),
        };

        let err = tokio_test::block_on(publisher.publish(&post)).unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(target.posts().is_empty());
        assert!(tokio_test::block_on(publisher.publish(&post)).is_ok());
    }
}

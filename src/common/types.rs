//! Shared types used across the application.

use bytes::Bytes;

/// Tag name for a reference to another event (reply / quote).
pub const TAG_EVENT: &str = "e";
/// Tag name for a reference to a person (mention).
pub const TAG_PUBKEY: &str = "p";

/// A note delivered by a relay, reduced to the fields the bridge reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    /// Hex event id (content-addressed).
    pub id: String,
    /// Hex public key of the author.
    pub author: String,
    /// Unix timestamp in seconds.
    pub created_at: u64,
    pub content: String,
    /// Raw tag records; the first element names the tag.
    pub tags: Vec<Vec<String>>,
}

impl SourceEvent {
    /// Returns true if any tag references another event or a person.
    pub fn is_reply_or_mention(&self) -> bool {
        self.tags.iter().any(|tag| {
            matches!(
                tag.first().map(String::as_str),
                Some(TAG_EVENT) | Some(TAG_PUBKEY)
            )
        })
    }

    /// Short single-line preview of the content for log lines.
    pub fn preview(&self) -> String {
        const PREVIEW_CHARS: usize = 40;
        let flat = self.content.replace('\n', " ");
        if flat.chars().count() > PREVIEW_CHARS {
            let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", cut)
        } else {
            flat
        }
    }
}

/// Downloaded image ready for upload.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Bytes,
    /// `Content-Type` reported by the image host, if any.
    pub content_type: Option<String>,
    pub file_name: String,
}

/// Opaque media id returned by the target platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Final post content ready for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgedPost {
    pub text: String,
    pub media: Vec<MediaHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_tags(tags: Vec<Vec<&str>>) -> SourceEvent {
        SourceEvent {
            id: "abc".to_string(),
            author: "def".to_string(),
            created_at: 0,
            content: String::new(),
            tags: tags
                .into_iter()
                .map(|t| t.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    #[test]
    fn test_reply_detection() {
        assert!(event_with_tags(vec![vec!["e", "123"]]).is_reply_or_mention());
        assert!(event_with_tags(vec![vec!["t", "nostr"], vec!["p", "456"]]).is_reply_or_mention());
        assert!(!event_with_tags(vec![vec!["t", "nostr"]]).is_reply_or_mention());
        assert!(!event_with_tags(vec![vec![]]).is_reply_or_mention());
    }

    #[test]
    fn test_preview_flattens_and_cuts() {
        let mut event = event_with_tags(vec![]);
        event.content = "line one\nline two".to_string();
        assert_eq!(event.preview(), "line one line two");

        event.content = "x".repeat(50);
        assert_eq!(event.preview(), format!("{}...", "x".repeat(40)));
    }
}

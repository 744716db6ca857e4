//! Inline image URL detection.

use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::warn;

/// An http(s) URL whose path ends in a common raster image extension.
static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S+\.(?:jpg|jpeg|png|gif|webp)").expect("static regex is valid")
});

/// Extract image URLs from note text, in order of appearance.
///
/// Matching is case-insensitive on scheme and extension. Repeated URLs are
/// returned once per occurrence.
pub fn extract_image_urls(text: &str) -> Vec<String> {
    IMAGE_URL
        .find_iter(text)
        .filter_map(|m| match m {
            Ok(m) => Some(m.as_str().to_string()),
            Err(e) => {
                warn!("Image URL match error: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mixed_case_in_order() {
        let urls = extract_image_urls("see https://x.com/a.JPG and https://x.com/b.png");
        assert_eq!(urls, vec!["https://x.com/a.JPG", "https://x.com/b.png"]);
    }

    #[test]
    fn test_extract_all_extensions() {
        let text = "http://h/1.jpg http://h/2.jpeg http://h/3.png http://h/4.gif http://h/5.webp";
        assert_eq!(extract_image_urls(text).len(), 5);
    }

    #[test]
    fn test_non_image_urls_ignored() {
        let urls = extract_image_urls("read https://example.com/post.html or ftp://h/a.png");
        assert!(urls.is_empty());
    }

    #[test]
    fn test_duplicates_retained() {
        let urls = extract_image_urls("https://x.com/a.gif twice https://x.com/a.gif");
        assert_eq!(urls, vec!["https://x.com/a.gif", "https://x.com/a.gif"]);
    }

    #[test]
    fn test_trailing_punctuation_excluded() {
        let urls = extract_image_urls("look (https://x.com/cat.webp).");
        assert_eq!(urls, vec!["https://x.com/cat.webp"]);
    }

    #[test]
    fn test_url_on_its_own_line() {
        let urls = extract_image_urls("morning!\nhttps://cdn.example/img/sun.jpeg\n#photo");
        assert_eq!(urls, vec!["https://cdn.example/img/sun.jpeg"]);
    }
}

//! Post text shaping: removing attached image URLs and fitting the length limit.

/// Appended to text cut at the length limit.
pub const ELLIPSIS: &str = "...";

/// Remove image URLs from `text` and truncate the result to `max_chars`.
///
/// URL removal happens first so attached images do not count against the
/// limit.
pub fn strip_and_truncate(text: &str, urls: &[String], max_chars: usize) -> String {
    truncate(&strip_urls(text, urls), max_chars)
}

/// Remove the first occurrence of each URL, in order.
///
/// Spaces and tabs around a removed URL collapse into a single space when
/// text remains on both sides of it on the same line. A URL with no
/// whitespace next to it leaves no gap. The result is trimmed.
pub fn strip_urls(text: &str, urls: &[String]) -> String {
    let mut result = text.to_string();

    for url in urls {
        let Some(start) = result.find(url.as_str()) else {
            continue;
        };
        let end = start + url.len();

        let left = result[..start].trim_end_matches([' ', '\t']);
        let right = result[end..].trim_start_matches([' ', '\t']);
        let had_whitespace = left.len() < start || right.len() < result.len() - end;
        let separator = if !had_whitespace
            || left.is_empty()
            || right.is_empty()
            || left.ends_with('\n')
            || right.starts_with('\n')
            || right.starts_with("\r\n")
        {
            ""
        } else {
            " "
        };

        result = format!("{}{}{}", left, separator, right);
    }

    result.trim().to_string()
}

/// Cut `text` to at most `max_chars` characters, ending in [`ELLIPSIS`] when cut.
///
/// Counts Unicode scalar values, never splitting a character.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_collapses_inner_whitespace() {
        let out = strip_and_truncate(
            "hello https://x.com/a.png world",
            &urls(&["https://x.com/a.png"]),
            500,
        );
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_strip_trailing_url() {
        let out = strip_urls("new photo https://x.com/a.png", &urls(&["https://x.com/a.png"]));
        assert_eq!(out, "new photo");
    }

    #[test]
    fn test_strip_embedded_url_leaves_no_gap() {
        let url = urls(&["https://x.com/a.png"]);

        assert_eq!(strip_urls("(https://x.com/a.png)", &url), "()");
        assert_eq!(strip_urls("foohttps://x.com/a.pngbar", &url), "foobar");
        assert_eq!(strip_urls("look:https://x.com/a.png nice", &url), "look: nice");
    }

    #[test]
    fn test_strip_keeps_line_breaks() {
        let out = strip_urls(
            "caption https://x.com/a.png\nsecond line",
            &urls(&["https://x.com/a.png"]),
        );
        assert_eq!(out, "caption\nsecond line");
    }

    #[test]
    fn test_strip_only_image() {
        let out = strip_urls("  https://x.com/a.png  ", &urls(&["https://x.com/a.png"]));
        assert_eq!(out, "");
    }

    #[test]
    fn test_strip_duplicate_removes_each_once() {
        let text = "a https://x.com/a.gif b https://x.com/a.gif c";
        let once = strip_urls(text, &urls(&["https://x.com/a.gif"]));
        assert_eq!(once, "a b https://x.com/a.gif c");

        let twice = strip_urls(text, &urls(&["https://x.com/a.gif", "https://x.com/a.gif"]));
        assert_eq!(twice, "a b c");
    }

    #[test]
    fn test_strip_without_urls_trims() {
        assert_eq!(strip_urls("  plain note \n", &[]), "plain note");
    }

    #[test]
    fn test_truncate_long_text() {
        let text: String = (0..600).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let out = strip_and_truncate(&text, &[], 500);

        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with(ELLIPSIS));
        assert_eq!(&out[..497], &text[..497]);
    }

    #[test]
    fn test_truncate_exact_limit_untouched() {
        let text = "x".repeat(500);
        assert_eq!(truncate(&text, 500), text);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(600);
        let out = truncate(&text, 500);

        assert_eq!(out.chars().count(), 500);
        assert!(out.starts_with(&"é".repeat(497)));
    }

    #[test]
    fn test_truncate_after_url_removal() {
        // 495 chars of text plus a URL: only fits once the URL is gone.
        let body = "y".repeat(495);
        let text = format!("{} https://x.com/long-image-name.png", body);
        let out = strip_and_truncate(&text, &urls(&["https://x.com/long-image-name.png"]), 500);
        assert_eq!(out, body);
    }
}

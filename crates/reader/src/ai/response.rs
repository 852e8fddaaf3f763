// ABOUTME: Parsing of the model's reply into an ExtractedContent.
// ABOUTME: Strips markdown fences, parses the JSON object and retries once on the outermost brace span.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::content::ExtractedContent;

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?[ \t]*```$").unwrap());

#[derive(Debug, Deserialize)]
struct ArticlePayload {
    title: String,
    content: String,
    #[serde(default)]
    byline: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
}

impl From<ArticlePayload> for ExtractedContent {
    fn from(p: ArticlePayload) -> Self {
        ExtractedContent {
            title: p.title,
            content: p.content,
            byline: p.byline,
            excerpt: p.excerpt,
        }
    }
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` line and a trailing fence.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let opened = FENCE_OPEN.find(trimmed).map_or(trimmed, |m| &trimmed[m.end()..]);
    let closed = FENCE_CLOSE.find(opened).map_or(opened, |m| &opened[..m.start()]);
    closed.trim()
}

/// Parse the model reply into an article.
///
/// Values are taken verbatim. When the cleaned text is not a JSON object on
/// its own, the outermost `{...}` span is tried once.
pub fn parse_article(text: &str) -> anyhow::Result<ExtractedContent> {
    let cleaned = strip_code_fences(text);

    match serde_json::from_str::<ArticlePayload>(cleaned) {
        Ok(payload) => Ok(payload.into()),
        Err(first) => {
            let span = match (cleaned.find('{'), cleaned.rfind('}')) {
                (Some(start), Some(end)) if start < end => &cleaned[start..=end],
                _ => return Err(anyhow::Error::new(first).context("reply is not a JSON object")),
            };
            let payload: ArticlePayload = serde_json::from_str(span)
                .map_err(|e| anyhow::Error::new(e).context("reply is not a JSON object"))?;
            Ok(payload.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_json_is_returned_verbatim() {
        let article = parse_article(r#"{"title":"Test Title","content":"<p>Test Content</p>"}"#).unwrap();
        assert_eq!(article.title, "Test Title");
        assert_eq!(article.content, "<p>Test Content</p>");
        assert_eq!(article.byline, None);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let reply = "```json\n{\"title\": \"Clean\", \"content\": \"Clean Content\"}\n```";
        let article = parse_article(reply).unwrap();
        assert_eq!(article.title, "Clean");
        assert_eq!(article.content, "Clean Content");
    }

    #[test]
    fn strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  ```JSON\r\n{}\r\n```  "), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
        assert_eq!(strip_code_fences("```json {} ```"), "{}");
    }

    #[test]
    fn backticks_inside_content_survive() {
        let reply = r#"{"title":"T","content":"<pre><code>```rust</code></pre>"}"#;
        assert_eq!(parse_article(reply).unwrap().content, "<pre><code>```rust</code></pre>");
    }

    #[test]
    fn recovers_object_surrounded_by_prose() {
        let reply = "Here is the article:\n{\"title\":\"T\",\"content\":\"<p>C</p>\",\"byline\":\"Ann\"}\nEnjoy!";
        let article = parse_article(reply).unwrap();
        assert_eq!(article.title, "T");
        assert_eq!(article.byline.as_deref(), Some("Ann"));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let reply = r#"{"title":"T","content":"C","lang":"en"}"#;
        assert_eq!(parse_article(reply).unwrap().title, "T");
    }

    #[test]
    fn rejects_non_objects_and_missing_keys() {
        assert!(parse_article("I could not find an article.").is_err());
        assert!(parse_article(r#"{"title":"only title"}"#).is_err());
        assert!(parse_article("").is_err());
    }
}

// ABOUTME: ExtractedContent struct holding the article produced by an extraction strategy.
// ABOUTME: Includes sanitizing, plain-text and markdown formatting helpers for consumers.

use serde::{Deserialize, Serialize};

use crate::formats::{html_to_markdown, html_to_text, sanitize_html};

/// The article produced by one extraction attempt.
///
/// `content` is semantic HTML. It is not safe to render until it has been
/// passed through [`ExtractedContent::sanitized`] (or [`sanitize_html`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl ExtractedContent {
    /// Returns a copy whose content went through the article sanitizer.
    pub fn sanitized(&self) -> Self {
        Self {
            content: sanitize_html(&self.content),
            ..self.clone()
        }
    }

    /// Plain text of the content, suitable for narration.
    pub fn text(&self) -> String {
        html_to_text(&self.content)
    }

    /// Returns true if neither a title nor any content is present.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    /// Format the article as a markdown document (title, byline, excerpt, body).
    pub fn format_markdown(&self) -> String {
        let mut parts = Vec::new();

        if !self.title.is_empty() {
            parts.push(format!("# {}", self.title));
        }
        if let Some(ref byline) = self.byline {
            parts.push(format!("By {}", byline));
        }
        if let Some(ref excerpt) = self.excerpt {
            parts.push(format!("> {}", excerpt));
        }
        if !parts.is_empty() && !self.content.is_empty() {
            parts.push("---".to_string());
        }
        if !self.content.is_empty() {
            parts.push(html_to_markdown(&sanitize_html(&self.content)).trim().to_string());
        }

        parts.join("\n\n")
    }

    /// Trim text fields, drop blank optionals and make sure the title is not empty.
    ///
    /// `fallback_title` is tried when the title is blank; `"Untitled"` is used last.
    pub(crate) fn normalized(mut self, fallback_title: Option<String>) -> Self {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            self.title = fallback_title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string());
        }
        self.byline = non_blank(self.byline);
        self.excerpt = non_blank(self.excerpt);
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitized_strips_scripts_and_handlers() {
        let article = ExtractedContent {
            title: "T".to_string(),
            content: r#"<p onclick="steal()">Hello</p><script>alert(1)</script>"#.to_string(),
            ..Default::default()
        };

        let clean = article.sanitized();
        assert_eq!(clean.content, "<p>Hello</p>");
        assert_eq!(clean.title, "T");
    }

    #[test]
    fn normalized_uses_fallback_title() {
        let article = ExtractedContent {
            title: "   ".to_string(),
            content: "<p>x</p>".to_string(),
            byline: Some("  ".to_string()),
            excerpt: Some(" Short ".to_string()),
        }
        .normalized(Some("Page Title".to_string()));

        assert_eq!(article.title, "Page Title");
        assert_eq!(article.byline, None);
        assert_eq!(article.excerpt.as_deref(), Some("Short"));
    }

    #[test]
    fn normalized_defaults_to_untitled() {
        let article = ExtractedContent::default().normalized(None);
        assert_eq!(article.title, "Untitled");
    }

    #[test]
    fn serializes_without_absent_optionals() {
        let article = ExtractedContent {
            title: "Title".to_string(),
            content: "<p>Body</p>".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&article).unwrap();
        assert_eq!(json, r#"{"title":"Title","content":"<p>Body</p>"}"#);
    }

    #[test]
    fn format_markdown_minimal() {
        let article = ExtractedContent {
            title: "Simple Title".to_string(),
            content: "<p>Simple content.</p>".to_string(),
            ..Default::default()
        };
        assert_eq!(
            article.format_markdown(),
            "# Simple Title\n\n---\n\nSimple content."
        );
    }

    #[test]
    fn is_empty_checks_title_and_content() {
        assert!(ExtractedContent::default().is_empty());
        let article = ExtractedContent {
            title: "x".to_string(),
            ..Default::default()
        };
        assert!(!article.is_empty());
    }
}

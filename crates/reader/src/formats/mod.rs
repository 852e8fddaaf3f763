// ABOUTME: Output format converters and the article sanitizer.
// ABOUTME: Handles sanitizing extracted HTML and converting it to Markdown and plain text.

//! Output format conversion module.
//!
//! Extracted content is HTML from an untrusted source (a remote model or a
//! scraped page). [`sanitize_html`] is the boundary control every renderer
//! must go through; the converters here are for the CLI and for narration.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// The content type format for rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Html,
    Markdown,
    Text,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Html => "html",
            ContentType::Markdown => "markdown",
            ContentType::Text => "text",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => ContentType::Markdown,
            "text" | "txt" => ContentType::Text,
            _ => ContentType::Html,
        }
    }
}

/// Sanitize article HTML with an ammonia allow-list.
///
/// Allowed elements: p, br, h1-h6, ul, ol, li, img, em, strong, b, i, u,
/// blockquote, pre, code, figure, figcaption, a.
/// Allowed attrs:
/// - links: href
/// - images: src, alt, width, height
pub fn sanitize_html(html: &str) -> String {
    let allowed_tags = [
        "p", "br", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "img", "em", "strong",
        "b", "i", "u", "blockquote", "pre", "code", "figure", "figcaption", "a",
    ];

    let mut builder = ammonia::Builder::new();
    builder.tags(allowed_tags.iter().copied().collect());
    builder.generic_attributes(std::collections::HashSet::new());
    builder.tag_attributes(std::collections::HashMap::new());
    builder.add_tag_attributes("a", &["href"]);
    builder.add_tag_attributes("img", &["src", "alt", "width", "height"]);

    builder
        .url_schemes(["http", "https", "mailto"].iter().copied().collect())
        .clean(html)
        .to_string()
}

/// Convert HTML to Markdown using htmd.
///
/// Skips script, style and noscript tags, keeps links and images, and
/// collapses runs of blank lines to at most two newlines. On conversion error
/// the preprocessed input is returned unchanged.
pub fn html_to_markdown(html: &str) -> String {
    let preprocessed = BR_TAG.replace_all(html, "\n").to_string();

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    let md = converter
        .convert(&preprocessed)
        .unwrap_or_else(|_| preprocessed.clone());

    BLANK_LINES.replace_all(&md, "\n\n").to_string()
}

/// Convert HTML to plain text by extracting text nodes.
///
/// Treats `<br>` as a newline, collapses horizontal whitespace and newline
/// runs, and trims the result.
pub fn html_to_text(html: &str) -> String {
    let preprocessed = BR_TAG.replace_all(html, "\n");

    let document = Html::parse_document(&preprocessed);
    let raw_text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    let normalized = HORIZONTAL_SPACE.replace_all(&raw_text, " ");
    let collapsed = NEWLINE_RUNS.replace_all(&normalized, "\n");

    collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Take at most `max` characters of `text`, counted in chars rather than bytes.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

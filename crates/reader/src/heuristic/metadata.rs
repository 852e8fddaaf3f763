// ABOUTME: Document-level metadata lookup (title, byline, excerpt) for the heuristic extractor.
// ABOUTME: Runs against the untouched document before any boilerplate is detached.

use scraper::{Html, Selector};

use super::scoring::normalize_spaces;

const TITLE_TEXT: &[&str] = &["head > title", "title"];
const TITLE_META: &[&str] = &[
    "meta[property='og:title']",
    "meta[name='twitter:title']",
    "meta[name='title']",
];
const TITLE_HEADINGS: &[&str] = &["h1", "h2"];

const BYLINE_META: &[&str] = &[
    "meta[name='author']",
    "meta[property='article:author']",
    "meta[name='byl']",
];
const BYLINE_TEXT: &[&str] = &[
    "[rel='author']",
    "[itemprop='author']",
    ".byline",
    ".author",
];

const EXCERPT_META: &[&str] = &[
    "meta[name='description']",
    "meta[property='og:description']",
    "meta[name='twitter:description']",
];

/// Site-name separators in document titles, e.g. "Story | Site".
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " \\ ", " / ", " > ", " » "];

/// A title part shorter than this is likely a site name or section label.
const MIN_TITLE_WORDS: usize = 3;

/// Longer strings are treated as prose rather than an author name.
const MAX_BYLINE_CHARS: usize = 100;

/// Metadata found on the page itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
}

/// Collect title, byline and excerpt from the document.
pub fn collect(doc: &Html) -> Metadata {
    let title = first_text(doc, TITLE_TEXT)
        .map(|t| clean_title(&t))
        .or_else(|| first_attr(doc, TITLE_META, "content"))
        .or_else(|| first_text(doc, TITLE_HEADINGS));

    let byline = first_attr(doc, BYLINE_META, "content")
        .or_else(|| first_text(doc, BYLINE_TEXT))
        .filter(|b| b.chars().count() <= MAX_BYLINE_CHARS)
        .map(|b| b.strip_prefix("By ").map(str::to_string).unwrap_or(b));

    let excerpt = first_attr(doc, EXCERPT_META, "content");

    Metadata {
        title,
        byline,
        excerpt,
    }
}

/// Drop a site-name suffix (or prefix) from a document title.
///
/// Text before the last separator wins when it has at least three words,
/// then text after the first separator; otherwise the title is kept whole.
pub fn clean_title(raw: &str) -> String {
    let title = normalize_spaces(raw);

    let last = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.rfind(sep))
        .max();
    let Some(last) = last else {
        return title;
    };

    let head = title[..last].trim();
    if word_count(head) >= MIN_TITLE_WORDS {
        return head.to_string();
    }

    let first = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep).map(|idx| idx + sep.len()))
        .min();
    if let Some(start) = first {
        let tail = title[start..].trim();
        if word_count(tail) >= MIN_TITLE_WORDS {
            return tail.to_string();
        }
    }

    title
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = Selector::parse(css).ok()?;
        doc.select(&sel)
            .map(|el| normalize_spaces(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    })
}

fn first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = Selector::parse(css).ok()?;
        doc.select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .map(normalize_spaces)
            .find(|value| !value.is_empty())
    })
}

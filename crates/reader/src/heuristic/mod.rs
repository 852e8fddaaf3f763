// ABOUTME: Heuristic readability extractor that needs no network access.
// ABOUTME: Works on a deep copy of the parsed page so the caller's document is never mutated.

//! Heuristic (readability-style) extraction.
//!
//! The algorithm is destructive: boilerplate is detached from the tree before
//! scoring. [`HeuristicExtractor::extract`] therefore clones the document it
//! is given and only ever mutates the clone.

pub mod cleaners;
pub mod metadata;
pub mod scoring;

use scraper::{Html, Selector};
use url::Url;

use crate::content::ExtractedContent;
use crate::error::ExtractError;
use crate::formats::{html_to_text, truncate_chars};

/// Excerpts derived from the article body are cut to this many chars.
const EXCERPT_CHARS: usize = 200;

/// Readability-style extractor over a parsed document.
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtractor {
    base_url: Option<Url>,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative links and images against `url`, and use its host as
    /// the last-resort title.
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Extract the main article from `document`.
    ///
    /// The document is cloned first; the caller's tree is left untouched and
    /// equal input always produces equal output.
    pub fn extract(&self, document: &Html) -> Result<ExtractedContent, ExtractError> {
        let url = self.base_url.as_ref().map(Url::as_str).unwrap_or_default();

        let mut working = document.clone();
        let meta = metadata::collect(&working);
        let title = meta.title.clone().unwrap_or_default();

        let removed = cleaners::prepare_document(&mut working);
        let scores = scoring::score_document(&working);
        tracing::debug!(url, removed, scored = scores.len(), "scored document");

        let (candidate, top_score) = scoring::top_candidate(&working, &scores).ok_or_else(|| {
            ExtractError::no_content(url, "Readability", Some(anyhow::anyhow!("document has no body")))
        })?;

        let roots = scoring::merge_siblings(candidate, top_score, &scores);
        let skip = cleaners::mark_removals(&roots, &title);
        let content = cleaners::serialize_article(&roots, &skip, self.base_url.as_ref());

        if html_to_text(&content).is_empty() {
            return Err(ExtractError::no_content(
                url,
                "Readability",
                Some(anyhow::anyhow!("Readability failed to parse the document")),
            ));
        }

        let excerpt = meta.excerpt.or_else(|| first_paragraph(&content));
        let fallback_title = self
            .base_url
            .as_ref()
            .and_then(Url::host_str)
            .map(str::to_string);

        Ok(ExtractedContent {
            title,
            content,
            byline: meta.byline,
            excerpt,
        }
        .normalized(fallback_title))
    }
}

fn first_paragraph(content: &str) -> Option<String> {
    let fragment = Html::parse_fragment(content);
    let sel = Selector::parse("p").ok()?;
    fragment
        .select(&sel)
        .map(|p| scoring::normalize_spaces(&p.text().collect::<String>()))
        .find(|text| !text.is_empty())
        .map(|text| truncate_chars(&text, EXCERPT_CHARS).to_string())
}

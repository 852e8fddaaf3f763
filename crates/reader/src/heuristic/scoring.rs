// ABOUTME: Readability-style scoring for locating the main content region of a document.
// ABOUTME: Scores paragraph-like nodes into their ancestors, picks the top candidate and merges siblings.

use std::collections::HashMap;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Paragraphs shorter than this (in chars) do not contribute to any score.
const MIN_PARAGRAPH_CHARS: usize = 25;

/// How many ancestors a paragraph's score propagates into.
const MAX_ANCESTOR_LEVELS: usize = 5;

static POSITIVE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|blog|content|entry|hentry|h-entry|main|page|pagination|permalink|post|story|text").unwrap()
});
static NEGATIVE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)adbox|advert|banner|bookmark|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|modal|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget").unwrap()
});
static PHOTO_HINTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)figure|photo|image|caption").unwrap());

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Score storage keyed by node id.
pub type NodeScores = HashMap<NodeId, f64>;

/// Block-level children that stop a `div` from being scored as a paragraph.
fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "blockquote" | "dl" | "div" | "img" | "ol" | "p" | "pre" | "table" | "ul" | "section"
    )
}

fn is_scoreable(element: &ElementRef) -> bool {
    match element.value().name() {
        "p" | "pre" | "td" | "section" | "h2" | "h3" | "h4" | "h5" | "h6" => true,
        "div" => !element
            .children()
            .filter_map(ElementRef::wrap)
            .any(|child| is_block_tag(child.value().name())),
        _ => false,
    }
}

fn tag_base_score(tag: &str) -> f64 {
    match tag {
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

/// Count commas, including the full-width form used in CJK text.
pub fn comma_count(text: &str) -> usize {
    text.chars().filter(|c| matches!(c, ',' | '，')).count()
}

/// Weight from class and id patterns.
pub fn class_weight(element: &ElementRef) -> i32 {
    let class = element.value().attr("class").unwrap_or("");
    let id = element.value().attr("id").unwrap_or("");
    let mut weight = 0i32;

    for value in [class, id] {
        if value.is_empty() {
            continue;
        }
        if NEGATIVE_SCORE_RE.is_match(value) {
            weight -= 25;
        }
        if POSITIVE_SCORE_RE.is_match(value) {
            weight += 25;
        }
    }

    if PHOTO_HINTS_RE.is_match(class) {
        weight += 10;
    }

    weight
}

/// Ratio of link text to total text, both counted in chars.
pub fn link_density(element: &ElementRef) -> f64 {
    let total = element.text().map(|t| t.chars().count()).sum::<usize>();
    if total == 0 {
        return 0.0;
    }

    let linked: usize = element
        .select(&ANCHORS)
        .flat_map(|a| a.text())
        .map(|t| t.chars().count())
        .sum();

    linked as f64 / total as f64
}

/// Check if text ends with sentence-ending punctuation.
pub fn has_sentence_end(text: &str) -> bool {
    matches!(
        text.trim().chars().last(),
        Some('.' | '!' | '?' | ':' | ';')
    )
}

/// Normalize whitespace in text.
pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn initial_score(element: &ElementRef) -> f64 {
    tag_base_score(element.value().name()) + class_weight(element) as f64
}

/// Score every paragraph-like node into its ancestors.
///
/// Each paragraph with enough text is worth `1 + commas + min(len / 100, 3)`.
/// The parent receives the full amount, the grandparent half, and further
/// ancestors a third per level.
pub fn score_document(doc: &Html) -> NodeScores {
    let mut scores = NodeScores::new();

    for node in doc.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if !is_scoreable(&element) {
            continue;
        }

        let text = normalize_spaces(&element.text().collect::<String>());
        let len = text.chars().count();
        if len < MIN_PARAGRAPH_CHARS {
            continue;
        }

        let ancestors: Vec<ElementRef> = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(MAX_ANCESTOR_LEVELS)
            .collect();

        let content_score = 1.0 + comma_count(&text) as f64 + (len / 100).min(3) as f64;

        for (level, ancestor) in ancestors.iter().enumerate() {
            let divider = match level {
                0 => 1.0,
                1 => 2.0,
                n => n as f64 * 3.0,
            };
            *scores
                .entry(ancestor.id())
                .or_insert_with(|| initial_score(ancestor)) += content_score / divider;
        }
    }

    scores
}

/// Find the element with the highest link-adjusted score.
///
/// Elements are visited in document order and ties keep the earlier one, so
/// the choice is stable for equal input. Falls back to `<body>` when nothing
/// was scored.
pub fn top_candidate<'a>(doc: &'a Html, scores: &NodeScores) -> Option<(ElementRef<'a>, f64)> {
    let mut best: Option<(ElementRef<'a>, f64)> = None;

    for node in doc.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if element.value().name() == "html" {
            continue;
        }
        let Some(score) = scores.get(&element.id()) else {
            continue;
        };

        let adjusted = score * (1.0 - link_density(&element));
        if best.as_ref().map_or(true, |(_, top)| adjusted > *top) {
            best = Some((element, adjusted));
        }
    }

    best.or_else(|| doc.select(&BODY).next().map(|body| (body, 0.0)))
}

/// Collect the candidate plus any siblings that look like part of the same article.
///
/// Returned in document order.
pub fn merge_siblings<'a>(
    candidate: ElementRef<'a>,
    top_score: f64,
    scores: &NodeScores,
) -> Vec<ElementRef<'a>> {
    if candidate.value().name() == "body" {
        return vec![candidate];
    }
    let Some(parent) = candidate.parent() else {
        return vec![candidate];
    };

    let threshold = (top_score * 0.2).max(10.0);
    let candidate_class = candidate.value().attr("class").unwrap_or("");
    let mut merged = Vec::new();

    for sibling in parent.children().filter_map(ElementRef::wrap) {
        if sibling.id() == candidate.id() {
            merged.push(sibling);
            continue;
        }

        let class = sibling.value().attr("class").unwrap_or("");
        let bonus = if !class.is_empty() && class == candidate_class {
            top_score * 0.2
        } else {
            0.0
        };

        if let Some(score) = scores.get(&sibling.id()) {
            if score + bonus >= threshold {
                merged.push(sibling);
                continue;
            }
        }

        if sibling.value().name() == "p" {
            let text = normalize_spaces(&sibling.text().collect::<String>());
            let len = text.chars().count();
            let density = link_density(&sibling);

            let long_prose = len > 80 && density < 0.25;
            let short_sentence = len > 0 && len <= 80 && density == 0.0 && has_sentence_end(&text);
            if long_prose || short_sentence {
                merged.push(sibling);
            }
        }
    }

    merged
}

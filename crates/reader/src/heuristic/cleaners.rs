// ABOUTME: Destructive document preparation and article cleanup for the heuristic extractor.
// ABOUTME: Detaches boilerplate before scoring, then marks and serializes the surviving article nodes.

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::scoring::{class_weight, comma_count, link_density, normalize_spaces};

static STRIPPED_TAGS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, noscript, iframe, object, embed, template, link").unwrap()
});

/// Class/id patterns that mark probable boilerplate.
static CANDIDATES_BLACKLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ad-break|adbox|advert|addthis|agegate|aux|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|modal|nav|outbrain|pager|pagination|popup|promo|related|remark|replies|rss|share|shoutbox|sidebar|skyscraper|social|sponsor|subscribe|supplemental|tweet|twitter|widget").unwrap()
});

/// Patterns that rescue a blacklisted node.
static CANDIDATES_WHITELIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)and|article|body|blogindex|column|content|entry-content-asset|hentry|main|page|post|shadow|story|text").unwrap()
});

static INLINE_HIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden").unwrap());

static SPACER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)transparent|spacer|blank|pixel").unwrap());

static MEDIA: Lazy<Selector> = Lazy::new(|| Selector::parse("img, picture, video, iframe").unwrap());
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static IMAGES: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static INPUTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, textarea, select, button").unwrap());

const UNLIKELY_ROLES: &[&str] = &[
    "menu",
    "menubar",
    "complementary",
    "navigation",
    "alert",
    "alertdialog",
    "dialog",
    "banner",
    "contentinfo",
];

/// Attributes kept on serialized article elements.
const KEPT_ATTRIBUTES: &[&str] = &["href", "src", "srcset", "alt", "title", "width", "height"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "meta", "source", "track", "wbr",
];

fn is_protected(tag: &str) -> bool {
    matches!(tag, "html" | "body" | "article" | "main" | "a")
}

/// Check whether an element is probably navigation, chrome or other boilerplate.
pub fn is_unlikely_candidate(element: &ElementRef) -> bool {
    let tag = element.value().name();
    if is_protected(tag) {
        return false;
    }

    if let Some(role) = element.value().attr("role") {
        if UNLIKELY_ROLES.contains(&role.trim()) {
            return true;
        }
    }

    let class = element.value().attr("class").unwrap_or("");
    let id = element.value().attr("id").unwrap_or("");
    let class_and_id = format!("{} {}", class, id);
    if class_and_id.trim().is_empty() {
        return false;
    }

    CANDIDATES_BLACKLIST.is_match(&class_and_id) && !CANDIDATES_WHITELIST.is_match(&class_and_id)
}

fn is_hidden(element: &ElementRef) -> bool {
    let el = element.value();
    if matches!(el.name(), "html" | "body") {
        return false;
    }
    el.attr("hidden").is_some()
        || el.attr("aria-hidden") == Some("true")
        || el.attr("style").is_some_and(|style| INLINE_HIDDEN.is_match(style))
}

/// Detach scripts, styles, hidden nodes and unlikely candidates from the document.
///
/// Destructive: call it on a copy. Returns the number of subtrees removed.
pub fn prepare_document(doc: &mut Html) -> usize {
    let mut doomed: Vec<NodeId> = doc.select(&STRIPPED_TAGS).map(|el| el.id()).collect();

    for node in doc.root_element().descendants() {
        if let Some(element) = ElementRef::wrap(node) {
            let id = element.id();
            if (is_hidden(&element) || is_unlikely_candidate(&element)) && !doomed.contains(&id) {
                doomed.push(id);
            }
        }
    }

    for id in &doomed {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }

    doomed.len()
}

fn is_empty_paragraph(element: &ElementRef) -> bool {
    element.text().all(|t| t.trim().is_empty()) && element.select(&MEDIA).next().is_none()
}

fn header_duplicates_title(element: &ElementRef, title: &str) -> bool {
    let title = normalize_spaces(title);
    if title.is_empty() {
        return false;
    }
    normalize_spaces(&element.text().collect::<String>()).eq_ignore_ascii_case(&title)
}

fn should_remove_image(element: &ElementRef) -> bool {
    let el = element.value();
    let src = el.attr("src").unwrap_or("");
    if src.trim().is_empty() && el.attr("srcset").is_none() {
        return true;
    }
    if SPACER_RE.is_match(src) {
        return true;
    }

    let tiny = |name: &str| {
        el.attr(name)
            .and_then(|v| v.trim_end_matches("px").parse::<u32>().ok())
            .is_some_and(|v| v < 10)
    };
    tiny("width") || tiny("height")
}

/// Decide whether a container looks like boilerplate inside the article.
pub fn should_clean_conditionally(element: &ElementRef) -> bool {
    let weight = class_weight(element);
    if weight < 0 {
        return true;
    }

    let text = normalize_spaces(&element.text().collect::<String>());
    if comma_count(&text) >= 10 {
        return false;
    }

    let paragraphs = element.select(&PARAGRAPHS).count();
    let images = element.select(&IMAGES).count();
    let items = element.select(&LIST_ITEMS).count();
    let inputs = element.select(&INPUTS).count();
    let len = text.chars().count();
    let density = link_density(element);
    let is_list = matches!(element.value().name(), "ul" | "ol");

    if inputs as f64 > paragraphs as f64 / 3.0 {
        return true;
    }
    if !is_list && items > paragraphs + 100 {
        return true;
    }
    if len < 25 && images == 0 {
        return true;
    }
    if weight < 25 && density > 0.2 && len > 75 {
        return true;
    }
    weight >= 25 && density > 0.5
}

/// Collect descendants of the article roots that should not be serialized.
///
/// The roots themselves are never marked; their subtrees are.
pub fn mark_removals(roots: &[ElementRef], title: &str) -> HashSet<NodeId> {
    let mut skip = HashSet::new();

    for root in roots {
        for node in root.descendants().skip(1) {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };

            let remove = match element.value().name() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    header_duplicates_title(&element, title) || class_weight(&element) < 0
                }
                "img" => should_remove_image(&element),
                "p" => is_empty_paragraph(&element),
                "form" | "table" | "ul" | "ol" | "div" | "section" | "aside" | "nav" => {
                    should_clean_conditionally(&element)
                }
                _ => false,
            };

            if remove {
                skip.insert(element.id());
            }
        }
    }

    skip
}

/// Serialize the article roots into a single `<div>` wrapper.
///
/// Nodes in `skip` are dropped with their subtrees, `h1` becomes `h2`,
/// `html`/`body` become `div`, only a small attribute set survives and
/// relative `href`/`src` values are resolved against `base`.
pub fn serialize_article(roots: &[ElementRef], skip: &HashSet<NodeId>, base: Option<&Url>) -> String {
    let mut out = String::from("<div>");
    for root in roots {
        serialize_node(**root, skip, base, &mut out);
    }
    out.push_str("</div>");
    out
}

fn serialize_node(node: NodeRef<Node>, skip: &HashSet<NodeId>, base: Option<&Url>, out: &mut String) {
    if skip.contains(&node.id()) {
        return;
    }

    match node.value() {
        Node::Text(text) => escape_text(text, out),
        Node::Element(el) => {
            let tag = match el.name() {
                "html" | "body" => "div",
                "h1" => "h2",
                other => other,
            };

            out.push('<');
            out.push_str(tag);
            for (name, value) in el.attrs() {
                if !KEPT_ATTRIBUTES.contains(&name) {
                    continue;
                }
                let value = if matches!(name, "href" | "src") {
                    resolve_url(base, value)
                } else {
                    value.to_string()
                };
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(&value, out);
                out.push('"');
            }

            if VOID_TAGS.contains(&tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');

            for child in node.children() {
                serialize_node(child, skip, base, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        _ => {}
    }
}

fn resolve_url(base: Option<&Url>, value: &str) -> String {
    let value = value.trim();
    if value.starts_with('#') {
        return value.to_string();
    }
    base.and_then(|b| b.join(value).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| value.to_string())
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

// ABOUTME: Prompt construction for the AI extraction strategy.
// ABOUTME: Embeds the source URL, the truncated page HTML and the output rules.

use crate::formats::truncate_chars;

/// Build the extraction prompt for `url`, sending at most `max_html_chars` chars of `html`.
///
/// The cut is a raw character cut; it can land inside a tag.
pub fn build_prompt(url: &str, html: &str, max_html_chars: usize) -> String {
    let html = truncate_chars(html, max_html_chars);
    format!(
        "You are an expert content extractor. Your task is to extract the main article content from the provided HTML.

URL: {url}

HTML Content (truncated if too large):
{html}

Instructions:
1. Extract the main article title.
2. Extract the full article content as clean semantic HTML (use <p>, <h2>, <h3>, <ul>, <ol>, <li>, <blockquote>, <img>, <em>, <strong>).
3. Remove ads, sidebars, navigation, and other clutter.
4. Keep images if they are part of the article (<img src=\"...\">).
5. Return the result as a valid JSON object with exactly two keys: \"title\" and \"content\".

Do not wrap the JSON in markdown code blocks. Just return the raw JSON string.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_url_and_rules() {
        let prompt = build_prompt("https://example.com/post", "<p>Body</p>", 30_000);
        assert!(prompt.contains("URL: https://example.com/post"));
        assert!(prompt.contains("<p>Body</p>"));
        assert!(prompt.contains("\"title\" and \"content\""));
        assert!(prompt.contains("Do not wrap the JSON in markdown code blocks"));
    }

    #[test]
    fn html_is_cut_at_the_limit() {
        let html = format!("{}{}", "a".repeat(30_000), "TAIL");
        let prompt = build_prompt("https://example.com", &html, 30_000);
        assert!(prompt.contains(&"a".repeat(30_000)));
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn cut_counts_chars_not_bytes() {
        let html = "é".repeat(10);
        let prompt = build_prompt("https://example.com", &html, 4);
        assert!(prompt.contains("éééé\n"));
        assert!(!prompt.contains("ééééé"));
    }
}

// ABOUTME: Narration script built from article content: whitespace-collapsed text plus word spans.
// ABOUTME: Maps engine boundary offsets back to words so a reader view can highlight them.

use zen_reader::formats::html_to_text;
use zen_reader::ExtractedContent;

/// Collapse every whitespace run to one space and trim.
pub fn prepare_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A word in the script, in char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub len: usize,
}

impl WordSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Text handed to the speech engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechScript {
    text: String,
    words: Vec<WordSpan>,
}

impl SpeechScript {
    pub fn new(raw: &str) -> Self {
        let text = prepare_text(raw);

        let mut words = Vec::new();
        let mut start = None;
        let mut count = 0;
        for (idx, ch) in text.chars().enumerate() {
            match (ch == ' ', start) {
                (false, None) => start = Some(idx),
                (true, Some(s)) => {
                    words.push(WordSpan { start: s, len: idx - s });
                    start = None;
                }
                _ => {}
            }
            count = idx + 1;
        }
        if let Some(s) = start {
            words.push(WordSpan { start: s, len: count - s });
        }

        Self { text, words }
    }

    /// Script for article HTML: text nodes only, whitespace collapsed.
    pub fn from_html(html: &str) -> Self {
        Self::new(&html_to_text(html))
    }

    pub fn from_article(article: &ExtractedContent) -> Self {
        Self::from_html(&article.content)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn words(&self) -> &[WordSpan] {
        &self.words
    }

    /// The word containing `char_index`, or the next word when it falls on a space.
    pub fn word_at(&self, char_index: usize) -> Option<(usize, WordSpan)> {
        let idx = self.words.partition_point(|w| w.end() <= char_index);
        self.words.get(idx).map(|w| (idx, *w))
    }

    /// The text of a word span.
    pub fn word_text(&self, span: WordSpan) -> &str {
        &self.text[self.byte_offset(span.start)..self.byte_offset(span.end())]
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prepare_text_collapses_whitespace() {
        assert_eq!(prepare_text("  Hello \n\n  world\t!  "), "Hello world !");
        assert_eq!(prepare_text(" \n "), "");
    }

    #[test]
    fn from_html_reads_text_nodes() {
        let script = SpeechScript::from_html("<h2>Title</h2>\n<p>First   line.</p><p>Second line.</p>");
        assert_eq!(script.text(), "Title First line. Second line.");
        assert_eq!(script.words().len(), 5);
    }

    #[test]
    fn word_spans_use_char_offsets() {
        let script = SpeechScript::new("café au lait");
        assert_eq!(
            script.words(),
            &[
                WordSpan { start: 0, len: 4 },
                WordSpan { start: 5, len: 2 },
                WordSpan { start: 8, len: 4 },
            ]
        );
        assert_eq!(script.word_text(script.words()[0]), "café");
        assert_eq!(script.word_text(script.words()[2]), "lait");
    }

    #[test]
    fn word_at_maps_boundaries() {
        let script = SpeechScript::new("one two three");
        assert_eq!(script.word_at(0).map(|(i, _)| i), Some(0));
        assert_eq!(script.word_at(2).map(|(i, _)| i), Some(0));
        assert_eq!(script.word_at(3).map(|(i, _)| i), Some(1));
        assert_eq!(script.word_at(8).map(|(i, _)| i), Some(2));
        assert_eq!(script.word_at(13), None);
    }

    #[test]
    fn empty_script() {
        let script = SpeechScript::from_html("<p>   </p>");
        assert!(script.is_empty());
        assert!(script.words().is_empty());
        assert_eq!(script.word_at(0), None);
    }
}

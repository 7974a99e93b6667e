use serde::{Deserialize, Serialize};

/// A reference into the document's text content, in characters.
///
/// Formatting commands never change the text content, so a span stays valid
/// across them; that is what lets the link dialog snapshot a span and
/// restore it after the dialog has taken focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Clamps both ends to a text of `len` characters.
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }

    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    pub fn contains(&self, start: usize, end: usize) -> bool {
        self.start <= start && end <= self.end
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Expands a caret to the word around it. A caret touching the end of a word
/// selects that word. Returns a collapsed span when there is no word there.
pub fn expand_to_word(text: &str, caret: usize) -> TextSpan {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());

    let anchor = if chars.get(caret).copied().is_some_and(is_word_char) {
        caret
    } else if caret > 0 && is_word_char(chars[caret - 1]) {
        caret - 1
    } else {
        return TextSpan::caret(caret);
    };

    let mut start = anchor;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = anchor + 1;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    TextSpan::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_endpoints() {
        let span = TextSpan::new(9, 3);
        assert_eq!((span.start, span.end), (3, 9));
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn test_expand_inside_word() {
        let text = "Worked at Acme Corp";
        assert_eq!(expand_to_word(text, 12), TextSpan::new(10, 14));
    }

    #[test]
    fn test_expand_at_word_end_selects_previous_word() {
        let text = "Worked at Acme Corp";
        assert_eq!(expand_to_word(text, 14), TextSpan::new(10, 14));
    }

    #[test]
    fn test_expand_in_whitespace_stays_collapsed() {
        let text = "Acme  Corp";
        assert!(expand_to_word(text, 5).is_collapsed());
    }

    #[test]
    fn test_expand_on_empty_text() {
        assert!(expand_to_word("", 0).is_collapsed());
    }

    #[test]
    fn test_clamp_limits_to_length() {
        assert_eq!(TextSpan::new(2, 40).clamp(10), TextSpan::new(2, 10));
    }

    #[test]
    fn test_overlap_and_containment() {
        let span = TextSpan::new(5, 10);
        assert!(span.overlaps(8, 12));
        assert!(!span.overlaps(10, 12));
        assert!(span.contains(6, 9));
        assert!(!span.contains(4, 9));
    }
}

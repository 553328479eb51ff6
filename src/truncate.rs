//! Width-bounded truncation for tooltip text.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSES: &str = "...";

/// Shorten `text` to at most `width` columns, marking the cut with
/// ellipses. The ellipses themselves are cut when `width` is tiny.
pub fn with_ellipses(text: &str, width: usize) -> String {
    if text.width() <= width {
        return String::from(text);
    }

    let budget = width.saturating_sub(ELLIPSES.len());
    let mut used = 0;
    let end = text
        .char_indices()
        .find_map(|(index, c)| {
            used += c.width().unwrap_or(0);
            (used > budget).then_some(index)
        })
        .unwrap_or(text.len());

    let mut result = String::from(&text[..end]);
    result.push_str(&ELLIPSES[..width.min(ELLIPSES.len())]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits() {
        assert_eq!(with_ellipses("pw-dump", 7), "pw-dump");
        assert_eq!(with_ellipses("pw-dump", 40), "pw-dump");
    }

    #[test]
    fn cut() {
        assert_eq!(with_ellipses("Connection refused", 10), "Connect...");
    }

    #[test]
    fn wide_characters() {
        // Each of these takes two columns.
        assert_eq!(with_ellipses("音声音声音声", 8), "音声...");
    }

    #[test]
    fn only_ellipses() {
        assert_eq!(with_ellipses("timeout", 3), "...");
        assert_eq!(with_ellipses("timeout", 2), "..");
        assert_eq!(with_ellipses("timeout", 0), "");
    }
}

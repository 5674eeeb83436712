//! Plain text extraction.

use crate::content::ExtractedContent;

/// The decoded text with CRLF and lone CR line endings normalized to LF.
pub fn extract(text: &str) -> ExtractedContent {
    ExtractedContent::plain(normalize_newlines(text))
}

pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newlines_are_normalized() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_blank_lines_survive() {
        match extract("line1\r\n\r\nline3") {
            ExtractedContent::PlainText { body } => assert_eq!(body, "line1\n\nline3"),
            other => panic!("unexpected {:?}", other),
        }
    }
}

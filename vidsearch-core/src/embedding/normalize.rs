//! Text normalization applied before every embedding call
//!
//! Titles, transcripts and queries all pass through [`normalize_text`], so the
//! model sees the same token stream at build time and at query time.

use regex::Regex;
use std::sync::OnceLock;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Characters that carry no text and only confuse the tokenizer
fn is_dropped(c: char) -> bool {
    matches!(
        c,
        '\u{FFFD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    )
}

/// Normalize text for embedding.
///
/// Control characters become spaces, encoding artifacts and zero-width
/// characters are removed, whitespace runs collapse to one space and the
/// result is trimmed. `normalize_text(normalize_text(s)) == normalize_text(s)`.
pub fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !is_dropped(*c))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    whitespace_run()
        .replace_all(cleaned.trim(), " ")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_controls() {
        assert_eq!(
            normalize_text("  Deep\tlearning\r\n\u{0007}basics  "),
            "Deep learning basics"
        );
    }

    #[test]
    fn test_removes_encoding_artifacts() {
        assert_eq!(normalize_text("caf\u{FFFD} au\u{200B} lait"), "caf au lait");
        assert_eq!(normalize_text("\u{FEFF}title"), "title");
    }

    #[test]
    fn test_keeps_symbols_and_unicode_text() {
        assert_eq!(normalize_text("C++ & Rust: 日本語 🎥"), "C++ & Rust: 日本語 🎥");
    }

    #[test]
    fn test_blank_input_becomes_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t \u{200B} "), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "a\u{0000}b",
            "  x  y\u{00A0}z ",
            "tab\tand\u{2028}line",
            "plain",
        ];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "input {:?}", input);
        }
    }
}

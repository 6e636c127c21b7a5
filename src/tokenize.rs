//! Text normalization into word tokens.
//!
//! Tokens are lower-cased runs of ASCII letters and digits. Every other
//! non-whitespace character is deleted outright (not transliterated), so
//! accented letters vanish and punctuation glues nothing together.

/// Whitespace as recognised by the tokenizer (ASCII only).
#[inline]
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Normalize raw text into an ordered sequence of word tokens.
///
/// Lower-cases the input, removes every character that is not an ASCII
/// letter, ASCII digit, or whitespace, then splits on whitespace runs.
/// Empty tokens are never produced.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || is_separator(c))
        .collect();

    cleaned
        .split(is_separator)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tokens back into normalized text.
pub fn normalized_text(tokens: &[String]) -> String {
    tokens.join(" ")
}

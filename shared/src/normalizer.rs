//! Turns a raw product title into the lowercase word tokens the n-gram
//! expander works on.

/// Lowercase `title` and split it on runs of whitespace.
///
/// Never fails: an empty or whitespace-only title yields no tokens.
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Split on whitespace but keep the original casing (pooled mode works on
/// the exact-cased substrings of the title).
pub fn split_words(title: &str) -> Vec<&str> {
    title.split_whitespace().collect()
}

/// Lexical normal form of a phrase: lowercased, with leading and trailing
/// punctuation removed from every word. Words that consist only of
/// punctuation disappear.
pub fn normal_form(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

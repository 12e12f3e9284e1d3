//! Text preprocessing utilities for embedding generation
//!
//! Normalizes text into the token stream the hashing embedder consumes.

/// Tokens shorter than this carry no signal
pub const MIN_TOKEN_CHARS: usize = 2;

/// Lowercase, replace non-word characters with spaces, collapse whitespace
///
/// Word characters are Unicode alphanumerics and `_`.
pub fn normalize_for_embedding(text: &str) -> String {
    let replaced: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if is_word_char(c) { c } else { ' ' })
        .collect();

    replaced.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Normalize and split into tokens, dropping tokens under two characters
pub fn tokenize(text: &str) -> Vec<String> {
    normalize_for_embedding(text)
        .split(' ')
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

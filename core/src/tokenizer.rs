/// Strip every non-alphanumeric character from both ends of a token.
/// Interior punctuation ("e-mail", "don't") is preserved.
pub fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Lowercase and trim a single raw token into a term. May return an empty string.
pub fn normalize(word: &str) -> String {
    trim_punctuation(word).to_lowercase()
}

/// Split text on whitespace and keep the original-case slices whose normalized
/// form is non-empty. Slice `i` is the source of the term at position `i` in [`tokenize`].
pub fn raw_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|raw| !trim_punctuation(raw).is_empty())
        .collect()
}

/// Tokenize text into (term, position). Positions are consecutive over the
/// tokens that survive trimming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    raw_tokens(text)
        .into_iter()
        .map(normalize)
        .enumerate()
        .map(|(pos, term)| (term, pos))
        .collect()
}

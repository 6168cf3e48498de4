// polyglot-core/src/core/text.rs
// ============================================================================
// Module: Polyglot Text Matching
// Description: Tokenizer and phrase matcher for entry content.
// Purpose: Give in-process stores the same content semantics as FTS5.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Tokens are maximal runs of alphanumeric characters, lowercased. This tracks
//! the `SQLite` `unicode61` tokenizer closely enough that a phrase query
//! behaves the same in memory and on disk: `"Hello"` matches
//! `"Hello, World!"` but not `"Helloworld"`.

// ============================================================================
// SECTION: Tokenizer
// ============================================================================

/// Splits text into lowercase alphanumeric tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Returns true when `query` appears in `content` as a contiguous token run.
///
/// A query without tokens matches nothing.
#[must_use]
pub fn phrase_matches(content: &str, query: &str) -> bool {
    let needle = tokenize(query);
    if needle.is_empty() {
        return false;
    }
    let haystack = tokenize(content);
    haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// Folds text for case-insensitive substring comparison.
///
/// Stores that precompute folded content must use this same folding.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Returns true when `query` is a case-insensitive substring of `content`.
///
/// An empty query matches nothing.
#[must_use]
pub fn substring_matches(content: &str, query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    fold_case(content).contains(&fold_case(query))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::phrase_matches;
    use super::substring_matches;
    use super::tokenize;

    #[test]
    fn tokenize_splits_on_punctuation_and_lowercases() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
        assert!(tokenize("  ,;! ").is_empty());
    }

    #[test]
    fn phrase_requires_whole_tokens_in_order() {
        assert!(phrase_matches("Hello, World!", "hello"));
        assert!(phrase_matches("Hello, World!", "HELLO world"));
        assert!(!phrase_matches("Hello, World!", "world hello"));
        assert!(!phrase_matches("Hello, World!", "hell"));
        assert!(!phrase_matches("Hello, World!", "!!"));
    }

    #[test]
    fn substring_is_literal_not_any_token() {
        assert!(substring_matches("Bonjour, le monde!", "LE MON"));
        assert!(!substring_matches("Bonjour, le monde!", "monde le"));
        assert!(!substring_matches("anything", ""));
    }
}

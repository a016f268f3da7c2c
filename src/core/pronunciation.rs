//! Pronunciation replacements applied right before synthesis.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Pronunciation replacement configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pronunciation {
    /// Word to replace
    pub word: String,
    /// Pronunciation to use instead
    pub pronunciation: String,
}

impl Pronunciation {
    pub fn new(word: impl Into<String>, pronunciation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            pronunciation: pronunciation.into(),
        }
    }
}

/// Precompiled pronunciation replacer
#[derive(Debug, Clone, Default)]
pub struct PronunciationReplacer {
    patterns: Vec<(Regex, String)>,
}

impl PronunciationReplacer {
    /// Create a new pronunciation replacer from config
    pub fn new(pronunciations: &[Pronunciation]) -> Self {
        let patterns = pronunciations
            .iter()
            .filter(|p| !p.word.trim().is_empty())
            .filter_map(|p| {
                // Case-insensitive, word-boundary aware regex for each pronunciation
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&p.word));
                match Regex::new(&pattern) {
                    Ok(regex) => Some((regex, p.pronunciation.clone())),
                    Err(e) => {
                        error!(
                            "Failed to compile pronunciation pattern for '{}': {}",
                            p.word, e
                        );
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Whether any replacement is configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Apply all pronunciation replacements to text
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, replacement) in &self.patterns {
            result = pattern
                .replace_all(&result, regex::NoExpand(replacement))
                .into_owned();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cafe_replacer() -> PronunciationReplacer {
        PronunciationReplacer::new(&[
            Pronunciation::new("cappuccino", "capuchino"),
            Pronunciation::new("latte", "laté"),
            Pronunciation::new("Sucre", "Súcre"),
        ])
    }

    #[test]
    fn test_replaces_whole_words() {
        let replacer = cafe_replacer();
        assert_eq!(
            replacer.apply("Un cappuccino y un latte en Sucre"),
            "Un capuchino y un laté en Súcre"
        );
    }

    #[test]
    fn test_respects_word_boundaries() {
        let replacer = cafe_replacer();
        assert_eq!(replacer.apply("lattes"), "lattes");
        assert_eq!(replacer.apply("Sucrense"), "Sucrense");
    }

    #[test]
    fn test_matching_ignores_case() {
        let replacer = cafe_replacer();
        assert_eq!(
            replacer.apply("CAPPUCCINO en sucre"),
            "capuchino en Súcre"
        );
    }

    #[test]
    fn test_replacement_is_literal() {
        let replacer = PronunciationReplacer::new(&[Pronunciation::new("USD", "$1 dollars")]);
        assert_eq!(replacer.apply("10 USD"), "10 $1 dollars");
    }

    #[test]
    fn test_empty_words_are_skipped() {
        let replacer = PronunciationReplacer::new(&[Pronunciation::new("  ", "x")]);
        assert!(replacer.is_empty());
        assert_eq!(replacer.apply("unchanged"), "unchanged");
    }
}

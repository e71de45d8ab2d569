//! Token count estimation for model input.
//!
//! Budgets are counted in model tokens, but the exact tokenizer is not
//! available offline. Estimators here only need to be non-negative and grow
//! with the text, which is all the chunker relies on.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::config::EstimatorChoice;

static TOKEN_PIECES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+|[a-z]+|\s+|.").unwrap_or_else(|e| panic!("invalid token regex: {e}"))
});

pub trait TokenEstimator {
    fn estimate(&self, text: &str) -> usize;
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize,
{
    fn estimate(&self, text: &str) -> usize {
        self(text)
    }
}

/// Rough character-ratio estimate: four characters per token, plus one.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CharRatioEstimator;

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

/// Word-class estimate tuned for chat logs.
///
/// Runs of ASCII letters or digits cost one token per four characters, a
/// lone space or newline is free, and every other character (punctuation,
/// longer whitespace runs, any non-ASCII glyph) costs one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        TOKEN_PIECES
            .find_iter(text)
            .map(|piece| piece_cost(piece.as_str()))
            .sum()
    }
}

fn piece_cost(piece: &str) -> usize {
    if piece == " " || piece == "\n" {
        return 0;
    }
    let is_word = piece.chars().all(char::is_numeric) || piece.chars().all(|c| c.is_ascii_alphabetic());
    if is_word {
        piece.chars().count().div_ceil(4)
    } else {
        1
    }
}

#[must_use]
pub fn estimator_for(choice: EstimatorChoice) -> Box<dyn TokenEstimator + Send + Sync> {
    match choice {
        EstimatorChoice::Heuristic => Box::new(HeuristicEstimator),
        EstimatorChoice::CharRatio => Box::new(CharRatioEstimator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_counts_words_and_punctuation() {
        // Hello(2) ,(1) how(1) are(1) you(1) ?(1); single spaces are free
        assert_eq!(HeuristicEstimator.estimate("Hello, how are you?"), 7);
    }

    #[test]
    fn test_heuristic_digits_and_long_whitespace() {
        // 12345(2) "  "(1) ab(1)
        assert_eq!(HeuristicEstimator.estimate("12345  ab"), 4);
        assert_eq!(HeuristicEstimator.estimate(""), 0);
        assert_eq!(HeuristicEstimator.estimate("a\nb"), 2);
    }

    #[test]
    fn test_heuristic_counts_each_non_ascii_char() {
        assert_eq!(HeuristicEstimator.estimate("こんにちは"), 5);
    }

    #[test]
    fn test_heuristic_grows_with_text() {
        let short = HeuristicEstimator.estimate("alice: hello");
        let long = HeuristicEstimator.estimate("alice: hello there, everyone");
        assert!(long >= short);
    }

    #[test]
    fn test_char_ratio_estimate() {
        assert_eq!(CharRatioEstimator.estimate(""), 1);
        assert_eq!(CharRatioEstimator.estimate("abcdefgh"), 3);
    }

    #[test]
    fn test_closures_are_estimators() {
        let per_line = |_: &str| 1usize;
        assert_eq!(per_line.estimate("anything"), 1);
    }
}

//! Token counter implementations.

use crate::traits::tokenizer::TokenCounter;

/// Deterministic approximation of a BPE tokenizer.
///
/// Alphanumeric runs cost one token per four characters (rounded up),
/// every other non-whitespace character costs one token and whitespace is
/// free. Counts are additive across whitespace and punctuation, which keeps
/// chunk budgets stable without shipping a vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenizer;

impl HeuristicTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for HeuristicTokenizer {
    fn count(&self, text: &str) -> usize {
        let mut tokens: usize = 0;
        let mut run: usize = 0;

        for c in text.chars() {
            if c.is_alphanumeric() {
                run += 1;
                continue;
            }
            tokens += run.div_ceil(4);
            run = 0;
            if !c.is_whitespace() {
                tokens += 1;
            }
        }

        tokens + run.div_ceil(4)
    }
}

/// `cl100k_base` tokenizer, the encoding used by gpt-3.5-turbo and gpt-4.
#[cfg(feature = "tiktoken")]
pub struct BpeTokenizer {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl BpeTokenizer {
    /// Load the `cl100k_base` encoding.
    pub fn cl100k() -> crate::error::Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| crate::error::ExtractionError::Config(e.to_string().into()))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for BpeTokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(HeuristicTokenizer.count(""), 0);
        assert_eq!(HeuristicTokenizer.count("   "), 0);
    }

    #[test]
    fn test_words_and_punctuation() {
        // "Casa" = 1, "bonita" = 2, "." = 1
        assert_eq!(HeuristicTokenizer.count("Casa bonita."), 4);
        // "$" = 1, "250" = 1, "," = 1, "000" = 1
        assert_eq!(HeuristicTokenizer.count("$250,000"), 4);
    }

    #[test]
    fn test_additive_across_spaces() {
        let a = "three bedroom house";
        let b = " near the beach.";
        let joined = format!("{}{}", a, b);
        assert_eq!(
            HeuristicTokenizer.count(&joined),
            HeuristicTokenizer.count(a) + HeuristicTokenizer.count(b)
        );
    }

    #[test]
    fn test_unicode_letters_count_as_word() {
        assert_eq!(HeuristicTokenizer.count("recámara"), 2);
    }
}

//! Token counting abstraction.
//!
//! The chunker and the extraction budget must count with the same
//! tokenizer, otherwise chunk boundaries drift between runs. Callers pick
//! one implementation and pass it in.

/// Counts tokens the way the target model would.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

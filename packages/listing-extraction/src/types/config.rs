//! Configuration types for chunking, extraction and cleaning.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Provenance stamped on extracted listings that do not name a source.
pub const DEFAULT_SOURCE: &str = "Casas y Terrenos";

/// Configuration for the listing-aware chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Upper bound on tokens per chunk.
    ///
    /// Default: 4000.
    pub max_tokens: usize,

    /// Tokens of trailing context repeated at the start of the next chunk.
    ///
    /// Default: 200.
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            overlap_tokens: 200,
        }
    }
}

impl ChunkerConfig {
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            max_tokens,
            overlap_tokens,
        }
    }
}

/// Configuration for the extraction orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// How page text is split before extraction.
    pub chunking: ChunkerConfig,

    /// Only send the first N chunks (None = all).
    pub max_chunks: Option<usize>,

    /// Only send the longest chunk prefix whose tokens fit this budget.
    pub max_total_tokens: Option<usize>,

    /// Pause between consecutive model calls.
    pub delay: Duration,

    /// `source` value for listings that come back without one.
    pub default_source: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkerConfig::default(),
            max_chunks: None,
            max_total_tokens: None,
            delay: Duration::from_secs(1),
            default_source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl ExtractConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunker configuration.
    pub fn with_chunking(mut self, chunking: ChunkerConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Cap the number of chunks sent.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = Some(max_chunks);
        self
    }

    /// Cap the cumulative tokens sent.
    pub fn with_max_total_tokens(mut self, max_total_tokens: usize) -> Self {
        self.max_total_tokens = Some(max_total_tokens);
        self
    }

    /// Set the delay between calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the default provenance string.
    pub fn with_default_source(mut self, source: impl Into<String>) -> Self {
        self.default_source = source.into();
        self
    }
}

/// Exponential backoff schedule for per-record retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Wait before the second attempt; doubles after each failure.
    pub base_delay: Duration,

    /// Upper bound on a single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before attempt `attempt + 1`, given `attempt` failures so far (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Configuration for the cleaning orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Pause between consecutive records.
    pub delay: Duration,

    /// Retry schedule for a single record.
    pub retry: RetryPolicy,
}

impl CleanConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay between records.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the retry schedule.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Configuration for a full extract-then-clean run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where raw and cleaned result files are written.
    pub output_dir: PathBuf,

    pub extract: ExtractConfig,

    pub clean: CleanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            extract: ExtractConfig::default(),
            clean: CleanConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the extraction stage configuration.
    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    /// Set the cleaning stage configuration.
    pub fn with_clean(mut self, clean: CleanConfig) -> Self {
        self.clean = clean;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(8));
        assert_eq!(policy.backoff(3), Duration::from_secs(16));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(5), Duration::from_secs(60));
        assert_eq!(policy.backoff(40), Duration::from_secs(60));
    }

    #[test]
    fn test_extract_config_builder() {
        let config = ExtractConfig::new()
            .with_max_chunks(3)
            .with_max_total_tokens(10_000)
            .with_delay(Duration::from_secs(2))
            .with_chunking(ChunkerConfig::new(500, 50));

        assert_eq!(config.max_chunks, Some(3));
        assert_eq!(config.max_total_tokens, Some(10_000));
        assert_eq!(config.delay, Duration::from_secs(2));
        assert_eq!(config.chunking.max_tokens, 500);
        assert_eq!(config.default_source, DEFAULT_SOURCE);
    }
}

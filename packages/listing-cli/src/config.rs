//! Command-line pipeline settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use listing_extraction::{ChunkerConfig, CleanConfig, ExtractConfig, PipelineConfig, RetryPolicy};

/// Knobs shared by every command that chunks or calls the model.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Directory for raw and cleaned listing files
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Send at most this many chunks (0 = no limit)
    #[arg(long, default_value_t = 3)]
    pub max_chunks: usize,

    /// Total token budget across sent chunks (0 = no limit)
    #[arg(long, default_value_t = 10_000)]
    pub max_tokens: usize,

    /// Token limit for a single chunk
    #[arg(long, default_value_t = 4_000)]
    pub chunk_tokens: usize,

    /// Tokens repeated at the start of the next chunk
    #[arg(long, default_value_t = 200)]
    pub overlap_tokens: usize,

    /// Seconds to wait between extraction calls
    #[arg(long, default_value_t = 2.0)]
    pub delay: f64,

    /// Seconds to wait between cleaning calls
    #[arg(long, default_value_t = 1.0)]
    pub cleaner_delay: f64,

    /// Attempts per record during cleaning
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,
}

impl PipelineArgs {
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig::new(self.chunk_tokens, self.overlap_tokens)
    }

    pub fn extract_config(&self) -> Result<ExtractConfig> {
        let mut config = ExtractConfig::default()
            .with_chunking(self.chunker_config())
            .with_delay(seconds(self.delay, "--delay")?);
        if self.max_chunks > 0 {
            config = config.with_max_chunks(self.max_chunks);
        }
        if self.max_tokens > 0 {
            config = config.with_max_total_tokens(self.max_tokens);
        }
        Ok(config)
    }

    pub fn clean_config(&self) -> Result<CleanConfig> {
        let retry = RetryPolicy {
            max_attempts: self.attempts.max(1),
            ..RetryPolicy::default()
        };
        Ok(CleanConfig::default()
            .with_delay(seconds(self.cleaner_delay, "--cleaner-delay")?)
            .with_retry(retry))
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig::default()
            .with_output_dir(&self.output_dir)
            .with_extract(self.extract_config()?)
            .with_clean(self.clean_config()?))
    }
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("{flag} must be a non-negative number of seconds"))
}

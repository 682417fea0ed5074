//! Extraction orchestrator: page text in, validated listings out.
//!
//! Chunks are sent to the model one at a time, in order, with a fixed pause
//! between calls. A chunk that fails (network, malformed JSON, every
//! candidate invalid) is logged and skipped; it never aborts the run.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::pipeline::prompts::{format_extract_prompt, EXTRACT_SYSTEM_PROMPT};
use crate::pipeline::response::parse_candidates;
use crate::schema::normalize_record;
use crate::text::{Chunk, Chunker, HeuristicTokenizer};
use crate::traits::{ai::AI, tokenizer::TokenCounter};
use crate::types::{config::ExtractConfig, listing::ListingRecord};

/// Hint logged when the provider reports an exhausted quota.
pub(crate) const QUOTA_HINT: &str =
    "provider quota exhausted; check the account plan and billing before retrying";

/// Outcome of one extraction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    /// Chunks produced from the page before any limit was applied
    pub chunks_total: usize,

    /// Chunks actually sent to the model
    pub chunks_sent: usize,

    /// Chunks whose call or response parsing failed
    pub chunks_failed: usize,

    /// Candidates the schema rejected
    pub records_dropped: usize,

    /// Valid records in chunk order
    pub records: Vec<ListingRecord>,
}

/// Truncate a chunk plan to the configured limits.
///
/// `max_chunks` keeps the first N chunks. `max_total_tokens` then keeps the
/// longest prefix whose summed token counts stay within budget; the first
/// chunk that would overflow ends the plan, it is never partially sent.
pub fn select_chunks(
    chunks: Vec<Chunk>,
    max_chunks: Option<usize>,
    max_total_tokens: Option<usize>,
) -> Vec<Chunk> {
    let limit = max_chunks.unwrap_or(usize::MAX);
    let mut budget = max_total_tokens.unwrap_or(usize::MAX);
    let mut selected = Vec::new();

    for chunk in chunks.into_iter().take(limit) {
        if chunk.token_count > budget {
            break;
        }
        budget -= chunk.token_count;
        selected.push(chunk);
    }

    selected
}

/// Sequential, chunk-by-chunk listing extractor.
pub struct Extractor<A: AI, T: TokenCounter = HeuristicTokenizer> {
    ai: A,
    chunker: Chunker<T>,
    config: ExtractConfig,
}

impl<A: AI> Extractor<A> {
    /// Create an extractor using the built-in heuristic tokenizer.
    pub fn new(ai: A, config: ExtractConfig) -> Self {
        let chunker = Chunker::new(config.chunking);
        Self {
            ai,
            chunker,
            config,
        }
    }
}

impl<A: AI, T: TokenCounter> Extractor<A, T> {
    /// Create an extractor that budgets chunks with `tokenizer`.
    pub fn with_tokenizer(ai: A, tokenizer: T, config: ExtractConfig) -> Self {
        let chunker = Chunker::with_tokenizer(tokenizer, config.chunking);
        Self {
            ai,
            chunker,
            config,
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Chunks that would be sent for `text`, after limits.
    pub fn plan(&self, text: &str) -> Vec<Chunk> {
        select_chunks(
            self.chunker.chunk(text),
            self.config.max_chunks,
            self.config.max_total_tokens,
        )
    }

    /// Extract every valid listing from `text`.
    pub async fn extract(&self, text: &str) -> Vec<ListingRecord> {
        self.extract_with_report(text).await.records
    }

    /// Extract listings and report what happened to each chunk.
    pub async fn extract_with_report(&self, text: &str) -> ExtractionReport {
        let chunks = self.chunker.chunk(text);
        let chunks_total = chunks.len();
        let plan = select_chunks(chunks, self.config.max_chunks, self.config.max_total_tokens);

        info!(
            provider = self.ai.name(),
            chunks_total,
            chunks_selected = plan.len(),
            tokens = plan.iter().map(|c| c.token_count).sum::<usize>(),
            "Starting listing extraction"
        );

        let mut report = ExtractionReport {
            chunks_total,
            ..Default::default()
        };

        for (i, chunk) in plan.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                debug!(delay_ms = self.config.delay.as_millis() as u64, "Waiting before next chunk");
                tokio::time::sleep(self.config.delay).await;
            }

            report.chunks_sent += 1;
            match self.extract_chunk(chunk).await {
                Ok((records, dropped)) => {
                    debug!(
                        chunk = chunk.index,
                        records = records.len(),
                        dropped,
                        "Chunk extracted"
                    );
                    report.records_dropped += dropped;
                    report.records.extend(records);
                }
                Err(e) if e.is_quota_exceeded() => {
                    report.chunks_failed += 1;
                    error!(chunk = chunk.index, error = %e, hint = QUOTA_HINT, "Chunk extraction failed");
                }
                Err(e) => {
                    report.chunks_failed += 1;
                    warn!(chunk = chunk.index, error = %e, "Chunk extraction failed, skipping");
                }
            }
        }

        info!(
            records = report.records.len(),
            chunks_sent = report.chunks_sent,
            chunks_failed = report.chunks_failed,
            records_dropped = report.records_dropped,
            "Listing extraction finished"
        );

        report
    }

    /// One model call for one chunk. Returns valid records and the number
    /// of candidates the schema rejected.
    async fn extract_chunk(&self, chunk: &Chunk) -> Result<(Vec<ListingRecord>, usize)> {
        let response = self
            .ai
            .extract_structured(EXTRACT_SYSTEM_PROMPT, &format_extract_prompt(&chunk.text))
            .await?;

        let candidates = parse_candidates(&response)?;
        let mut records = Vec::with_capacity(candidates.len());
        let mut dropped = 0;

        for mut candidate in candidates {
            self.default_source(&mut candidate);
            match normalize_record(&candidate) {
                Ok(record) => records.push(record),
                Err(violation) => {
                    dropped += 1;
                    warn!(chunk = chunk.index, reason = %violation, "Dropping invalid listing");
                }
            }
        }

        if records.is_empty() && dropped > 0 {
            debug!(chunk = chunk.index, dropped, "No valid listings in chunk");
        }

        Ok((records, dropped))
    }

    fn default_source(&self, candidate: &mut Value) {
        if let Value::Object(object) = candidate {
            let missing = object
                .get("source")
                .and_then(Value::as_str)
                .map_or(true, |s| s.trim().is_empty());
            if missing {
                object.insert(
                    "source".to_string(),
                    Value::String(self.config.default_source.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::testing::MockAI;
    use std::time::Duration;

    fn chunk(index: usize, token_count: usize) -> Chunk {
        Chunk {
            index,
            start: 0,
            end: 0,
            text: String::new(),
            token_count,
        }
    }

    fn indices(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(|c| c.index).collect()
    }

    #[test]
    fn test_select_chunks_max_chunks_first() {
        let chunks = vec![chunk(0, 10), chunk(1, 10), chunk(2, 10)];
        assert_eq!(indices(&select_chunks(chunks, Some(2), None)), vec![0, 1]);
    }

    #[test]
    fn test_select_chunks_stops_at_first_overflow() {
        let chunks = vec![chunk(0, 40), chunk(1, 70), chunk(2, 5)];
        assert_eq!(indices(&select_chunks(chunks, None, Some(100))), vec![0]);
    }

    #[test]
    fn test_select_chunks_budget_smaller_than_first() {
        let chunks = vec![chunk(0, 40)];
        assert!(select_chunks(chunks, None, Some(10)).is_empty());
    }

    #[test]
    fn test_select_chunks_no_limits() {
        let chunks = vec![chunk(0, 1), chunk(1, 2)];
        assert_eq!(select_chunks(chunks, None, None).len(), 2);
    }

    const LISTING: &str = r#"```json
[{"address": "Av. Mexico 1200, Guadalajara", "price": "$3,200,000 MXN", "bedrooms": 3,
  "bathrooms": 2, "listing_type": "sale", "property_type": "house",
  "description": "Casa amplia", "image_link": "https://img.example.com/a.jpg"},
 {"address": "Sin precio", "bedrooms": 1}]
```"#;

    #[tokio::test(start_paused = true)]
    async fn test_defaults_source_and_drops_invalid() {
        let ai = MockAI::new().with_response(LISTING);
        let extractor = Extractor::new(ai, ExtractConfig::default());

        let report = extractor
            .extract_with_report("Casa en venta $3,200,000 con 3 bedrooms.")
            .await;

        assert_eq!(report.chunks_sent, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records_dropped, 1);
        assert_eq!(report.records[0].source.as_deref(), Some("Casas y Terrenos"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_chunk_does_not_abort() {
        let ai = MockAI::new()
            .with_error(ExtractionError::AI("connection reset".into()))
            .with_response(LISTING);
        let config = ExtractConfig::default()
            .with_chunking(crate::types::config::ChunkerConfig::new(12, 0))
            .with_delay(Duration::from_millis(10));
        let extractor = Extractor::new(ai, config);

        let report = extractor
            .extract_with_report("Casa uno $100 con jardin. Casa dos $200 con alberca.")
            .await;

        assert_eq!(report.chunks_sent, 2);
        assert_eq!(report.chunks_failed, 1);
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_calls() {
        let ai = std::sync::Arc::new(MockAI::new());
        let extractor = Extractor::new(ai.clone(), ExtractConfig::default());

        assert!(extractor.extract("   ").await.is_empty());
        assert_eq!(ai.call_count(), 0);
    }
}

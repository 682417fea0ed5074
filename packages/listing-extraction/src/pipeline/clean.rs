//! Cleaning orchestrator: re-validates stored listings one at a time.
//!
//! Each record is serialized, sent to the model with the cleaning prompt and
//! run back through the schema. The model answers `{}` for records it cannot
//! salvage; those are discarded without counting as failures.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SchemaViolation};
use crate::pipeline::extract::QUOTA_HINT;
use crate::pipeline::prompts::{format_clean_prompt, CLEAN_SYSTEM_PROMPT};
use crate::pipeline::response::{is_discard, parse_candidates};
use crate::schema::normalize_record;
use crate::traits::ai::AI;
use crate::types::{config::CleanConfig, listing::ListingRecord};

/// What happened to one record.
#[derive(Debug)]
enum Cleaned {
    Kept(ListingRecord),
    Discarded,
    Invalid(SchemaViolation),
}

/// Outcome of one cleaning run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    /// Records read from the input
    pub input: usize,

    /// Records the model answered `{}` for
    pub discarded: usize,

    /// Records whose cleaned form still failed the schema
    pub invalid: usize,

    /// Records that failed on every attempt
    pub failed: usize,

    /// Surviving records in input order
    pub records: Vec<ListingRecord>,
}

/// Sequential, record-by-record listing cleaner.
pub struct Cleaner<A: AI> {
    ai: A,
    config: CleanConfig,
}

impl<A: AI> Cleaner<A> {
    pub fn new(ai: A, config: CleanConfig) -> Self {
        Self { ai, config }
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Clean `raw` and return the survivors.
    pub async fn clean(&self, raw: &[Value]) -> Vec<ListingRecord> {
        self.clean_with_report(raw).await.records
    }

    /// Clean `raw` and report what happened to each record.
    pub async fn clean_with_report(&self, raw: &[Value]) -> CleaningReport {
        info!(
            provider = self.ai.name(),
            records = raw.len(),
            max_attempts = self.config.retry.max_attempts,
            "Starting listing cleaning"
        );

        let mut report = CleaningReport {
            input: raw.len(),
            ..Default::default()
        };

        for (i, record) in raw.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            match self.clean_with_retry(i, record).await {
                Ok(Cleaned::Kept(listing)) => {
                    debug!(record = i, address = listing.display_address(), "Listing cleaned");
                    report.records.push(listing);
                }
                Ok(Cleaned::Discarded) => {
                    report.discarded += 1;
                    info!(record = i, "Model discarded listing as unsalvageable");
                }
                Ok(Cleaned::Invalid(violation)) => {
                    report.invalid += 1;
                    warn!(record = i, reason = %violation, "Dropping invalid cleaned listing");
                }
                Err(e) => {
                    report.failed += 1;
                    if e.is_quota_exceeded() {
                        error!(record = i, error = %e, hint = QUOTA_HINT, "Cleaning failed");
                    } else {
                        error!(record = i, error = %e, "Cleaning failed after retries, skipping");
                    }
                }
            }
        }

        info!(
            input = report.input,
            kept = report.records.len(),
            discarded = report.discarded,
            invalid = report.invalid,
            failed = report.failed,
            "Listing cleaning finished"
        );

        report
    }

    /// Run [`Self::clean_one`] under the retry policy.
    ///
    /// Every call or parse failure is retried, quota errors included. A
    /// schema-invalid answer is a final verdict on the record.
    async fn clean_with_retry(&self, index: usize, record: &Value) -> Result<Cleaned> {
        let policy = &self.config.retry;
        let mut attempt = 1;

        loop {
            match self.clean_one(record).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < policy.max_attempts => {
                    let wait = policy.backoff(attempt);
                    if e.is_quota_exceeded() {
                        warn!(
                            record = index,
                            attempt,
                            error = %e,
                            hint = QUOTA_HINT,
                            "Quota exceeded"
                        );
                    }
                    info!(
                        record = index,
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        error = %e,
                        "Retrying cleaning call"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn clean_one(&self, record: &Value) -> Result<Cleaned> {
        let record_json = serde_json::to_string(record)?;
        let response = self
            .ai
            .extract_structured(CLEAN_SYSTEM_PROMPT, &format_clean_prompt(&record_json))
            .await?;

        let candidates = parse_candidates(&response)?;
        let Some(cleaned) = candidates.first() else {
            return Ok(Cleaned::Discarded);
        };
        if candidates.len() > 1 {
            debug!(returned = candidates.len(), "Cleaning returned several objects, keeping the first");
        }
        if is_discard(cleaned) {
            return Ok(Cleaned::Discarded);
        }

        Ok(match normalize_record(cleaned) {
            Ok(listing) => Cleaned::Kept(listing),
            Err(violation) => Cleaned::Invalid(violation),
        })
    }
}

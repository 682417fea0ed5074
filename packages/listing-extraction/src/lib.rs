//! Real-Estate Listing Extraction Library
//!
//! Turns noisy listing pages into validated, canonical property records
//! using an LLM, one chunk at a time.
//!
//! # Design Philosophy
//!
//! **"The model proposes, the schema disposes"**
//!
//! - Page text is cut on listing boundaries, never mid-listing when avoidable
//! - Every model answer goes through one coercion surface ([`schema`])
//! - Invalid records are dropped with a logged reason, never defaulted
//! - Work is strictly sequential with pauses, to stay inside provider limits
//! - Library handles mechanics, the provider is swappable behind [`AI`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_extraction::{Cleaner, CleanConfig, ExtractConfig, Extractor};
//! use listing_extraction::testing::MockAI;
//! use std::sync::Arc;
//!
//! let ai = Arc::new(MockAI::new());
//! let extractor = Extractor::new(ai.clone(), ExtractConfig::default().with_max_chunks(3));
//! let raw = extractor.extract(&page_text).await;
//!
//! let cleaner = Cleaner::new(ai, CleanConfig::default());
//! let values: Vec<_> = raw.iter().map(|r| r.to_value()).collect();
//! let cleaned = cleaner.clean(&values).await;
//! ```
//!
//! # Modules
//!
//! - [`text`] - Normalization, token counting and listing-aware chunking
//! - [`schema`] - Coercion of raw JSON into [`ListingRecord`]
//! - [`pipeline`] - Extraction and cleaning orchestrators, file stages
//! - [`api`] - Results backend client
//! - [`traits`] - Core trait abstractions (AI, TokenCounter)
//! - [`types`] - Listing record and configuration types
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod api;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod security;
pub mod testing;
pub mod text;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{ApiError, ExtractionError, Result, SchemaViolation};
pub use traits::{ai::AI, tokenizer::TokenCounter};
pub use types::{
    config::{
        ChunkerConfig, CleanConfig, ExtractConfig, PipelineConfig, RetryPolicy, DEFAULT_SOURCE,
    },
    listing::{Currency, ListingRecord, ListingType},
};

pub use schema::normalize_record;
pub use text::{chunk_text, normalize_text, Chunk, Chunker, HeuristicTokenizer};

#[cfg(feature = "tiktoken")]
pub use text::BpeTokenizer;

// Re-export pipeline components
pub use pipeline::{
    // Orchestrators
    select_chunks, Cleaner, CleaningReport, ExtractionReport, Extractor,
    // File stages
    load_raw_listings, run_clean_stage, run_extract_stage, run_pipeline, url_hash,
    PipelineOutput, StageOutput,
};

pub use api::ResultsClient;
pub use security::{AICredentials, ApiCredentials, SecretString};

// Re-export testing utilities
pub use testing::MockAI;

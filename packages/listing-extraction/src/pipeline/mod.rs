//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Chunk planning under chunk-count and token budgets
//! - One model call per chunk, strictly sequential, with pauses
//! - Response repair (code fences, single objects) and schema coercion
//! - Record-by-record cleaning with retry and backoff
//! - File stages that persist each step as a JSON array

pub mod clean;
pub mod extract;
pub mod prompts;
pub mod response;
pub mod stages;

pub use clean::{Cleaner, CleaningReport};
pub use extract::{select_chunks, ExtractionReport, Extractor};
pub use prompts::{
    format_clean_prompt, format_extract_prompt, CLEAN_SYSTEM_PROMPT, EXTRACT_SYSTEM_PROMPT,
};
pub use response::{is_discard, json_payload, parse_candidates};
pub use stages::{
    cleaned_output_path, load_raw_listings, raw_output_path, run_clean_stage, run_extract_stage,
    run_pipeline, url_hash, write_listings, PipelineOutput, StageOutput,
};

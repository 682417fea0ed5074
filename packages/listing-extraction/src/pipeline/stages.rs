//! File-based stages: page text to a raw listings file, raw file to a
//! cleaned file, and both in sequence.
//!
//! Files are pretty-printed JSON arrays of canonical records, named after
//! the page URL so runs for different pages never collide.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::error::{ExtractionError, Result};
use crate::pipeline::clean::Cleaner;
use crate::pipeline::extract::Extractor;
use crate::traits::{ai::AI, tokenizer::TokenCounter};
use crate::types::{config::PipelineConfig, listing::ListingRecord};

/// Longest URL-derived file name component.
pub const URL_HASH_LEN: usize = 50;

/// Result of one file stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutput {
    pub url: String,
    pub path: PathBuf,
    pub num_listings: usize,

    /// Input problem that made the stage write an empty file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of both stages run back to back.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub extract: StageOutput,
    pub clean: StageOutput,
}

/// File-name-safe key for a URL: every character that is not an ASCII
/// letter or digit becomes `_`, capped at [`URL_HASH_LEN`] characters.
pub fn url_hash(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(URL_HASH_LEN)
        .collect()
}

pub fn raw_output_path(output_dir: &Path, url: &str) -> PathBuf {
    output_dir.join(format!("raw_property_listings_{}.json", url_hash(url)))
}

pub fn cleaned_output_path(output_dir: &Path, url: &str) -> PathBuf {
    output_dir.join(format!("cleaned_property_listings_{}.json", url_hash(url)))
}

/// Read a file holding a JSON array of raw listing objects.
pub async fn load_raw_listings(path: &Path) -> Result<Vec<Value>> {
    let input_error = |reason: String| ExtractionError::Input {
        path: path.to_path_buf(),
        reason,
    };

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| input_error(e.to_string()))?;

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(input_error("expected a JSON array".into())),
        Err(e) => Err(input_error(format!("invalid JSON: {e}"))),
    }
}

/// Write records as a pretty-printed JSON array, creating parent dirs.
pub async fn write_listings(path: &Path, records: &[ListingRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Extract listings from page text and write the raw listings file.
pub async fn run_extract_stage<A: AI, T: TokenCounter>(
    extractor: &Extractor<A, T>,
    url: &str,
    text: &str,
    output_dir: &Path,
) -> Result<StageOutput> {
    let records = extractor.extract(text).await;
    let path = raw_output_path(output_dir, url);
    write_listings(&path, &records).await?;

    info!(url, path = %path.display(), listings = records.len(), "Saved raw listings");

    Ok(StageOutput {
        url: url.to_string(),
        path,
        num_listings: records.len(),
        error: None,
    })
}

/// Clean a raw listings file and write the cleaned file.
///
/// A missing or malformed input file is not fatal: an empty array is
/// written and the problem is recorded on the returned output.
pub async fn run_clean_stage<A: AI>(
    cleaner: &Cleaner<A>,
    url: &str,
    input: &Path,
    output_dir: &Path,
) -> Result<StageOutput> {
    let path = cleaned_output_path(output_dir, url);

    let raw = match load_raw_listings(input).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(url, input = %input.display(), error = %e, "Cannot read raw listings");
            write_listings(&path, &[]).await?;
            return Ok(StageOutput {
                url: url.to_string(),
                path,
                num_listings: 0,
                error: Some(e.to_string()),
            });
        }
    };

    let records = cleaner.clean(&raw).await;
    write_listings(&path, &records).await?;

    info!(url, path = %path.display(), listings = records.len(), "Saved cleaned listings");

    Ok(StageOutput {
        url: url.to_string(),
        path,
        num_listings: records.len(),
        error: None,
    })
}

/// Extract then clean, strictly in sequence, sharing one provider.
///
/// `tokenizer` budgets the extraction chunks and should match the model
/// behind `ai`.
pub async fn run_pipeline<A: AI + ?Sized, T: TokenCounter>(
    ai: Arc<A>,
    tokenizer: T,
    url: &str,
    text: &str,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    info!(
        url,
        output_dir = %config.output_dir.display(),
        max_tokens = config.extract.chunking.max_tokens,
        overlap_tokens = config.extract.chunking.overlap_tokens,
        max_chunks = ?config.extract.max_chunks,
        max_total_tokens = ?config.extract.max_total_tokens,
        delay_secs = config.extract.delay.as_secs_f64(),
        cleaner_delay_secs = config.clean.delay.as_secs_f64(),
        "=== Starting listing pipeline ==="
    );

    let extractor =
        Extractor::with_tokenizer(Arc::clone(&ai), tokenizer, config.extract.clone());
    let extract = run_extract_stage(&extractor, url, text, &config.output_dir).await?;

    let cleaner = Cleaner::new(ai, config.clean.clone());
    let clean = run_clean_stage(&cleaner, url, &extract.path, &config.output_dir).await?;

    info!(
        url,
        raw = extract.num_listings,
        cleaned = clean.num_listings,
        "=== Listing pipeline finished ==="
    );

    Ok(PipelineOutput { extract, clean })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_hash_replaces_and_truncates() {
        assert_eq!(
            url_hash("https://www.casasyterrenos.com/jalisco"),
            "https___www_casasyterrenos_com_jalisco"
        );
        let long = format!("https://example.com/{}", "a".repeat(100));
        assert_eq!(url_hash(&long).chars().count(), URL_HASH_LEN);
    }

    #[test]
    fn test_output_paths() {
        let dir = Path::new("out");
        assert_eq!(
            raw_output_path(dir, "a.b"),
            PathBuf::from("out/raw_property_listings_a_b.json")
        );
        assert_eq!(
            cleaned_output_path(dir, "a.b"),
            PathBuf::from("out/cleaned_property_listings_a_b.json")
        );
    }

    #[tokio::test]
    async fn test_load_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        tokio::fs::write(&path, r#"{"price": 1}"#).await.unwrap();

        let err = load_raw_listings(&path).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Input { .. }));
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_raw_listings(&dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Input { .. }));
    }
}

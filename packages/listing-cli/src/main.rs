//! Listing pipeline CLI
//!
//! Runs the extraction and cleaning stages over saved page text and
//! publishes cleaned listings to the results backend. Prints a JSON summary
//! of each command on stdout; logs go to stderr.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use listing_extraction::ai::{OpenAI, DEFAULT_MODEL};
use listing_extraction::api::{AgentStatus, ScrapingResultCreate, CLEANER_AGENT, CRAWLER_AGENT};
use listing_extraction::{
    load_raw_listings, normalize_record, run_clean_stage, run_extract_stage, run_pipeline,
    select_chunks, AICredentials, ApiCredentials, BpeTokenizer, Chunker, Cleaner, Extractor,
    ResultsClient,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::PipelineArgs;

#[derive(Parser)]
#[command(name = "listing-pipeline")]
#[command(about = "Extract, clean and publish real-estate listings with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract listings from page text into a raw listings file
    Extract {
        /// Page the text was scraped from
        #[arg(long)]
        url: String,
        /// File holding the page text
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Clean a raw listings file into a cleaned listings file
    Clean {
        #[arg(long)]
        url: String,
        /// Raw listings JSON array
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Extract then clean
    Run {
        #[arg(long)]
        url: String,
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Publish cleaned listings as scraping results
    Publish {
        /// Cleaned listings JSON array
        #[arg(long)]
        input: PathBuf,
        /// Scraping target the results belong to
        #[arg(long)]
        target_id: String,
        #[arg(long)]
        source_url: String,
    },

    /// Show how page text would be chunked, without calling the model
    Chunks {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Serialize)]
struct ChunkSummary {
    index: usize,
    start: usize,
    end: usize,
    token_count: usize,
    preview: String,
}

#[derive(Serialize)]
struct PublishSummary {
    target_id: String,
    read: usize,
    skipped_invalid: usize,
    published: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            url,
            input,
            pipeline,
        } => {
            let text = read_page(&input).await?;
            let extractor =
                Extractor::with_tokenizer(provider()?, tokenizer()?, pipeline.extract_config()?);
            let output = run_extract_stage(&extractor, &url, &text, &pipeline.output_dir).await?;
            print_json(&output)
        }
        Commands::Clean {
            url,
            input,
            pipeline,
        } => {
            let cleaner = Cleaner::new(provider()?, pipeline.clean_config()?);
            let output = run_clean_stage(&cleaner, &url, &input, &pipeline.output_dir).await?;
            print_json(&output)
        }
        Commands::Run {
            url,
            input,
            pipeline,
        } => {
            let text = read_page(&input).await?;
            let config = pipeline.pipeline_config()?;
            let output = run_pipeline(provider()?, tokenizer()?, &url, &text, &config).await?;
            print_json(&output)
        }
        Commands::Publish {
            input,
            target_id,
            source_url,
        } => {
            let summary = publish(&input, target_id, &source_url).await?;
            print_json(&summary)
        }
        Commands::Chunks { input, pipeline } => {
            let text = read_page(&input).await?;
            let chunks =
                Chunker::with_tokenizer(tokenizer()?, pipeline.chunker_config()).chunk(&text);
            let extract = pipeline.extract_config()?;
            let summaries: Vec<ChunkSummary> =
                select_chunks(chunks, extract.max_chunks, extract.max_total_tokens)
                    .into_iter()
                    .map(|c| ChunkSummary {
                        index: c.index,
                        start: c.start,
                        end: c.end,
                        token_count: c.token_count,
                        preview: c.text.chars().take(80).collect(),
                    })
                    .collect();
            print_json(&summaries)
        }
    }
}

/// Model provider from `OPENAI_*` environment variables.
fn provider() -> Result<Arc<OpenAI>> {
    let credentials =
        AICredentials::from_env(DEFAULT_MODEL).context("Failed to load OpenAI credentials")?;
    tracing::info!(model = %credentials.model, "Using OpenAI provider");
    Ok(Arc::new(OpenAI::from_credentials(credentials)))
}

/// Token counter matching the OpenAI chat models.
fn tokenizer() -> Result<BpeTokenizer> {
    BpeTokenizer::cl100k().context("Failed to load cl100k_base tokenizer")
}

async fn read_page(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read page text from {}", path.display()))
}

async fn publish(input: &Path, target_id: String, source_url: &str) -> Result<PublishSummary> {
    let started = Utc::now();
    let raw = load_raw_listings(input).await?;

    let credentials = ApiCredentials::from_env().context("Failed to load results API credentials")?;
    let client = ResultsClient::connect(&credentials)
        .await
        .context("Failed to log in to results backend")?;

    let mut summary = PublishSummary {
        target_id,
        read: raw.len(),
        skipped_invalid: 0,
        published: 0,
        failed: 0,
    };

    for (i, value) in raw.iter().enumerate() {
        let record = match normalize_record(value) {
            Ok(record) => record,
            Err(violation) => {
                summary.skipped_invalid += 1;
                tracing::warn!(record = i, reason = %violation, "Skipping invalid listing");
                continue;
            }
        };

        let now = Utc::now();
        let payload = ScrapingResultCreate::from_listing(
            &record,
            source_url,
            summary.target_id.as_str(),
            now,
            vec![
                AgentStatus::succeeded(CRAWLER_AGENT, started, now),
                AgentStatus::succeeded(CLEANER_AGENT, started, now),
            ],
        );

        match client.create(&payload).await {
            Ok(_) => summary.published += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(record = i, address = record.display_address(), error = %e, "Failed to publish listing");
            }
        }
    }

    tracing::info!(
        published = summary.published,
        failed = summary.failed,
        skipped = summary.skipped_invalid,
        "Publish finished"
    );

    Ok(summary)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "listing-pipeline",
            "run",
            "--url",
            "https://www.casasyterrenos.com/",
            "--input",
            "page.txt",
            "--max-chunks",
            "5",
        ]);
        match cli.command {
            Commands::Run { url, pipeline, .. } => {
                assert_eq!(url, "https://www.casasyterrenos.com/");
                assert_eq!(pipeline.max_chunks, 5);
                assert_eq!(pipeline.cleaner_delay, 1.0);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_publish_requires_target() {
        let result = Cli::try_parse_from([
            "listing-pipeline",
            "publish",
            "--input",
            "cleaned.json",
            "--source-url",
            "https://example.com",
        ]);
        assert!(result.is_err());
    }
}

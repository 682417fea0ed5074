//! Client for the listings results backend.
//!
//! Cleaned listings are published as scraping results through an
//! authenticated CRUD API.

pub mod client;
pub mod types;

pub use client::ResultsClient;
pub use types::{
    AgentStatus, ScrapingResultCreate, ScrapingResultDelete, ScrapingResultUpdate, CLEANER_AGENT,
    CRAWLER_AGENT, STATUS_SUCCESS,
};

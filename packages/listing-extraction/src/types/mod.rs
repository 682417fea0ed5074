//! Data types for the listing pipeline.

pub mod config;
pub mod listing;

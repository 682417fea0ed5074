//! Core trait abstractions for the listing extraction library.
//!
//! These traits define the seams applications implement to plug in a
//! model provider and a tokenizer.

pub mod ai;
pub mod tokenizer;

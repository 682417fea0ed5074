//! Text preparation: noise removal, token counting and listing-aware chunking.

pub mod chunker;
pub mod normalize;
pub mod tokenizer;

pub use chunker::{chunk_text, listing_boundaries, Chunk, Chunker};
pub use normalize::normalize_text;
pub use tokenizer::HeuristicTokenizer;

#[cfg(feature = "tiktoken")]
pub use tokenizer::BpeTokenizer;

//! Listing-aware chunking.
//!
//! Scraped listing pages are long runs of near-identical cards. Cutting
//! them at arbitrary token offsets splits a price from its address, so
//! chunks are cut at the start of sentences that carry a listing signal
//! (a price, a room count, an area, a street address) and the tail of each
//! chunk is repeated at the head of the next one.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::text::normalize::normalize_text;
use crate::text::tokenizer::HeuristicTokenizer;
use crate::traits::tokenizer::TokenCounter;
use crate::types::config::ChunkerConfig;

lazy_static! {
    static ref LISTING_SIGNALS: Vec<Regex> = vec![
        // Currency amounts
        Regex::new(r"\$\s?\d[\d,]*").unwrap(),
        // Room counts
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?bed").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?bath").unwrap(),
        // Area
        Regex::new(r"(?i)\b\d[\d,]*\s*(?:sq\s*\.?\s*(?:ft|feet)|square\s+feet)").unwrap(),
        // Street addresses
        Regex::new(
            r"(?i)\b\d+\s+(?:[a-z]+\s+){1,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|court|ct|way|place|pl)\b"
        )
        .unwrap(),
    ];
}

/// A contiguous slice of normalized text sent in one extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the chunk sequence.
    pub index: usize,

    /// Byte offset of the first character in the normalized text.
    pub start: usize,

    /// Byte offset one past the last character.
    pub end: usize,

    pub text: String,

    pub token_count: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Candidate chunk boundaries: sentence starts preceding listing signals.
///
/// A sentence starts at the first non-whitespace character after the
/// previous `.`. Always contains 0; sorted ascending without duplicates.
/// Offsets are byte offsets into `text`, which is expected to be
/// normalized already.
pub fn listing_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = vec![0];

    for pattern in LISTING_SIGNALS.iter() {
        for m in pattern.find_iter(text) {
            let sentence_start = text[..m.start()]
                .rfind('.')
                .map(|i| {
                    let rest = &text[i + 1..];
                    i + 1 + (rest.len() - rest.trim_start().len())
                })
                .unwrap_or(0);
            boundaries.push(sentence_start);
        }
    }

    boundaries.sort_unstable();
    boundaries.dedup();
    boundaries
}

/// Splits page text into token-bounded, listing-aligned chunks.
pub struct Chunker<T: TokenCounter = HeuristicTokenizer> {
    tokenizer: T,
    config: ChunkerConfig,
}

impl Chunker<HeuristicTokenizer> {
    /// Create a chunker using the built-in heuristic tokenizer.
    pub fn new(config: ChunkerConfig) -> Self {
        Self::with_tokenizer(HeuristicTokenizer, config)
    }
}

impl Default for Chunker<HeuristicTokenizer> {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

impl<T: TokenCounter> Chunker<T> {
    /// Create a chunker that counts with `tokenizer`.
    pub fn with_tokenizer(tokenizer: T, config: ChunkerConfig) -> Self {
        Self { tokenizer, config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Normalize `raw` and split it into chunks.
    pub fn chunk(&self, raw: &str) -> Vec<Chunk> {
        let text = normalize_text(raw);
        self.chunk_normalized(&text)
    }

    /// Split already-normalized text into chunks.
    ///
    /// Offsets in the returned chunks refer to `text`. Consecutive chunks
    /// either touch or overlap, so together they cover all of `text`.
    pub fn chunk_normalized(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let max_tokens = self.config.max_tokens.max(1);
        let boundaries = listing_boundaries(text);
        let points = self.cut_points(text, &boundaries, max_tokens);

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut prev = 0;
        let mut running = 0;

        for point in points {
            let segment_tokens = self.tokenizer.count(&text[prev..point]);

            if running + segment_tokens > max_tokens
                && prev > start
                && !text[start..prev].trim().is_empty()
            {
                self.push_chunk(&mut chunks, text, start, prev);

                start = self.overlap_start(text, start, prev);
                running = self.tokenizer.count(&text[start..prev]);
                if running + segment_tokens > max_tokens {
                    start = prev;
                    running = 0;
                }
            }

            running += segment_tokens;
            prev = point;
        }

        if start < text.len() && !text[start..].trim().is_empty() {
            self.push_chunk(&mut chunks, text, start, text.len());
        }

        tracing::debug!(
            chars = text.len(),
            boundaries = boundaries.len(),
            chunks = chunks.len(),
            max_tokens,
            overlap_tokens = self.config.overlap_tokens,
            "Chunked page text"
        );

        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<Chunk>, text: &str, start: usize, end: usize) {
        let slice = &text[start..end];
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            end,
            text: slice.to_string(),
            token_count: self.tokenizer.count(slice),
        });
    }

    /// Boundary offsets after 0, ending with `text.len()`.
    ///
    /// Segments between listing boundaries that alone exceed the budget are
    /// cut further on word boundaries.
    fn cut_points(&self, text: &str, boundaries: &[usize], max_tokens: usize) -> Vec<usize> {
        let mut points = Vec::with_capacity(boundaries.len());
        let mut prev = 0;

        for end in boundaries
            .iter()
            .copied()
            .skip(1)
            .chain(std::iter::once(text.len()))
        {
            if end <= prev {
                continue;
            }
            if self.tokenizer.count(&text[prev..end]) > max_tokens {
                points.extend(self.word_cuts(text, prev, end, max_tokens));
            }
            points.push(end);
            prev = end;
        }

        points
    }

    /// Greedy word-boundary cuts inside `text[from..to]`.
    fn word_cuts(&self, text: &str, from: usize, to: usize, max_tokens: usize) -> Vec<usize> {
        let word_starts = text[from..to]
            .char_indices()
            .filter(|&(_, c)| c == ' ')
            .map(|(i, _)| from + i + 1)
            .filter(|&w| w < to)
            .chain(std::iter::once(to));

        let mut cuts = Vec::new();
        let mut piece_start = from;
        let mut word_start = from;
        let mut running = 0;

        for next in word_starts {
            let word_tokens = self.tokenizer.count(&text[word_start..next]);
            if running + word_tokens > max_tokens && word_start > piece_start {
                cuts.push(word_start);
                piece_start = word_start;
                running = 0;
            }
            running += word_tokens;
            word_start = next;
        }

        cuts
    }

    /// Start of the overlap window ending at `cut`.
    ///
    /// Walks back word by word while the window stays within
    /// `overlap_tokens`; never reaches back to `chunk_start`.
    fn overlap_start(&self, text: &str, chunk_start: usize, cut: usize) -> usize {
        if self.config.overlap_tokens == 0 {
            return cut;
        }

        let mut best = cut;
        let mut window_tokens = 0;

        for (i, c) in text[chunk_start..cut].char_indices().rev() {
            if c != ' ' {
                continue;
            }
            let word_start = chunk_start + i + 1;
            if word_start >= best {
                continue;
            }
            window_tokens += self.tokenizer.count(&text[word_start..best]);
            if window_tokens > self.config.overlap_tokens {
                break;
            }
            best = word_start;
        }

        best
    }
}

/// Chunk `text` with the heuristic tokenizer.
pub fn chunk_text(text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<Chunk> {
    Chunker::new(ChunkerConfig::new(max_tokens, overlap_tokens)).chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn listing(n: usize) -> String {
        format!(
            "Casa {n} en venta con jardin y alberca privada. Precio $2{n}0,000 MXN con {b} bed y 2 bath, \
             ubicada en {n}5 Palm Tree Avenue cerca de la playa. Excelente oportunidad para familias.",
            n = n,
            b = n % 4 + 1
        )
    }

    fn page(listings: usize) -> String {
        (0..listings).map(listing).collect::<Vec<_>>().join(" ")
    }

    /// Rebuild the covered text from chunk spans, skipping overlap.
    fn reassemble(text: &str, chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for chunk in chunks {
            assert!(chunk.start <= covered, "gap before chunk {}", chunk.index);
            if chunk.end > covered {
                out.push_str(&text[covered..chunk.end]);
                covered = chunk.end;
            }
        }
        out
    }

    #[test]
    fn test_boundaries_include_zero_and_sentence_starts() {
        let text = "Welcome to our site. Casa bonita por $250,000 pesos. Nice.";
        let boundaries = listing_boundaries(text);
        assert_eq!(boundaries, vec![0, 21]);
        assert!(text[21..].starts_with("Casa bonita"));
    }

    #[test]
    fn test_boundaries_without_signals() {
        assert_eq!(listing_boundaries("Just some prose. Nothing else."), vec![0]);
    }

    #[test]
    fn test_street_suffix_must_be_a_whole_word() {
        let boundaries = listing_boundaries("Intro. 3 houses with stunning views");
        assert_eq!(boundaries, vec![0]);

        let boundaries = listing_boundaries("Intro. Find us at 12 Ocean Breeze Drive today");
        assert_eq!(boundaries, vec![0, 7]);
    }

    #[test]
    fn test_no_signals_single_chunk() {
        let chunks = chunk_text("Just some prose. Nothing else at all.", 1000, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Just some prose. Nothing else at all.");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("<div></div> [x]", 100, 10).is_empty());
    }

    #[test]
    fn test_chunks_are_normalized() {
        let chunks = chunk_text("<p>Casa   $100</p>\n\n https://x.y/z", 100, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Casa $100");
    }

    #[test]
    fn test_splits_on_listing_boundaries() {
        let text = normalize_text(&page(6));
        let chunker = Chunker::new(ChunkerConfig::new(80, 0));
        let chunks = chunker.chunk_normalized(&text);

        assert!(chunks.len() > 1);
        let boundaries = listing_boundaries(&text);
        for chunk in &chunks[1..] {
            assert!(boundaries.contains(&chunk.start));
        }
        assert_eq!(reassemble(&text, &chunks), text);
    }

    #[test]
    fn test_overlap_repeats_trailing_context() {
        let text = normalize_text(&page(6));
        let chunker = Chunker::new(ChunkerConfig::new(80, 10));
        let chunks = chunker.chunk_normalized(&text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert!(pair[1].start < pair[0].end, "expected overlap");
            let overlap = &text[pair[1].start..pair[0].end];
            assert!(HeuristicTokenizer.count(overlap) <= 10);
        }
    }

    #[test]
    fn test_oversized_segment_split_on_words() {
        let prose = "palabra ".repeat(200);
        let chunks = chunk_text(&prose, 50, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 50);
        }
    }

    #[test]
    fn test_later_chunks_start_on_a_word() {
        let chunks = chunk_text(&page(6), 80, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.text.starts_with(' '), "chunk {} starts with a space", chunk.index);
        }
    }

    /// One token per whitespace-separated word.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[test]
    fn test_budgets_follow_the_supplied_tokenizer() {
        let text = normalize_text(&page(6));
        let chunker = Chunker::with_tokenizer(WordCounter, ChunkerConfig::new(40, 0));
        let chunks = chunker.chunk_normalized(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.token_count, chunk.text.split_whitespace().count());
            assert!(chunk.token_count <= 40);
        }
        assert_eq!(reassemble(&text, &chunks), text);

        let heuristic = Chunker::new(ChunkerConfig::new(40, 0)).chunk_normalized(&text);
        assert_ne!(chunks.len(), heuristic.len());
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn test_chunks_with_bpe_tokenizer() {
        let bpe = crate::text::tokenizer::BpeTokenizer::cl100k().unwrap();
        let chunker = Chunker::with_tokenizer(bpe, ChunkerConfig::new(60, 0));
        let chunks = chunker.chunk(&page(6));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.token_count, chunker.tokenizer().count(&chunk.text));
        }
    }

    #[test]
    fn test_chunk_indices_are_sequential() {
        let chunks = chunk_text(&page(8), 60, 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(!chunk.is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_chunking_is_deterministic(
            listings in 1usize..8,
            max_tokens in 20usize..200,
            overlap in 0usize..30,
        ) {
            let text = page(listings);
            prop_assert_eq!(
                chunk_text(&text, max_tokens, overlap),
                chunk_text(&text, max_tokens, overlap)
            );
        }

        #[test]
        fn prop_chunks_cover_text(
            listings in 1usize..8,
            max_tokens in 20usize..200,
            overlap in 0usize..30,
        ) {
            let text = normalize_text(&page(listings));
            let chunks = Chunker::new(ChunkerConfig::new(max_tokens, overlap))
                .chunk_normalized(&text);
            prop_assert_eq!(chunks.first().map(|c| c.start), Some(0));
            prop_assert_eq!(chunks.last().map(|c| c.end), Some(text.len()));
            prop_assert_eq!(reassemble(&text, &chunks), text);
        }

        #[test]
        fn prop_chunks_respect_token_bound(
            words in proptest::collection::vec("[a-z]{1,12}|\\$[0-9]{2,6}|[0-9] bed\\.", 1..300),
            max_tokens in 10usize..120,
            overlap in 0usize..20,
        ) {
            let text = words.join(" ");
            let chunks = chunk_text(&text, max_tokens, overlap);
            for chunk in &chunks {
                prop_assert!(chunk.token_count <= max_tokens);
                prop_assert!(!chunk.text.trim().is_empty());
            }
        }
    }
}

/*!
 * Semantic chunking of long documents into model-sized segments.
 *
 * The chunker walks the document from left to right. At each step it looks at
 * the boundaries that fall inside the next `max_size` characters and cuts at
 * the best one, so chunks end on paragraph or sentence breaks whenever the
 * window allows it. The chunks always cover the whole text: concatenating
 * them in index order gives the input back byte for byte.
 */

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::boundary::{self, BoundaryCandidate};
use super::document::Chunk;

/// Configuration for the semantic chunker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Keep a word longer than the window whole instead of cutting it
    pub keep_words_whole: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { keep_words_whole: true }
    }
}

impl ChunkerConfig {
    /// Hard cuts instead of oversized chunks.
    pub fn strict() -> Self {
        Self {
            keep_words_whole: false,
        }
    }
}

/// Splits text into ordered, contiguous chunks.
#[derive(Debug, Clone, Default)]
pub struct SemanticChunker {
    config: ChunkerConfig,
}

impl SemanticChunker {
    /// Create a chunker with the given configuration
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Get the chunker configuration
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk `text` into pieces of at most `max_size` characters where possible.
    ///
    /// A `max_size` of zero is treated as one.
    pub fn chunk(&self, text: &str, max_size: usize) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let max_size = max_size.max(1);
        let len = text.len();
        let candidates = boundary::detect(text);

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut cursor = 0;

        while start < len {
            let limit = advance_chars(text, start, max_size);
            if limit >= len {
                chunks.push(Chunk::from_source(chunks.len(), text, start, len));
                break;
            }

            while cursor < candidates.len() && candidates[cursor].offset <= start {
                cursor += 1;
            }
            let window_len = candidates[cursor..]
                .iter()
                .take_while(|c| c.offset <= limit)
                .count();
            let window = &candidates[cursor..cursor + window_len];

            let end = match strongest(window.iter()) {
                Some(candidate) => candidate.offset,
                None if self.config.keep_words_whole => candidates
                    .get(cursor + window_len)
                    .map(|c| c.offset)
                    .unwrap_or(len),
                None => grapheme_cut(text, start, limit),
            };

            chunks.push(Chunk::from_source(chunks.len(), text, start, end));
            start = end;
        }

        chunks
    }

    /// Re-chunk a single chunk with a smaller size.
    ///
    /// Returned chunks are numbered from zero but keep document offsets.
    pub fn rechunk(&self, chunk: &Chunk, max_size: usize) -> Vec<Chunk> {
        self.chunk(&chunk.text, max_size)
            .into_iter()
            .map(|mut piece| {
                piece.start_offset += chunk.start_offset;
                piece.end_offset += chunk.start_offset;
                piece
            })
            .collect()
    }
}

/// Chunk `text` with the default configuration.
pub fn chunk(text: &str, max_size: usize) -> Vec<Chunk> {
    SemanticChunker::default().chunk(text, max_size)
}

/// Highest strength wins, the furthest offset breaks ties
fn strongest<'a>(
    candidates: impl Iterator<Item = &'a BoundaryCandidate>,
) -> Option<&'a BoundaryCandidate> {
    candidates.max_by_key(|c| (c.strength, c.offset))
}

/// Byte offset reached after moving `count` characters forward from `start`
fn advance_chars(text: &str, start: usize, count: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(count)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len())
}

/// Last grapheme boundary at or before `limit`, or the end of the first
/// grapheme when even that one does not fit.
fn grapheme_cut(text: &str, start: usize, limit: usize) -> usize {
    let mut cut = None;
    for (idx, grapheme) in text[start..].grapheme_indices(true) {
        let end = start + idx + grapheme.len();
        if end > limit {
            break;
        }
        cut = Some(end);
    }

    cut.unwrap_or_else(|| {
        text[start..]
            .graphemes(true)
            .next()
            .map(|g| start + g.len())
            .unwrap_or(text.len())
    })
}

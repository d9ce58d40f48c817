/*!
 * Request options and results of the adaptive pipeline.
 */

use serde::{Deserialize, Serialize};

use crate::translation::document::Chunk;
use crate::translation::quality::{Grade, QualityScore};

/// Per-request options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateOptions {
    /// Pin the chunk size (in chars) instead of selecting one
    pub chunk_size_hint: Option<usize>,

    /// Chunks graded below this are retried, then marked degraded
    pub min_quality: Grade,

    /// Deadline for the whole request
    pub max_latency_ms: Option<u64>,

    /// Ignore any cached result; a fresh result still refreshes the cache
    pub skip_cache: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            chunk_size_hint: None,
            min_quality: Grade::D,
            max_latency_ms: None,
            skip_cache: false,
        }
    }
}

impl TranslateOptions {
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size_hint = Some(size);
        self
    }

    pub fn with_min_quality(mut self, grade: Grade) -> Self {
        self.min_quality = grade;
        self
    }

    pub fn with_max_latency_ms(mut self, ms: u64) -> Self {
        self.max_latency_ms = Some(ms);
        self
    }

    pub fn skipping_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }
}

/// Best translation attempt for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// The source chunk
    pub chunk: Chunk,
    /// Translation, including the chunk's surrounding whitespace
    pub translated_text: String,
    /// Quality of this attempt
    pub quality: QualityScore,
    /// 1 for the first translation, 2 for the re-chunked retry
    pub attempt: u32,
    /// Whether the quality met the request's minimum
    pub accepted: bool,
}

/// Outcome of an adaptive translation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Assembled translation
    pub text: String,
    /// Best attempt per chunk, in index order
    pub chunk_results: Vec<ChunkResult>,
    /// Length-weighted quality of the whole translation
    pub overall_quality: QualityScore,
    /// At least one chunk stayed below the minimum quality
    pub degraded: bool,
    /// Chunk size (in chars) the document was cut with
    pub chunk_size: usize,
    /// Served from the cache
    pub from_cache: bool,
}

impl TranslationResult {
    /// Indices of chunks that stayed below the minimum quality
    pub fn degraded_chunks(&self) -> Vec<usize> {
        self.chunk_results
            .iter()
            .filter(|r| !r.accepted)
            .map(|r| r.chunk.index)
            .collect()
    }

    /// One-line description for logs and the CLI
    pub fn summary(&self) -> String {
        format!(
            "{} chunks of up to {} chars, {}{}{}",
            self.chunk_results.len(),
            self.chunk_size,
            self.overall_quality.summary(),
            if self.degraded { ", degraded" } else { "" },
            if self.from_cache { ", cached" } else { "" }
        )
    }
}

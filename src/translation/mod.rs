/*!
 * Adaptive segmentation and quality-optimized translation.
 *
 * It is split into several submodules:
 *
 * - `document`: source documents and the chunks cut from them
 * - `boundary`: ranked split points in a text
 * - `chunker`: boundary-aware chunking at a target size
 * - `quality`: multi-dimensional scoring of translated chunks
 * - `optimizer`: binary search for the best chunk size
 * - `retry`: bounded exponential backoff for backend calls
 * - `cache`: fingerprinted result cache with quality-aware TTLs
 * - `concurrency`: per-model-family defaults
 * - `pipeline`: the orchestrator tying everything together
 */

pub use self::chunker::{ChunkerConfig, SemanticChunker};
pub use self::document::{Chunk, SourceDocument};
pub use self::pipeline::{
    AdaptivePipeline, ChunkResult, PipelineConfig, PipelineState, TranslateOptions,
    TranslationResult,
};

pub mod boundary;
pub mod cache;
pub mod chunker;
pub mod concurrency;
pub mod document;
pub mod optimizer;
pub mod pipeline;
pub mod quality;
pub mod retry;

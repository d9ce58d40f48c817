/*!
 * Adaptive translation pipeline.
 *
 * - `orchestrator`: request lifecycle, retries and assembly
 * - `options`: per-request options and results
 * - `state`: lifecycle states and their transitions
 */

pub mod options;
pub mod orchestrator;
pub mod state;

pub use options::{ChunkResult, TranslateOptions, TranslationResult};
pub use orchestrator::{AdaptivePipeline, PipelineConfig};
pub use state::{PipelineState, StateTracker};

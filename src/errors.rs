/*!
 * Error types for the adaptrans pipeline.
 *
 * Backend failures are the only errors that can end a request. Everything
 * else (low quality, failed size search) degrades the result instead and is
 * reported through `TranslationResult::degraded` and per-chunk scores.
 */

use std::time::Duration;

use thiserror::Error;

use crate::translation::pipeline::PipelineState;

/// Errors raised by a translation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend could not be reached or refused the request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time
    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Both backend error kinds are transient and may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Unavailable(_) | BackendError::Timeout(_))
    }
}

/// Errors that end an adaptive translation request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A chunk could not be translated after the retry budget was spent
    #[error("Chunk {chunk_index} failed while {state}: {source}")]
    Backend {
        /// Index of the first chunk that failed
        chunk_index: usize,
        /// State the request was in when it failed
        state: PipelineState,
        /// Last backend error seen for that chunk
        #[source]
        source: BackendError,
    },

    /// The document-level deadline expired
    #[error("Document translation exceeded {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request
    #[error("Document translation cancelled")]
    Cancelled,

    /// The chunker could not make progress (never produced by the built-in chunker)
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// Configuration values that cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// The backend error behind this failure, if any
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            PipelineError::Backend { source, .. } => Some(source),
            _ => None,
        }
    }
}

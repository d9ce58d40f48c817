/*!
 * Model-family specific sizing and concurrency defaults.
 *
 * Seq2seq translation models have small context windows but answer fast and
 * handle many parallel requests; instruction LLMs take long inputs but are
 * slower and heavier per call.
 */

use std::time::Duration;

use crate::providers::ModelFamily;

/// Tuned defaults for a model family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendProfile {
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
    /// Largest chunk (in chars) the family handles reliably
    pub max_chunk_chars: usize,
    /// Per-call timeout
    pub call_timeout: Duration,
}

impl BackendProfile {
    /// Get the profile for a model family
    pub fn for_family(family: ModelFamily) -> Self {
        match family {
            ModelFamily::Seq2Seq => Self {
                max_concurrent_requests: 8,
                max_chunk_chars: 1_500,
                call_timeout: Duration::from_secs(30),
            },
            ModelFamily::InstructionLlm => Self {
                max_concurrent_requests: 4,
                max_chunk_chars: 8_000,
                call_timeout: Duration::from_secs(120),
            },
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override.unwrap_or(self.max_concurrent_requests).max(1)
    }

    /// Clamp an upper chunk-size bound to what the family handles
    pub fn clamp_max_size(&self, max_size: usize) -> usize {
        max_size.min(self.max_chunk_chars)
    }
}

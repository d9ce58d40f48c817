/*!
 * Lifecycle of an adaptive translation request.
 *
 * ```text
 * PENDING → CHUNKING → TRANSLATING → ASSESSING → ASSEMBLING → DONE
 *                          ↑              │
 *                          └── RETRYING ←─┘
 * ```
 *
 * A cache hit goes straight from PENDING to DONE. FAILED is reachable from
 * every non-terminal state.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a translation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Pending,
    Chunking,
    Translating,
    Assessing,
    Retrying,
    Assembling,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether the request is finished
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Pending, Chunking)
                | (Pending, Done)
                | (Chunking, Translating)
                | (Chunking, Assembling)
                | (Translating, Assessing)
                | (Assessing, Retrying)
                | (Assessing, Assembling)
                | (Retrying, Translating)
                | (Assembling, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Pending => "PENDING",
            PipelineState::Chunking => "CHUNKING",
            PipelineState::Translating => "TRANSLATING",
            PipelineState::Assessing => "ASSESSING",
            PipelineState::Retrying => "RETRYING",
            PipelineState::Assembling => "ASSEMBLING",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Records the states one request goes through
#[derive(Debug, Clone)]
pub struct StateTracker {
    request_id: String,
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl StateTracker {
    /// Start tracking a request in `PENDING`
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            current: PipelineState::Pending,
            history: vec![PipelineState::Pending],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to `next`.
    ///
    /// Transitions outside the lifecycle are logged and still applied so the
    /// history reflects what actually happened.
    pub fn advance(&mut self, next: PipelineState) {
        if !self.current.can_transition_to(next) {
            warn!(
                "[{}] Unexpected state transition {} -> {}",
                self.request_id, self.current, next
            );
        } else {
            debug!("[{}] {} -> {}", self.request_id, self.current, next);
        }
        self.current = next;
        self.history.push(next);
    }
}

/*!
 * Translation backends.
 *
 * The pipeline talks to models only through the `TranslationBackend` trait,
 * so the model family is a choice of implementation:
 * - Ollama: instruction-tuned LLM served by a local Ollama server
 * - Seq2Seq: dedicated translation model behind a small HTTP service
 * - Mock: scriptable in-process backend for tests and benches
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use crate::errors::BackendError;

/// Kind of model behind a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Dedicated encoder-decoder translation model, small context window
    Seq2Seq,
    /// General instruction-tuned LLM, large context window
    InstructionLlm,
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::Seq2Seq => write!(f, "seq2seq"),
            ModelFamily::InstructionLlm => write!(f, "instruction_llm"),
        }
    }
}

/// A model that translates text
///
/// Implementations must be safe to call concurrently; the pipeline bounds
/// how many calls are in flight.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate `text` from `source_lang` to `target_lang`
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, BackendError>;

    /// Identity of the model, part of every cache fingerprint
    fn model_id(&self) -> &str;

    /// Family of the model, used for default sizing and concurrency
    fn family(&self) -> ModelFamily;
}

pub mod mock;
pub mod ollama;
pub mod seq2seq;

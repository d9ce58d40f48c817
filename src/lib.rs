/*!
 * # adaptrans - adaptive chunked translation
 *
 * A library that translates arbitrarily long text through language models
 * with bounded context windows.
 *
 * ## Features
 *
 * - Semantic chunking that never splits inside a word or sentence when a
 *   better boundary is available
 * - Quality scoring of every translated chunk (fluency, accuracy and
 *   document-level consistency)
 * - Binary search for the chunk size that gives the best quality
 * - Concurrent translation with retries, degraded-result reporting and a
 *   fingerprinted result cache
 * - Backends for Ollama-style instruction LLMs and seq2seq translation servers
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: the adaptive pipeline and its building blocks
 * - `providers`: backend clients behind the `TranslationBackend` trait
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the library
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{BackendError, PipelineError};
pub use language_utils::{get_language_name, language_codes_match};
pub use providers::{ModelFamily, TranslationBackend};
pub use translation::{AdaptivePipeline, SourceDocument, TranslateOptions, TranslationResult};

/*!
 * Adaptive translation pipeline.
 *
 * The orchestrator turns one document into a series of backend calls:
 * 1. Cache lookup by fingerprint
 * 2. Chunk-size selection (pinned, single chunk, remembered or searched)
 * 3. Semantic chunking
 * 4. Concurrent translation, then assessment in document order
 * 5. One re-chunked retry for chunks below the minimum grade
 * 6. Assembly by index and a cache write with a quality-aware TTL
 *
 * Chunks that stay below the minimum keep their best attempt and mark the
 * result as degraded. Only backend errors that survive the retry policy,
 * the document deadline and cancellation end a request with an error.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::{self as std_future, Future};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::errors::{BackendError, PipelineError};
use crate::language_utils::canonical_code;
use crate::providers::TranslationBackend;
use crate::translation::cache::{Cache, CacheConfig, Fingerprint, InMemoryCache};
use crate::translation::chunker::{ChunkerConfig, SemanticChunker};
use crate::translation::concurrency::BackendProfile;
use crate::translation::document::{Chunk, SourceDocument};
use crate::translation::optimizer::{ChunkSizeOptimizer, OptimizerConfig};
use crate::translation::quality::{Glossary, Grade, QualityAssessor, QualityConfig, QualityScore, StyleProfile};
use crate::translation::retry::{RetryConfig, RetryPolicy};

use super::options::{ChunkResult, TranslateOptions, TranslationResult};
use super::state::{PipelineState, StateTracker};

/// Configuration for the adaptive pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Boundary selection
    #[serde(default)]
    pub chunker: ChunkerConfig,

    /// Score weights and grade bands
    #[serde(default)]
    pub quality: QualityConfig,

    /// Chunk-size search
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Backoff for transient backend errors
    #[serde(default)]
    pub retry: RetryConfig,

    /// Result cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Documents up to this many chars are translated as one chunk
    #[serde(default = "default_optimize_min_chars")]
    pub optimize_min_chars: usize,

    /// Override for the backend family's concurrency
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,

    /// Override for the backend family's per-call timeout
    #[serde(default)]
    pub call_timeout_secs: Option<u64>,
}

fn default_optimize_min_chars() -> usize {
    1_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            quality: QualityConfig::default(),
            optimizer: OptimizerConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            optimize_min_chars: default_optimize_min_chars(),
            max_concurrent_requests: None,
            call_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Check values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.quality.grades.is_valid() {
            return Err(PipelineError::InvalidConfig(
                "Grade thresholds must be in [0, 1] and descend from A to D".to_string(),
            ));
        }

        let weights = self.quality.weights;
        if weights.fluency < 0.0 || weights.accuracy < 0.0 || weights.consistency < 0.0 {
            return Err(PipelineError::InvalidConfig("Quality weights must not be negative".to_string()));
        }

        if self.optimizer.min_size == 0 || self.optimizer.min_size > self.optimizer.max_size {
            return Err(PipelineError::InvalidConfig(format!(
                "Optimizer bounds [{}, {}] are not a valid size range",
                self.optimizer.min_size, self.optimizer.max_size
            )));
        }

        if !(0.0..=1.0).contains(&self.optimizer.target_quality) {
            return Err(PipelineError::InvalidConfig(format!(
                "Optimizer target quality {} is outside [0, 1]",
                self.optimizer.target_quality
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(PipelineError::InvalidConfig("Retry attempts must be at least 1".to_string()));
        }

        if self.max_concurrent_requests == Some(0) {
            return Err(PipelineError::InvalidConfig("Concurrency must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Key of the remembered chunk sizes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SizeKey {
    model_id: String,
    source_lang: String,
    target_lang: String,
}

impl SizeKey {
    fn new(model_id: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            source_lang: canonical_code(source_lang),
            target_lang: canonical_code(target_lang),
        }
    }
}

/// Drives adaptive translation requests against one backend.
///
/// One pipeline is meant to be shared by every request for its backend:
/// the admission semaphore, the cache and the remembered chunk sizes are
/// all pipeline-wide.
pub struct AdaptivePipeline {
    backend: Arc<dyn TranslationBackend>,
    cache: Option<Arc<dyn Cache>>,
    config: PipelineConfig,
    profile: BackendProfile,
    concurrency: usize,
    semaphore: Arc<Semaphore>,
    chunker: SemanticChunker,
    assessor: QualityAssessor,
    optimizer: ChunkSizeOptimizer,
    retry: RetryPolicy,
    glossary: Glossary,
    sizes: RwLock<HashMap<SizeKey, usize>>,
}

impl AdaptivePipeline {
    /// Create a pipeline with an in-memory cache when caching is enabled.
    pub fn new(backend: Arc<dyn TranslationBackend>, config: PipelineConfig) -> Self {
        let profile = BackendProfile::for_family(backend.family());
        let concurrency = profile.effective_concurrent_requests(config.max_concurrent_requests);
        let chunker = SemanticChunker::new(config.chunker.clone());
        let assessor = QualityAssessor::new(config.quality);
        let optimizer = ChunkSizeOptimizer::new(config.optimizer.clone(), chunker.clone(), assessor.clone());

        let cache: Option<Arc<dyn Cache>> = if config.cache.enabled {
            Some(Arc::new(InMemoryCache::new(config.cache.max_entries)))
        } else {
            None
        };

        info!(
            "Adaptive pipeline for {} ({}) with {} concurrent requests",
            backend.model_id(),
            backend.family(),
            concurrency
        );

        Self {
            retry: RetryPolicy::from(&config.retry),
            backend,
            cache,
            profile,
            concurrency,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            chunker,
            assessor,
            optimizer,
            glossary: Glossary::new(),
            sizes: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Use `cache` instead of the built-in one
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disable caching
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Seed every request's style profile with `glossary`
    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn TranslationBackend> {
        &self.backend
    }

    /// Maximum number of backend calls in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Chunk size committed for a language pair on this backend, if any
    pub fn remembered_size(&self, source_lang: &str, target_lang: &str) -> Option<usize> {
        let key = SizeKey::new(self.backend.model_id(), source_lang, target_lang);
        self.sizes.read().get(&key).copied()
    }

    /// Forget every committed chunk size
    pub fn forget_sizes(&self) {
        self.sizes.write().clear();
    }

    /// Translate `document`.
    pub async fn translate_adaptive(
        &self,
        document: &SourceDocument,
        options: TranslateOptions,
    ) -> Result<TranslationResult, PipelineError> {
        self.translate_adaptive_until(document, options, std_future::pending())
            .await
    }

    /// Translate `document`, giving up when `shutdown` completes.
    ///
    /// Cancellation and the document deadline drop every in-flight backend
    /// call; nothing is cached for an abandoned request.
    pub async fn translate_adaptive_until<S>(
        &self,
        document: &SourceDocument,
        options: TranslateOptions,
        shutdown: S,
    ) -> Result<TranslationResult, PipelineError>
    where
        S: Future<Output = ()>,
    {
        let request_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        let deadline = options.max_latency_ms.map(Duration::from_millis);

        let deadline_timer = async {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std_future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = self.run(&request_id, document, &options, deadline) => result,
            _ = deadline_timer => {
                let limit = deadline.unwrap_or_default();
                warn!("[{}] {} after {:?}", request_id, PipelineState::Failed, limit);
                Err(PipelineError::Timeout(limit))
            }
            _ = shutdown => {
                warn!("[{}] {} on cancellation", request_id, PipelineState::Failed);
                Err(PipelineError::Cancelled)
            }
        }
    }

    async fn run(
        &self,
        request_id: &str,
        document: &SourceDocument,
        options: &TranslateOptions,
        deadline: Option<Duration>,
    ) -> Result<TranslationResult, PipelineError> {
        let mut tracker = StateTracker::new(request_id);
        let fingerprint = Fingerprint::compute(
            document.text(),
            document.source_lang(),
            document.target_lang(),
            self.backend.model_id(),
        );

        if let Some(cache) = &self.cache {
            if options.skip_cache {
                debug!("[{}] Cache lookup skipped", request_id);
            } else if let Some(mut cached) = cache.get(&fingerprint).await {
                tracker.advance(PipelineState::Done);
                cached.from_cache = true;
                info!("[{}] Served from cache: {}", request_id, cached.summary());
                return Ok(cached);
            }
        }

        let call_timeout = self.call_timeout(deadline);

        tracker.advance(PipelineState::Chunking);
        let chunk_size = self.select_chunk_size(request_id, document, options, call_timeout).await;
        let chunks = self.chunker.chunk(document.text(), chunk_size);
        debug!(
            "[{}] {} chars cut into {} chunks of up to {} chars",
            request_id,
            document.char_len(),
            chunks.len(),
            chunk_size
        );

        let mut results = Vec::with_capacity(chunks.len());
        if !chunks.is_empty() {
            tracker.advance(PipelineState::Translating);
            let translations = self.translate_chunks(&chunks, document, call_timeout).await;

            let mut translated = Vec::with_capacity(chunks.len());
            for (chunk, outcome) in chunks.iter().zip(translations) {
                match outcome {
                    Ok(text) => translated.push(text),
                    Err(source) => return Err(fail(&mut tracker, chunk.index, source)),
                }
            }

            tracker.advance(PipelineState::Assessing);
            let mut profile = StyleProfile::with_glossary(self.glossary.clone());
            for (chunk, text) in chunks.iter().zip(translated) {
                let quality = self.score(chunk, &text, document, &mut profile);
                results.push(ChunkResult {
                    chunk: chunk.clone(),
                    translated_text: text,
                    quality,
                    attempt: 1,
                    accepted: quality.meets(options.min_quality),
                });
            }

            let failing: Vec<usize> = results
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.accepted)
                .map(|(position, _)| position)
                .collect();

            if !failing.is_empty() {
                tracker.advance(PipelineState::Retrying);
                info!(
                    "[{}] {} chunks below grade {}, retrying with a smaller split",
                    request_id,
                    failing.len(),
                    options.min_quality
                );
                tracker.advance(PipelineState::Translating);
                self.retry_chunks(&mut results, &failing, document, &profile, options.min_quality, call_timeout)
                    .await;
                tracker.advance(PipelineState::Assessing);
            }
        }

        tracker.advance(PipelineState::Assembling);
        let result = self.assemble(results, chunk_size);
        if result.degraded {
            warn!(
                "[{}] Chunks {:?} stayed below grade {}",
                request_id,
                result.degraded_chunks(),
                options.min_quality
            );
        }
        tracker.advance(PipelineState::Done);

        if let Some(cache) = &self.cache {
            let ttl = self
                .config
                .cache
                .ttl
                .ttl_for(result.overall_quality.grade, result.degraded);
            cache.put(fingerprint, result.clone(), ttl).await;
        }

        info!("[{}] {}", request_id, result.summary());
        Ok(result)
    }

    /// Per-call timeout.
    ///
    /// Under a document deadline one attempt gets at most
    /// `deadline / (max_attempts + 1)`, leaving room for the retries and
    /// their backoff.
    fn call_timeout(&self, deadline: Option<Duration>) -> Duration {
        let timeout = self
            .config
            .call_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.profile.call_timeout);

        match deadline {
            Some(limit) => {
                let share = limit / (self.retry.max_attempts() + 1);
                timeout.min(share.max(Duration::from_millis(1)))
            }
            None => timeout,
        }
    }

    async fn select_chunk_size(
        &self,
        request_id: &str,
        document: &SourceDocument,
        options: &TranslateOptions,
        call_timeout: Duration,
    ) -> usize {
        if let Some(hint) = options.chunk_size_hint {
            return hint.max(1);
        }

        let length = document.char_len();
        if length <= self.config.optimize_min_chars {
            return length.max(1);
        }

        let key = SizeKey::new(self.backend.model_id(), document.source_lang(), document.target_lang());
        let remembered = self.sizes.read().get(&key).copied();
        if let Some(size) = remembered {
            debug!("[{}] Reusing chunk size {} for {}->{}", request_id, size, key.source_lang, key.target_lang);
            return size;
        }

        let max_size = self.profile.clamp_max_size(self.config.optimizer.max_size).max(1);
        let min_size = self.config.optimizer.min_size.min(max_size).max(1);
        let outcome = self
            .optimizer
            .optimize_within(
                document,
                (min_size, max_size),
                self.config.optimizer.target_quality,
                self.backend.as_ref(),
                &self.semaphore,
                call_timeout,
            )
            .await;

        if !outcome.exploratory_failed {
            self.sizes.write().insert(key, outcome.size);
        }
        outcome.size
    }

    /// Translate `chunks` concurrently; results come back in input order.
    async fn translate_chunks(
        &self,
        chunks: &[Chunk],
        document: &SourceDocument,
        call_timeout: Duration,
    ) -> Vec<Result<String, BackendError>> {
        let mut outcomes = stream::iter(chunks.iter().enumerate())
            .map(|(position, chunk)| async move {
                (position, self.translate_chunk(chunk, document, call_timeout).await)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        outcomes.sort_by_key(|(position, _)| *position);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Translate one chunk, carrying its surrounding whitespace over when the model drops it.
    async fn translate_chunk(
        &self,
        chunk: &Chunk,
        document: &SourceDocument,
        call_timeout: Duration,
    ) -> Result<String, BackendError> {
        let (leading, core, trailing) = chunk.padding();
        if core.is_empty() {
            return Ok(chunk.text.clone());
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| BackendError::Unavailable("Admission semaphore closed".to_string()))?;

        let translated = self
            .retry
            .run(call_timeout, |_| {
                self.backend
                    .translate(core, document.source_lang(), document.target_lang())
            })
            .await?;

        // Model output is kept as is; source padding fills in only where the model dropped it
        let leading = if translated.starts_with(char::is_whitespace) { "" } else { leading };
        let trailing = if translated.ends_with(char::is_whitespace) { "" } else { trailing };
        Ok(format!("{}{}{}", leading, translated, trailing))
    }

    fn score(
        &self,
        chunk: &Chunk,
        translated: &str,
        document: &SourceDocument,
        profile: &mut StyleProfile,
    ) -> QualityScore {
        if chunk.is_blank() {
            return QualityScore::perfect();
        }
        self.assessor.assess_in_context(
            &chunk.text,
            translated,
            document.source_lang(),
            document.target_lang(),
            profile,
        )
    }

    /// Retry the chunks at `failing` once, each split at half its length.
    ///
    /// A retry replaces the first attempt only when it scores higher. A
    /// chunk whose retry hits a backend error keeps its first attempt.
    async fn retry_chunks(
        &self,
        results: &mut [ChunkResult],
        failing: &[usize],
        document: &SourceDocument,
        profile: &StyleProfile,
        min_quality: Grade,
        call_timeout: Duration,
    ) {
        let mut pieces = Vec::new();
        let mut owners = Vec::new();
        for &position in failing {
            let chunk = &results[position].chunk;
            let local_size = (chunk.char_len() / 2).max(1);
            for piece in self.chunker.rechunk(chunk, local_size) {
                pieces.push(piece);
                owners.push(position);
            }
        }

        let translations = self.translate_chunks(&pieces, document, call_timeout).await;

        let mut retried: HashMap<usize, Result<String, BackendError>> = HashMap::new();
        for (owner, outcome) in owners.into_iter().zip(translations) {
            let entry = retried.entry(owner).or_insert_with(|| Ok(String::new()));
            if let Ok(text) = entry {
                match outcome {
                    Ok(piece) => text.push_str(&piece),
                    Err(e) => *entry = Err(e),
                }
            }
        }

        for &position in failing {
            let current = &mut results[position];
            match retried.remove(&position) {
                Some(Ok(text)) => {
                    let (quality, report) = self.assessor.assess_with_report(
                        &current.chunk.text,
                        &text,
                        document.source_lang(),
                        document.target_lang(),
                        profile,
                    );
                    debug!(
                        "Chunk {} retry scored {:.3} (first attempt {:.3})",
                        current.chunk.index, quality.overall, current.quality.overall
                    );
                    if !quality.meets(min_quality) {
                        debug!(
                            "Chunk {} still below {}, weakest dimension {}. {}",
                            current.chunk.index,
                            min_quality,
                            quality.weakest_dimension(),
                            report.map(|r| r.summary()).unwrap_or_else(|| "Empty output".to_string())
                        );
                    }
                    if quality.overall > current.quality.overall {
                        *current = ChunkResult {
                            chunk: current.chunk.clone(),
                            translated_text: text,
                            quality,
                            attempt: 2,
                            accepted: quality.meets(min_quality),
                        };
                    }
                }
                Some(Err(e)) => {
                    warn!(
                        "Retry of chunk {} failed, keeping the first attempt: {}",
                        current.chunk.index, e
                    );
                }
                None => {}
            }
        }
    }

    fn assemble(&self, results: Vec<ChunkResult>, chunk_size: usize) -> TranslationResult {
        let text: String = results.iter().map(|r| r.translated_text.as_str()).collect();

        let weighted: Vec<(QualityScore, usize)> = results
            .iter()
            .filter(|r| !r.chunk.is_blank())
            .map(|r| (r.quality, r.chunk.char_len()))
            .collect();
        let overall_quality = QualityScore::weighted_average(&weighted, self.assessor.config());

        TranslationResult {
            text,
            degraded: results.iter().any(|r| !r.accepted),
            chunk_results: results,
            overall_quality,
            chunk_size,
            from_cache: false,
        }
    }
}

/// Move the request to FAILED and build the error for `chunk_index`.
fn fail(tracker: &mut StateTracker, chunk_index: usize, source: BackendError) -> PipelineError {
    let state = tracker.current();
    tracker.advance(PipelineState::Failed);
    PipelineError::Backend {
        chunk_index,
        state,
        source,
    }
}

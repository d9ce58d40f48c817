/*!
 * Chunk-size search.
 *
 * Bigger chunks give the model more context and cost fewer calls, but past
 * some size a model starts to drop or garble content. The optimizer runs a
 * bounded binary search over the chunk size: each probe cuts a prefix of the
 * document at the candidate size, translates the first few chunks and
 * scores them. A probe that reaches the target quality moves the lower bound
 * up, anything else moves the upper bound down.
 *
 * The search never fails. When no probe produces a usable translation the
 * smallest size is returned and the outcome is flagged as exploratory.
 */

use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::errors::BackendError;
use crate::providers::TranslationBackend;
use crate::translation::chunker::SemanticChunker;
use crate::translation::document::{Chunk, SourceDocument};
use crate::translation::quality::{QualityAssessor, QualityScore, StyleProfile};
use crate::translation::retry::RetryPolicy;

/// Search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Smallest chunk size considered (chars)
    pub min_size: usize,
    /// Largest chunk size considered (chars)
    pub max_size: usize,
    /// Stop once the search interval is this narrow
    pub resolution: usize,
    /// Upper bound on the number of probes
    pub max_probes: usize,
    /// Chunks translated per probe
    pub probe_chunks: usize,
    /// Probe score that counts as good enough
    pub target_quality: f32,
    /// Below this score a probe is considered unusable
    pub viability_threshold: f32,
    /// Wall-time budget of one probe; slower probes count as misses
    pub probe_latency_budget_ms: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_size: 200,
            max_size: 4_000,
            resolution: 100,
            max_probes: 10,
            probe_chunks: 3,
            target_quality: 0.8,
            viability_threshold: 0.3,
            probe_latency_budget_ms: None,
        }
    }
}

/// One probe of the search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeRecord {
    /// Chunk size probed
    pub size: usize,
    /// Length-weighted overall quality of the probe
    pub score: f32,
    /// Wall time of the probe
    pub elapsed: Duration,
    /// The probe exceeded its latency budget
    pub over_budget: bool,
}

impl ProbeRecord {
    /// Whether the probe may be selected as the answer
    fn is_eligible(&self) -> bool {
        !self.over_budget
    }
}

/// Working state of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationState {
    pub low: usize,
    pub high: usize,
    pub best_size: Option<usize>,
    pub best_score: f32,
    pub history: Vec<ProbeRecord>,
}

impl OptimizationState {
    pub fn new(low: usize, high: usize) -> Self {
        Self {
            low,
            high,
            best_size: None,
            best_score: 0.0,
            history: Vec::new(),
        }
    }

    /// Next size to probe
    pub fn midpoint(&self) -> usize {
        self.low + (self.high - self.low) / 2
    }

    /// Whether the interval is narrower than `resolution`
    pub fn is_converged(&self, resolution: usize) -> bool {
        self.high - self.low <= resolution
    }

    /// Record a probe and narrow the interval.
    ///
    /// The best probe is the highest scoring eligible one; ties go to the
    /// larger size.
    pub fn record(&mut self, probe: ProbeRecord, target_quality: f32) {
        let hit = probe.is_eligible() && probe.score >= target_quality;
        if hit {
            self.low = probe.size;
        } else {
            self.high = probe.size;
        }

        if probe.is_eligible() {
            let better = match self.best_size {
                None => true,
                Some(best) => {
                    probe.score > self.best_score + f32::EPSILON
                        || ((probe.score - self.best_score).abs() <= f32::EPSILON && probe.size > best)
                }
            };
            if better {
                self.best_size = Some(probe.size);
                self.best_score = probe.score;
            }
        }

        self.history.push(probe);
    }
}

/// Result of a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationOutcome {
    /// Size to commit to
    pub size: usize,
    /// Score of the chosen probe (0.0 when none was usable)
    pub score: f32,
    /// No probe reached the viability threshold; `size` is the minimum
    pub exploratory_failed: bool,
    /// Every probe, in order
    pub history: Vec<ProbeRecord>,
}

impl OptimizationOutcome {
    pub fn probes(&self) -> usize {
        self.history.len()
    }
}

/// Searches for the chunk size with the best translation quality
#[derive(Debug, Clone)]
pub struct ChunkSizeOptimizer {
    config: OptimizerConfig,
    chunker: SemanticChunker,
    assessor: QualityAssessor,
}

impl ChunkSizeOptimizer {
    pub fn new(config: OptimizerConfig, chunker: SemanticChunker, assessor: QualityAssessor) -> Self {
        Self {
            config,
            chunker,
            assessor,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Search within the configured bounds and target quality
    pub async fn optimize(
        &self,
        document: &SourceDocument,
        backend: &dyn TranslationBackend,
        semaphore: &Semaphore,
        call_timeout: Duration,
    ) -> OptimizationOutcome {
        self.optimize_within(
            document,
            (self.config.min_size, self.config.max_size),
            self.config.target_quality,
            backend,
            semaphore,
            call_timeout,
        )
        .await
    }

    /// Search within `size_bounds` for a probe reaching `target_quality`.
    ///
    /// Probes run one after another; the chunks of one probe are translated
    /// concurrently, each call holding a permit of `semaphore`.
    pub async fn optimize_within(
        &self,
        document: &SourceDocument,
        size_bounds: (usize, usize),
        target_quality: f32,
        backend: &dyn TranslationBackend,
        semaphore: &Semaphore,
        call_timeout: Duration,
    ) -> OptimizationOutcome {
        let min_size = size_bounds.0.min(size_bounds.1).max(1);
        let max_size = size_bounds.0.max(size_bounds.1).max(1);
        let resolution = self.config.resolution.max(1);

        let mut state = OptimizationState::new(min_size, max_size);

        if document.text().trim().is_empty() {
            return OptimizationOutcome {
                size: min_size,
                score: 0.0,
                exploratory_failed: false,
                history: Vec::new(),
            };
        }

        while state.history.len() < self.config.max_probes && !state.is_converged(resolution) {
            let size = state.midpoint();
            let probe = self.probe(document, size, backend, semaphore, call_timeout).await;
            debug!(
                "Probe at {} chars scored {:.3} in {:?}{}",
                probe.size,
                probe.score,
                probe.elapsed,
                if probe.over_budget { " (over budget)" } else { "" }
            );
            state.record(probe, target_quality);
        }

        let viable = state.best_size.is_some() && state.best_score >= self.config.viability_threshold;
        let outcome = match state.best_size {
            Some(size) if viable => OptimizationOutcome {
                size,
                score: state.best_score,
                exploratory_failed: false,
                history: state.history,
            },
            _ => {
                warn!(
                    "No chunk size produced a usable translation after {} probes, falling back to {} chars",
                    state.history.len(),
                    min_size
                );
                OptimizationOutcome {
                    size: min_size,
                    score: 0.0,
                    exploratory_failed: true,
                    history: state.history,
                }
            }
        };

        info!(
            "Chunk size search settled on {} chars (score {:.2}) after {} probes",
            outcome.size,
            outcome.score,
            outcome.probes()
        );
        outcome
    }

    async fn probe(
        &self,
        document: &SourceDocument,
        size: usize,
        backend: &dyn TranslationBackend,
        semaphore: &Semaphore,
        call_timeout: Duration,
    ) -> ProbeRecord {
        let started = Instant::now();
        let probe_chunks = self.config.probe_chunks.max(1);
        let sample = prefix_chars(document.text(), size.saturating_mul(probe_chunks));

        let chunks: Vec<Chunk> = self
            .chunker
            .chunk(sample, size)
            .into_iter()
            .take(probe_chunks)
            .collect();

        let source_lang = document.source_lang();
        let target_lang = document.target_lang();

        let translations = join_all(chunks.iter().map(|chunk| async move {
            if chunk.is_blank() {
                return Ok(chunk.text.clone());
            }
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| BackendError::Unavailable("Admission semaphore closed".to_string()))?;
            RetryPolicy::none()
                .run(call_timeout, |_| backend.translate(chunk.text.trim(), source_lang, target_lang))
                .await
        }))
        .await;

        let mut profile = StyleProfile::new();
        let mut scores = Vec::with_capacity(chunks.len());
        for (chunk, translation) in chunks.iter().zip(translations) {
            let score = match translation {
                _ if chunk.is_blank() => QualityScore::perfect(),
                Ok(text) => self.assessor.assess_in_context(
                    &chunk.text,
                    &text,
                    source_lang,
                    target_lang,
                    &mut profile,
                ),
                Err(e) => {
                    debug!("Probe chunk {} failed: {}", chunk.index, e);
                    QualityScore::zero()
                }
            };
            scores.push((score, chunk.char_len()));
        }

        let score = if scores.is_empty() {
            0.0
        } else {
            QualityScore::weighted_average(&scores, self.assessor.config()).overall
        };

        let elapsed = started.elapsed();
        let over_budget = self
            .config
            .probe_latency_budget_ms
            .is_some_and(|budget| elapsed > Duration::from_millis(budget));

        ProbeRecord {
            size,
            score,
            elapsed,
            over_budget,
        }
    }
}

/// Longest prefix of `text` with at most `chars` characters
fn prefix_chars(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

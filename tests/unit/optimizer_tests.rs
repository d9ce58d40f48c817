/*!
 * Tests for the chunk-size search
 */

use std::time::Duration;
use tokio::sync::Semaphore;

use adaptrans::providers::mock::MockBackend;
use adaptrans::translation::chunker::SemanticChunker;
use adaptrans::translation::optimizer::{ChunkSizeOptimizer, OptimizerConfig};
use adaptrans::translation::quality::QualityAssessor;

use crate::common::{document, sample_text};

const CALL_TIMEOUT: Duration = Duration::from_secs(10);

fn optimizer(config: OptimizerConfig) -> ChunkSizeOptimizer {
    ChunkSizeOptimizer::new(config, SemanticChunker::default(), QualityAssessor::default())
}

/// A wide range is searched in a logarithmic number of probes
#[tokio::test]
async fn test_optimize_withWideBounds_shouldStayWithinProbeBound() {
    let optimizer = optimizer(OptimizerConfig {
        min_size: 100,
        max_size: 10_000,
        resolution: 100,
        max_probes: 50,
        ..OptimizerConfig::default()
    });
    let backend = MockBackend::working();
    let semaphore = Semaphore::new(4);

    let outcome = optimizer
        .optimize(&document(sample_text(40_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    // ceil(log2((10000 - 100) / 100)) = 7
    assert!(outcome.probes() <= 8, "took {} probes", outcome.probes());
    assert!(!outcome.exploratory_failed);
    assert!(outcome.score >= 0.8);
    assert!((100..=10_000).contains(&outcome.size));
    assert!(outcome.history.iter().all(|p| (100..=10_000).contains(&p.size)));
}

/// The probe budget is a hard cap
#[tokio::test]
async fn test_optimize_withFewProbes_shouldStopAtMaxProbes() {
    let optimizer = optimizer(OptimizerConfig {
        max_probes: 3,
        ..OptimizerConfig::default()
    });
    let backend = MockBackend::working();
    let semaphore = Semaphore::new(4);

    let outcome = optimizer
        .optimize(&document(sample_text(20_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    assert_eq!(outcome.probes(), 3);
    assert!(backend.request_count() <= 3 * optimizer.config().probe_chunks);
}

/// Sizes at which the model stops translating are avoided
#[tokio::test]
async fn test_optimize_withModelFailingOnLongInput_shouldSettleBelowIt() {
    let optimizer = optimizer(OptimizerConfig {
        min_size: 200,
        max_size: 4_000,
        ..OptimizerConfig::default()
    });
    // Long inputs come back untranslated
    let backend = MockBackend::working().with_script(|request| {
        if request.text.chars().count() > 600 {
            Some(Ok(request.text.clone()))
        } else {
            None
        }
    });
    let semaphore = Semaphore::new(4);

    let outcome = optimizer
        .optimize(&document(sample_text(20_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    assert!(!outcome.exploratory_failed);
    assert!(outcome.score >= 0.8, "best score {}", outcome.score);
    assert!(outcome.size < 1_150, "settled on {}", outcome.size);
    for probe in outcome.history.iter().filter(|p| p.size >= 1_150) {
        assert!(probe.score < 0.8, "probe at {} scored {}", probe.size, probe.score);
    }
}

/// Nothing usable falls back to the minimum size
#[tokio::test]
async fn test_optimize_withEmptyTranslations_shouldFallBackToMinSize() {
    let optimizer = optimizer(OptimizerConfig::default());
    let backend = MockBackend::empty();
    let semaphore = Semaphore::new(4);

    let outcome = optimizer
        .optimize(&document(sample_text(10_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    assert!(outcome.exploratory_failed);
    assert_eq!(outcome.size, 200);
    assert!(outcome.probes() > 0);
}

/// Backend errors score zero instead of aborting the search
#[tokio::test(start_paused = true)]
async fn test_optimize_withFailingBackend_shouldNotRaise() {
    let optimizer = optimizer(OptimizerConfig::default());
    let backend = MockBackend::failing();
    let semaphore = Semaphore::new(4);

    let outcome = optimizer
        .optimize(&document(sample_text(10_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    assert!(outcome.exploratory_failed);
    assert!(outcome.history.iter().all(|p| p.score == 0.0));
}

/// Probes slower than the budget count as misses
#[tokio::test(start_paused = true)]
async fn test_optimize_withSlowProbes_shouldTreatThemAsMisses() {
    let optimizer = optimizer(OptimizerConfig {
        probe_latency_budget_ms: Some(100),
        ..OptimizerConfig::default()
    });
    let backend = MockBackend::slow(500);
    let semaphore = Semaphore::new(4);

    let outcome = optimizer
        .optimize(&document(sample_text(10_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    assert!(outcome.history.iter().all(|p| p.over_budget));
    assert!(outcome.exploratory_failed);
    assert_eq!(outcome.size, 200);
}

/// Probes never run more calls at once than the semaphore allows
#[tokio::test(start_paused = true)]
async fn test_optimize_shouldRespectSemaphore() {
    let optimizer = optimizer(OptimizerConfig {
        probe_chunks: 6,
        ..OptimizerConfig::default()
    });
    let backend = MockBackend::slow(20);
    let semaphore = Semaphore::new(2);

    optimizer
        .optimize(&document(sample_text(30_000)), &backend, &semaphore, CALL_TIMEOUT)
        .await;

    assert!(backend.max_in_flight() <= 2);
}

/*!
 * Failure handling: backend errors, deadlines, cancellation and bad settings
 */

use std::sync::Arc;
use std::time::Duration;

use adaptrans::errors::{BackendError, PipelineError};
use adaptrans::providers::mock::{MockBackend, pseudo_translate};
use adaptrans::translation::cache::InMemoryCache;
use adaptrans::translation::pipeline::{PipelineConfig, PipelineState};
use adaptrans::translation::quality::Grade;
use adaptrans::translation::{ChunkerConfig, SemanticChunker};
use adaptrans::{AdaptivePipeline, TranslateOptions};

use crate::common::document;

const TEXT: &str = "The quarterly report is finished. Every department sent its numbers on time.";

/// A backend that never answers fails the request after the retry budget
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_withFailingBackend_shouldReturnBackendError() {
    let backend = MockBackend::failing();
    let cache = Arc::new(InMemoryCache::default());
    let pipeline =
        AdaptivePipeline::new(Arc::new(backend.clone()), PipelineConfig::default()).with_cache(cache.clone());

    let err = pipeline
        .translate_adaptive(&document(TEXT), TranslateOptions::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Backend {
            chunk_index,
            state,
            source,
        } => {
            assert_eq!(chunk_index, 0);
            assert_eq!(state, PipelineState::Translating);
            assert!(matches!(source, BackendError::Unavailable(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(backend.request_count(), 3);
    assert!(cache.is_empty());
}

/// The error names the first chunk that could not be translated
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_withOneFailingChunk_shouldReportItsIndex() {
    let text = "Opening lines stay calm.\n\nBroken words start here.\n\nClosing lines stay calm.";
    let size = 30;
    let expected = SemanticChunker::new(ChunkerConfig::default())
        .chunk(text, size)
        .into_iter()
        .find(|chunk| chunk.text.contains("Broken"))
        .map(|chunk| chunk.index)
        .unwrap();

    let backend = MockBackend::working().with_script(|request| {
        request
            .text
            .contains("Broken")
            .then(|| Err(BackendError::Unavailable("refused".to_string())))
    });
    let pipeline = AdaptivePipeline::new(Arc::new(backend), PipelineConfig::default());

    let err = pipeline
        .translate_adaptive(&document(text), TranslateOptions::default().with_chunk_size(size))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Backend { chunk_index, .. } if chunk_index == expected));
    assert!(err.backend_error().is_some());
}

/// Transient failures are absorbed by the retry policy
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_withTransientFailures_shouldRecover() {
    let backend = MockBackend::working().with_script(|request| {
        (request.sequence < 2).then(|| Err(BackendError::Unavailable("warming up".to_string())))
    });
    let pipeline = AdaptivePipeline::new(Arc::new(backend.clone()), PipelineConfig::default());

    let result = pipeline
        .translate_adaptive(&document(TEXT), TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(backend.request_count(), 3);
    assert_eq!(result.text, pseudo_translate(TEXT));
}

/// Every third call failing still completes a multi-chunk document
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_withIntermittentBackend_shouldComplete() {
    let backend = MockBackend::intermittent(3);
    let config = PipelineConfig {
        max_concurrent_requests: Some(1),
        ..PipelineConfig::default()
    };
    let pipeline = AdaptivePipeline::new(Arc::new(backend.clone()), config);
    let text = "First part of the text.\n\nSecond part of the text.\n\nThird part of the text.";

    let result = pipeline
        .translate_adaptive(
            &document(text),
            TranslateOptions::default()
                .with_chunk_size(30)
                .with_min_quality(Grade::F),
        )
        .await
        .unwrap();

    assert_eq!(result.text, pseudo_translate(text));
    assert!(backend.request_count() > result.chunk_results.len());
}

/// The document deadline ends the request with a timeout
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_pastDeadline_shouldTimeOut() {
    let backend = MockBackend::slow(5_000);
    let pipeline = AdaptivePipeline::new(Arc::new(backend), PipelineConfig::default());

    let err = pipeline
        .translate_adaptive(&document(TEXT), TranslateOptions::default().with_max_latency_ms(100))
        .await
        .unwrap_err();

    assert_eq!(err, PipelineError::Timeout(Duration::from_millis(100)));
}

/// Completing the shutdown future cancels the request
#[tokio::test(start_paused = true)]
async fn test_translateAdaptiveUntil_onShutdown_shouldCancel() {
    let backend = MockBackend::slow(5_000);
    let cache = Arc::new(InMemoryCache::default());
    let pipeline = AdaptivePipeline::new(Arc::new(backend), PipelineConfig::default()).with_cache(cache.clone());

    let err = pipeline
        .translate_adaptive_until(
            &document(TEXT),
            TranslateOptions::default(),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert_eq!(err, PipelineError::Cancelled);
    assert!(cache.is_empty());
}

/// Settings the pipeline cannot work with are rejected
#[test]
fn test_pipelineConfig_withInvalidValues_shouldBeRejected() {
    let mut config = PipelineConfig::default();
    config.optimizer.min_size = 0;
    assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));

    let mut config = PipelineConfig::default();
    config.retry.max_attempts = 0;
    assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));

    let mut config = PipelineConfig::default();
    config.max_concurrent_requests = Some(0);
    assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));

    let mut config = PipelineConfig::default();
    config.quality.grades.a = 1.5;
    assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
}

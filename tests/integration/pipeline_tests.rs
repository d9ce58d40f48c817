/*!
 * End-to-end tests of the adaptive pipeline against mock backends
 */

use std::sync::Arc;
use std::time::Duration;

use adaptrans::providers::mock::{MockBackend, pseudo_translate};
use adaptrans::translation::cache::InMemoryCache;
use adaptrans::translation::pipeline::PipelineConfig;
use adaptrans::translation::quality::Grade;
use adaptrans::{AdaptivePipeline, TranslateOptions};

use crate::common::{document, init_logging, sample_text};

fn pipeline_with(backend: &MockBackend, config: PipelineConfig) -> AdaptivePipeline {
    AdaptivePipeline::new(Arc::new(backend.clone()), config)
}

/// A short document goes out as a single call and comes back whole
#[tokio::test]
async fn test_translateAdaptive_withShortDocument_shouldMakeOneCall() {
    init_logging();
    let backend = MockBackend::working();
    let pipeline = pipeline_with(&backend, PipelineConfig::default());
    let text = "The committee reviewed the budget. Members asked about travel costs. \
                The chair promised a written answer by Friday.";

    let result = pipeline
        .translate_adaptive(&document(text), TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(backend.request_count(), 1);
    assert_eq!(result.text, pseudo_translate(text));
    assert_eq!(result.chunk_results.len(), 1);
    assert_eq!(result.overall_quality.grade, Grade::A);
    assert!(!result.degraded);
    assert!(!result.from_cache);
}

/// A chunk that fails quality once is fixed by its smaller retry split
#[tokio::test]
async fn test_translateAdaptive_withModelFailingOnLongInput_shouldAcceptRetry() {
    let backend = MockBackend::working()
        .with_script(|request| (request.text.chars().count() > 80).then(|| Ok(String::new())));
    let pipeline = pipeline_with(&backend, PipelineConfig::default());
    let text = "The committee reviewed the budget. Members asked about travel costs. \
                The chair promised a written answer by Friday.";
    assert!(text.chars().count() > 80);

    let result = pipeline
        .translate_adaptive(&document(text), TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(result.chunk_results.len(), 1);
    let chunk_result = &result.chunk_results[0];
    assert_eq!(chunk_result.attempt, 2);
    assert!(chunk_result.accepted);
    assert!(!result.degraded);
    assert_eq!(result.text, pseudo_translate(text));
    assert!(backend.request_count() > 2);
}

/// Chunks finishing out of order are still assembled by index
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_withRandomLatency_shouldKeepDocumentOrder() {
    let backend = MockBackend::random_latency(5, 120);
    let pipeline = pipeline_with(&backend, PipelineConfig::default());
    let text = sample_text(1_500);

    let result = pipeline
        .translate_adaptive(
            &document(text.clone()),
            TranslateOptions::default()
                .with_chunk_size(60)
                .with_min_quality(Grade::F),
        )
        .await
        .unwrap();

    assert!(result.chunk_results.len() > 10);
    assert_eq!(result.text, pseudo_translate(&text));
    for (position, chunk_result) in result.chunk_results.iter().enumerate() {
        assert_eq!(chunk_result.chunk.index, position);
    }
    assert_eq!(result.chunk_size, 60);
}

/// A chunk that keeps failing quality degrades the result without failing it
#[tokio::test]
async fn test_translateAdaptive_withEmptyAnswersForOneParagraph_shouldMarkOnlyThoseChunks() {
    let text = sample_text(1_000);
    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    assert!(paragraphs.len() >= 3);
    let poisoned = paragraphs[1].to_string();

    let script_paragraph = poisoned.clone();
    let backend = MockBackend::working().with_script(move |request| {
        script_paragraph.contains(&request.text).then(|| Ok(String::new()))
    });
    let pipeline = pipeline_with(&backend, PipelineConfig::default());

    let result = pipeline
        .translate_adaptive(
            &document(text.clone()),
            TranslateOptions::default()
                .with_chunk_size(150)
                .with_min_quality(Grade::D),
        )
        .await
        .unwrap();

    assert!(result.degraded);
    let degraded = result.degraded_chunks();
    assert!(!degraded.is_empty());

    for chunk_result in &result.chunk_results {
        let core = chunk_result.chunk.text.trim();
        if poisoned.contains(core) {
            assert!(!chunk_result.accepted, "chunk {} should be degraded", chunk_result.chunk.index);
            assert_eq!(chunk_result.quality.grade, Grade::F);
        } else {
            assert!(chunk_result.accepted, "chunk {} should pass", chunk_result.chunk.index);
        }
    }

    // Degraded chunks keep their best attempt; the rest is translated
    assert!(result.text.contains(&pseudo_translate(paragraphs[0])));
    assert!(result.text.contains(&pseudo_translate(paragraphs[2])));
}

/// The admission limit holds across concurrent requests on one pipeline
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_concurrentRequests_shouldShareConcurrencyLimit() {
    let backend = MockBackend::slow(50);
    let config = PipelineConfig {
        max_concurrent_requests: Some(3),
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(&backend, config);
    assert_eq!(pipeline.concurrency(), 3);

    let first = document(sample_text(2_000));
    let second = document(format!("{}\n\nOne more closing line.", sample_text(1_200)));
    let options = TranslateOptions::default()
        .with_chunk_size(200)
        .with_min_quality(Grade::F);

    let (a, b) = tokio::join!(
        pipeline.translate_adaptive(&first, options.clone()),
        pipeline.translate_adaptive(&second, options.clone())
    );

    assert!(a.is_ok() && b.is_ok());
    assert!(backend.request_count() > 6);
    assert!(backend.max_in_flight() <= 3);
    assert!(backend.max_in_flight() > 1);
}

/// Repeated requests are answered from the cache
#[tokio::test]
async fn test_translateAdaptive_repeatedRequest_shouldHitCache() {
    let backend = MockBackend::working();
    let cache = Arc::new(InMemoryCache::default());
    let pipeline = pipeline_with(&backend, PipelineConfig::default()).with_cache(cache.clone());
    let doc = document(sample_text(600));

    let first = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    let calls = backend.request_count();

    let second = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();

    assert!(second.from_cache);
    assert_eq!(second.text, first.text);
    assert_eq!(backend.request_count(), calls);
    assert_eq!(cache.stats().hits, 1);

    // Same text, equivalent language codes
    let respelled = adaptrans::SourceDocument::new(doc.text(), "eng", "fre");
    let third = pipeline
        .translate_adaptive(&respelled, TranslateOptions::default())
        .await
        .unwrap();
    assert!(third.from_cache);
}

/// Skipping the cache translates again and refreshes the entry
#[tokio::test]
async fn test_translateAdaptive_skippingCache_shouldCallBackendAgain() {
    let backend = MockBackend::working();
    let cache = Arc::new(InMemoryCache::default());
    let pipeline = pipeline_with(&backend, PipelineConfig::default()).with_cache(cache.clone());
    let doc = document(sample_text(600));

    pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    let calls = backend.request_count();

    let fresh = pipeline
        .translate_adaptive(&doc, TranslateOptions::default().skipping_cache())
        .await
        .unwrap();
    assert!(!fresh.from_cache);
    assert!(backend.request_count() > calls);
    assert_eq!(cache.len(), 1);

    let cached = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    assert!(cached.from_cache);
}

/// Cached entries expire with their grade's TTL
#[tokio::test(start_paused = true)]
async fn test_translateAdaptive_afterTtl_shouldTranslateAgain() {
    let backend = MockBackend::working();
    let pipeline = pipeline_with(&backend, PipelineConfig::default());
    let doc = document(sample_text(600));

    let first = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    assert_eq!(first.overall_quality.grade, Grade::A);
    let calls = backend.request_count();

    tokio::time::advance(Duration::from_secs(6 * 24 * 3600)).await;
    let still_cached = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    assert!(still_cached.from_cache);

    tokio::time::advance(Duration::from_secs(2 * 24 * 3600)).await;
    let refreshed = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    assert!(!refreshed.from_cache);
    assert!(backend.request_count() > calls);
}

/// The size found for a language pair is reused by later requests
#[tokio::test]
async fn test_translateAdaptive_secondLongDocument_shouldReuseChunkSize() {
    init_logging();
    let backend = MockBackend::working();
    let pipeline = pipeline_with(&backend, PipelineConfig::default()).without_cache();
    let doc = document(sample_text(3_000));

    assert_eq!(pipeline.remembered_size("en", "fr"), None);
    let first = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    let remembered = pipeline.remembered_size("en", "fr");
    assert_eq!(remembered, Some(first.chunk_size));

    // The search probes before translating, so the first request costs more
    let first_calls = backend.request_count();
    assert!(first_calls > first.chunk_results.len());

    let second = pipeline
        .translate_adaptive(&doc, TranslateOptions::default())
        .await
        .unwrap();
    assert_eq!(Some(second.chunk_size), remembered);
    assert_eq!(backend.request_count() - first_calls, second.chunk_results.len());

    // Other spellings of the pair share the memory
    assert_eq!(pipeline.remembered_size("eng", "fra"), remembered);
    pipeline.forget_sizes();
    assert_eq!(pipeline.remembered_size("en", "fr"), None);
}

/// Untranslated output comes back with whitespace and layout intact
#[tokio::test]
async fn test_translateAdaptive_withEchoBackend_shouldRoundTripLayout() {
    let backend = MockBackend::echo();
    let pipeline = pipeline_with(&backend, PipelineConfig::default()).without_cache();
    let text = format!("  {}\n\n\n\t{}\n", sample_text(400), sample_text(250));

    let result = pipeline
        .translate_adaptive(
            &document(text.clone()),
            TranslateOptions::default()
                .with_chunk_size(90)
                .with_min_quality(Grade::F),
        )
        .await
        .unwrap();

    assert_eq!(result.text, text);
    assert_eq!(result.overall_quality.grade, Grade::F);
    assert!(!result.degraded);
}

/// Whitespace the model produces is part of the translation
#[tokio::test]
async fn test_translateAdaptive_withPaddedModelOutput_shouldKeepItVerbatim() {
    let answer = "Le chat dort.\nLe chien aboie.\nL'oiseau chante.\n";
    let backend = MockBackend::working().with_script(move |_| Some(Ok(answer.to_string())));
    let pipeline = pipeline_with(&backend, PipelineConfig::default()).without_cache();

    let result = pipeline
        .translate_adaptive(
            &document("The cat sleeps. The dog barks. The bird sings."),
            TranslateOptions::default().with_min_quality(Grade::F),
        )
        .await
        .unwrap();

    assert_eq!(backend.request_count(), 1);
    assert_eq!(result.text, answer);

    // Source padding is restored only where the model left none
    let result = pipeline
        .translate_adaptive(
            &document("\n  The cat sleeps. The dog barks. The bird sings."),
            TranslateOptions::default().with_min_quality(Grade::F),
        )
        .await
        .unwrap();
    assert_eq!(result.text, format!("\n  {}", answer));
}

/*!
 * Tests for backend implementations
 */

use std::time::Duration;

use adaptrans::errors::BackendError;
use adaptrans::providers::mock::{MockBackend, pseudo_translate};
use adaptrans::providers::ollama::OllamaBackend;
use adaptrans::providers::seq2seq::Seq2SeqBackend;
use adaptrans::providers::{ModelFamily, TranslationBackend};

/// Scripts override the behavior for matching requests only
#[tokio::test]
async fn test_mockBackend_withScript_shouldOverrideMatchingRequests() {
    let backend = MockBackend::working().with_script(|request| {
        (request.text == "skip me").then(|| Ok(String::new()))
    });

    assert_eq!(backend.translate("skip me", "en", "fr").await, Ok(String::new()));
    assert_eq!(
        backend.translate("other words", "en", "fr").await,
        Ok(pseudo_translate("other words"))
    );
    assert_eq!(backend.request_count(), 2);
}

/// Scripts see the call sequence
#[tokio::test]
async fn test_mockBackend_withSequenceScript_shouldFailFirstCallOnly() {
    let backend = MockBackend::working().with_script(|request| {
        (request.sequence == 0).then(|| Err(BackendError::Unavailable("cold start".to_string())))
    });

    assert!(backend.translate("hello there", "en", "fr").await.is_err());
    assert!(backend.translate("hello there", "en", "fr").await.is_ok());
}

/// Latency stays within the configured range
#[tokio::test(start_paused = true)]
async fn test_mockBackend_randomLatency_shouldStayInRange() {
    let backend = MockBackend::random_latency(10, 30);
    for _ in 0..10 {
        let started = tokio::time::Instant::now();
        backend.translate("some text", "en", "fr").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(10) && elapsed <= Duration::from_millis(31));
    }
}

/// Identity and family are configurable
#[test]
fn test_mockBackend_identity_shouldBeConfigurable() {
    let backend = MockBackend::echo()
        .with_model_id("opus-en-fr")
        .with_family(ModelFamily::Seq2Seq);
    assert_eq!(backend.model_id(), "opus-en-fr");
    assert_eq!(backend.family(), ModelFamily::Seq2Seq);
}

/// Endpoints are validated and joined with the API path
#[test]
fn test_httpBackends_new_shouldValidateEndpoint() {
    let ollama = OllamaBackend::new("http://localhost:11434/", "llama3.2:3b", Duration::from_secs(5)).unwrap();
    assert_eq!(ollama.generate_url().as_str(), "http://localhost:11434/api/generate");
    assert_eq!(ollama.family(), ModelFamily::InstructionLlm);

    let seq2seq = Seq2SeqBackend::new("http://localhost:5000/", "opus-mt", Duration::from_secs(5)).unwrap();
    assert_eq!(seq2seq.translate_url().as_str(), "http://localhost:5000/translate");
    assert_eq!(seq2seq.family(), ModelFamily::Seq2Seq);

    assert!(OllamaBackend::new("not a url", "m", Duration::from_secs(5)).is_err());
    assert!(Seq2SeqBackend::new("", "m", Duration::from_secs(5)).is_err());
}

/// Prompt placeholders become language names
#[test]
fn test_ollamaBackend_systemPrompt_shouldNameLanguages() {
    let backend = OllamaBackend::new("http://localhost:11434", "m", Duration::from_secs(5))
        .unwrap()
        .with_system_prompt("From {source_language} into {target_language}.");
    assert_eq!(backend.system_prompt_for("de", "fra"), "From German into French.");
    assert_eq!(backend.system_prompt_for("xx", "en"), "From xx into English.");
}

/// An unreachable server is a retryable error, never a panic
#[tokio::test]
async fn test_seq2seqBackend_withUnreachableServer_shouldReturnRetryableError() {
    let backend = Seq2SeqBackend::new("http://127.0.0.1:1", "m", Duration::from_secs(2)).unwrap();
    let err = backend.translate("Hello", "en", "fr").await.unwrap_err();
    assert!(err.is_retryable());
}

/// Fixed behaviors answer without a runtime of their own
#[test]
fn test_mockBackend_fixedBehaviors_shouldAnswerAsConfigured() {
    let result = tokio_test::block_on(async {
        let echo = MockBackend::echo();
        let empty = MockBackend::empty();
        let failing = MockBackend::failing();
        (
            echo.translate("Hello world", "en", "fr").await,
            empty.translate("Hello world", "en", "fr").await,
            failing.translate("Hello world", "en", "fr").await,
        )
    });

    assert_eq!(result.0, Ok("Hello world".to_string()));
    assert_eq!(result.1, Ok(String::new()));
    assert!(matches!(result.2, Err(BackendError::Unavailable(_))));
}

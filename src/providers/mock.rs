/*!
 * Mock backend for testing.
 *
 * Behaviors:
 * - `MockBackend::working()` - deterministic pseudo-translation that scores well
 * - `MockBackend::echo()` - returns the input untouched
 * - `MockBackend::failing()` - always fails with `BackendError::Unavailable`
 * - `MockBackend::empty()` - always answers with an empty string
 * - `MockBackend::intermittent(n)` - every n-th call fails
 * - `MockBackend::slow(ms)` / `MockBackend::random_latency(min, max)`
 *
 * A script can override the answer for selected requests, and the mock keeps
 * track of every request and of the peak number of concurrent calls.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::BackendError;
use crate::providers::{ModelFamily, TranslationBackend};

/// Request as seen by a mock script
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
    /// 0-based position of this call among all calls to the mock
    pub sequence: usize,
}

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Pseudo-translates every request
    Working,
    /// Returns the input unchanged
    Echo,
    /// Fails every `fail_every`-th request
    Intermittent { fail_every: usize },
    /// Always fails
    Failing,
    /// Returns an empty translation
    Empty,
    /// Pseudo-translates after a fixed delay
    Slow { delay_ms: u64 },
    /// Pseudo-translates after a random delay in `[min_ms, max_ms]`
    RandomLatency { min_ms: u64, max_ms: u64 },
}

type Script = Arc<dyn Fn(&MockRequest) -> Option<Result<String, BackendError>> + Send + Sync>;

/// In-process backend with configurable behavior
#[derive(Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    model_id: String,
    family: ModelFamily,
    script: Option<Script>,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("behavior", &self.behavior)
            .field("model_id", &self.model_id)
            .field("family", &self.family)
            .field("scripted", &self.script.is_some())
            .field("request_count", &self.request_count())
            .finish()
    }
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            model_id: "mock-model".to_string(),
            family: ModelFamily::InstructionLlm,
            script: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn random_latency(min_ms: u64, max_ms: u64) -> Self {
        Self::new(MockBehavior::RandomLatency {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        })
    }

    /// Set the reported model identity
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set the reported model family
    pub fn with_family(mut self, family: ModelFamily) -> Self {
        self.family = family;
        self
    }

    /// Override answers: when the script returns `Some`, that result is used
    /// instead of the behavior's answer. Delays still apply.
    pub fn with_script<F>(mut self, script: F) -> Self
    where
        F: Fn(&MockRequest) -> Option<Result<String, BackendError>> + Send + Sync + 'static,
    {
        self.script = Some(Arc::new(script));
        self
    }

    /// Number of calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Texts received so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn delay(&self) -> Option<Duration> {
        match self.behavior {
            MockBehavior::Slow { delay_ms } => Some(Duration::from_millis(delay_ms)),
            MockBehavior::RandomLatency { min_ms, max_ms } => {
                let ms = rand::rng().random_range(min_ms..=max_ms);
                Some(Duration::from_millis(ms))
            }
            _ => None,
        }
    }
}

/// Tracks concurrent calls for the lifetime of one request
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(in_flight: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, BackendError> {
        let sequence = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(text.to_string());
        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);

        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }

        if let Some(script) = &self.script {
            let request = MockRequest {
                text: text.to_string(),
                source_language: source_lang.to_string(),
                target_language: target_lang.to_string(),
                sequence,
            };
            if let Some(answer) = script(&request) {
                return answer;
            }
        }

        match self.behavior {
            MockBehavior::Failing => Err(BackendError::Unavailable("mock backend failure".to_string())),
            MockBehavior::Intermittent { fail_every }
                if fail_every > 0 && sequence % fail_every == fail_every - 1 =>
            {
                Err(BackendError::Unavailable(format!("mock failure on request {}", sequence + 1)))
            }
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Echo => Ok(text.to_string()),
            _ => Ok(pseudo_translate(text)),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn family(&self) -> ModelFamily {
        self.family
    }
}

/// Deterministic stand-in for a translation.
///
/// Lowercase-initial words of four or more letters are reversed; everything
/// else (short words, capitalized names, numbers, punctuation, whitespace)
/// is kept as is.
pub fn pseudo_translate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        let starts_lower = word.chars().next().is_some_and(char::is_lowercase);
        if starts_lower && word.chars().count() >= 4 {
            out.extend(word.chars().rev());
        } else {
            out.push_str(word);
        }
        word.clear();
    };

    for c in text.chars() {
        if c.is_alphabetic() {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

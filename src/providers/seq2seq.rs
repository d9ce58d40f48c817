/*!
 * Seq2seq backend: a dedicated translation model behind a small HTTP service.
 *
 * The service takes `POST {endpoint}/translate` with
 * `{"text", "source_lang", "target_lang"}` and answers with
 * `{"translation": "..."}`.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::BackendError;
use crate::providers::{ModelFamily, TranslationBackend};

/// Request body of the translation service
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

/// Response body of the translation service
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(alias = "translated_text", alias = "translatedText")]
    translation: String,
}

/// HTTP client for a seq2seq translation service
#[derive(Debug, Clone)]
pub struct Seq2SeqBackend {
    translate_url: Url,
    model_id: String,
    timeout: Duration,
    client: Client,
}

impl Seq2SeqBackend {
    /// Create a backend for the service at `endpoint`
    pub fn new(endpoint: &str, model_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = Url::parse(endpoint).with_context(|| format!("Invalid translation endpoint: {}", endpoint))?;
        let translate_url = base
            .join("translate")
            .with_context(|| format!("Invalid translation endpoint: {}", endpoint))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            translate_url,
            model_id: model_id.into(),
            timeout,
            client,
        })
    }

    /// URL requests are sent to
    pub fn translate_url(&self) -> &Url {
        &self.translate_url
    }
}

#[async_trait]
impl TranslationBackend for Seq2SeqBackend {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, BackendError> {
        let body = TranslateRequest {
            text,
            source_lang,
            target_lang,
        };

        debug!("Sending {} chars to translation service {}", text.chars().count(), self.model_id);

        let response = self
            .client
            .post(self.translate_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout)
                } else {
                    BackendError::Unavailable(format!("Failed to reach translation service: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Translation service error ({}): {}", status, error_text);
            return Err(BackendError::Unavailable(format!(
                "Translation service error ({}): {}",
                status, error_text
            )));
        }

        response
            .json::<TranslateResponse>()
            .await
            .map(|r| r.translation)
            .map_err(|e| BackendError::Unavailable(format!("Unreadable translation service response: {}", e)))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::Seq2Seq
    }
}

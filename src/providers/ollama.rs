/*!
 * Ollama backend: an instruction-tuned LLM served by a local Ollama server.
 *
 * Each chunk is sent to `/api/generate` with a system prompt that names the
 * language pair. Retries are left to the pipeline; this client makes exactly
 * one HTTP request per call.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::BackendError;
use crate::language_utils;
use crate::providers::{ModelFamily, TranslationBackend};

/// Default system prompt; `{source_language}` and `{target_language}` are replaced per call
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional translator. Translate the user's text from \
{source_language} to {target_language}. Keep names, numbers, URLs and formatting unchanged. \
Answer with the translation only.";

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }
}

/// Ollama-served instruction LLM
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    /// Endpoint of `/api/generate`
    generate_url: Url,
    /// Model name, also used as the model identity
    model: String,
    /// System prompt template
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
    /// Per-request HTTP timeout
    timeout: Duration,
    /// HTTP client for making requests
    client: Client,
}

impl OllamaBackend {
    /// Create a backend for `model` on the server at `endpoint`
    pub fn new(endpoint: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = Url::parse(endpoint).with_context(|| format!("Invalid Ollama endpoint: {}", endpoint))?;
        let generate_url = base
            .join("api/generate")
            .with_context(|| format!("Invalid Ollama endpoint: {}", endpoint))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            generate_url,
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.2,
            timeout,
            client,
        })
    }

    /// Replace the system prompt template
    pub fn with_system_prompt(mut self, template: impl Into<String>) -> Self {
        self.system_prompt = template.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// URL requests are sent to
    pub fn generate_url(&self) -> &Url {
        &self.generate_url
    }

    /// System prompt for a language pair, with readable language names when known
    pub fn system_prompt_for(&self, source_lang: &str, target_lang: &str) -> String {
        let name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
        self.system_prompt
            .replace("{source_language}", &name(source_lang))
            .replace("{target_language}", &name(target_lang))
    }

    fn map_request_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Unavailable(format!("Failed to send request to Ollama API: {}", e))
        }
    }
}

/// Parse a generate response; streamed JSONL bodies are concatenated
fn parse_generation(body: &str) -> Option<String> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Some(response.response);
    }

    let mut text = String::new();
    let mut parsed_any = false;
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let part: GenerationResponse = serde_json::from_str(line).ok()?;
        text.push_str(&part.response);
        parsed_any = true;
    }
    parsed_any.then_some(text)
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, BackendError> {
        let request = GenerationRequest::new(&self.model, text)
            .system(self.system_prompt_for(source_lang, target_lang))
            .temperature(self.temperature);

        debug!("Sending {} chars to Ollama model {}", text.chars().count(), self.model);

        let response = self
            .client
            .post(self.generate_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_request_error(e))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, body);
            return Err(BackendError::Unavailable(format!("Ollama API error ({}): {}", status, body)));
        }

        parse_generation(&body).ok_or_else(|| {
            let preview: String = body.chars().take(200).collect();
            error!("Failed to parse Ollama API response: {}", preview);
            BackendError::Unavailable("Ollama API returned an unreadable response".to_string())
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::InstructionLlm
    }
}

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::language_utils::get_language_name;
use crate::providers::TranslationBackend;
use crate::providers::mock::MockBackend;
use crate::providers::ollama::OllamaBackend;
use crate::providers::seq2seq::Seq2SeqBackend;
use crate::translation::pipeline::PipelineConfig;
use crate::translation::quality::Glossary;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Backend the pipeline talks to
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chunking, scoring, search, retry and cache settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Fixed renderings of terms, applied to every document
    #[serde(default)]
    pub glossary: Glossary,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // Local Ollama server running an instruction-tuned model
    #[default]
    Ollama,
    // Seq2seq translation server
    Seq2seq,
    // In-process mock, for dry runs
    Mock,
}

impl BackendKind {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Seq2seq => "Seq2seq",
            Self::Mock => "Mock",
        }
    }

    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Seq2seq => "seq2seq".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "seq2seq" => Ok(Self::Seq2seq),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// Backend configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackendConfig {
    /// Backend type
    #[serde(rename = "type", default)]
    pub kind: BackendKind,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// System prompt template for instruction models
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Sampling temperature for instruction models
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl BackendConfig {
    /// Defaults for a backend type
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            endpoint: String::new(),
            model: String::new(),
            timeout_secs: default_timeout_secs(),
            system_prompt: None,
            temperature: default_temperature(),
        }
    }

    /// Endpoint, falling back to the backend type's default
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }

        match self.kind {
            BackendKind::Ollama => default_ollama_endpoint(),
            BackendKind::Seq2seq => default_seq2seq_endpoint(),
            BackendKind::Mock => String::new(),
        }
    }

    /// Model, falling back to the backend type's default
    pub fn get_model(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }

        match self.kind {
            BackendKind::Ollama => default_ollama_model(),
            BackendKind::Seq2seq => default_seq2seq_model(),
            BackendKind::Mock => "mock-model".to_string(),
        }
    }

    /// Build the configured backend
    pub fn build(&self) -> Result<Arc<dyn TranslationBackend>> {
        let timeout = Duration::from_secs(self.timeout_secs.max(1));
        let backend: Arc<dyn TranslationBackend> = match self.kind {
            BackendKind::Ollama => {
                let mut backend = OllamaBackend::new(&self.get_endpoint(), self.get_model(), timeout)?
                    .with_temperature(self.temperature);
                if let Some(prompt) = &self.system_prompt {
                    backend = backend.with_system_prompt(prompt.clone());
                }
                Arc::new(backend)
            }
            BackendKind::Seq2seq => Arc::new(Seq2SeqBackend::new(
                &self.get_endpoint(),
                self.get_model(),
                timeout,
            )?),
            BackendKind::Mock => Arc::new(MockBackend::working().with_model_id(self.get_model())),
        };

        info!(
            "Using {} backend with model {}",
            self.kind.display_name(),
            backend.model_id()
        );
        Ok(backend)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(BackendKind::default())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_seq2seq_endpoint() -> String {
    "http://localhost:5000".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_seq2seq_model() -> String {
    "opus-mt".to_string()
}

impl Config {
    /// Load the configuration from `path`, writing the defaults there first if it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            return Self::from_file(path);
        }

        let config = Config::default();
        config
            .save(path)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        info!("Created default configuration at {}", path.display());
        Ok(config)
    }

    /// Read the configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = get_language_name(&self.source_language)?;
        let _target_name = get_language_name(&self.target_language)?;

        if self.backend.kind != BackendKind::Mock {
            url::Url::parse(&self.backend.get_endpoint())
                .with_context(|| format!("Invalid backend endpoint: {}", self.backend.get_endpoint()))?;
        }

        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(anyhow!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.backend.temperature
            ));
        }

        self.pipeline.validate()?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            backend: BackendConfig::default(),
            pipeline: PipelineConfig::default(),
            glossary: Glossary::new(),
            log_level: LogLevel::default(),
        }
    }
}

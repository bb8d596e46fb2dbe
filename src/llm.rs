//! Generative text backends used when retrieval is not confident.
//!
//! - **[`GeminiGenerator`]**: Google Gemini `generateContent`, keyed by `GEMINI_API_KEY`.
//! - **[`OllamaGenerator`]**: a local Ollama `/api/generate`.
//! - **[`DisabledGenerator`]**: always errors; used when `llm.provider = "disabled"`.
//!
//! The prompt is the user's question verbatim. No retrieved context is
//! forwarded to the model.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::config::LlmConfig;
use crate::http;

/// Trait for text generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier shown next to generated answers.
    fn model_name(&self) -> &str;
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ============ Disabled ============

pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Text generation is disabled. Set [llm] provider in config.")
    }
}

// ============ Gemini ============

/// Google Gemini via `POST /v1beta/models/{model}:generateContent`.
pub struct GeminiGenerator {
    model: String,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl GeminiGenerator {
    /// # Errors
    ///
    /// Returns an error if `GEMINI_API_KEY` is not in the environment.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            api_key,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let url = http::join_url(
            &self.url,
            &format!("v1beta/models/{}:generateContent", self.model),
        );

        let response = http::send_with_retry("Gemini", self.max_retries, || {
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
        })
        .await?;

        let json: serde_json::Value = response.json().await?;
        parse_gemini_response(&json)
    }
}

/// Concatenates `candidates[0].content.parts[*].text`.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    let candidate = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let Some(candidate) = candidate else {
        let reason = json
            .pointer("/promptFeedback/blockReason")
            .and_then(|r| r.as_str())
            .unwrap_or("no candidates returned");
        bail!("Gemini returned no answer: {}", reason);
    };

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("empty response");
        bail!("Gemini returned no answer: {}", reason);
    }
    Ok(text)
}

// ============ Ollama ============

/// Local Ollama via `POST /api/generate` with streaming off.
pub struct OllamaGenerator {
    model: String,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        let url = http::join_url(&self.url, "api/generate");

        let response = http::send_with_retry("Ollama", self.max_retries, || {
            self.client.post(&url).json(&body)
        })
        .await?;

        let json: serde_json::Value = response.json().await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
    }
}

/// Create the [`TextGenerator`] named by `llm.provider`.
pub fn create_generator(config: &LlmConfig) -> Result<Box<dyn TextGenerator>> {
    debug!(provider = %config.provider, model = %config.model, "creating text generator");
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "gemini" => Ok(Box::new(GeminiGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

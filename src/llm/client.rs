//! HTTP client for the analysis LLM.
//!
//! One request per call, no retry. Gemini is the default provider; Ollama
//! serves local models.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::config::{LlmConfig, LlmProvider};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider needs credentials that are not configured
    #[error("LLM not configured: {0}")]
    NotConfigured(String),
    /// Failed to reach the LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned a non-success status or an error body
    #[error("API error: {0}")]
    Api(String),
    /// Response envelope could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response carried no generated text
    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
}

impl LlmError {
    /// Whether the service itself was unavailable, as opposed to answering badly.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LlmError::NotConfigured(_) | LlmError::Connection(_) | LlmError::Api(_)
        )
    }
}

/// Gemini `generateContent` request format.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// LLM client for document analysis.
#[derive(Clone)]
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send a prompt and return the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if !self.config.has_credentials() {
            return Err(LlmError::NotConfigured(format!(
                "{} requires an API key (set LLM_API_KEY or GEMINI_API_KEY)",
                self.config.provider.as_str()
            )));
        }

        debug!(
            "Calling {} model {} ({} prompt chars)",
            self.config.provider.as_str(),
            self.config.model(),
            prompt.len()
        );

        match self.config.provider {
            LlmProvider::Gemini => self.call_gemini(prompt).await,
            LlmProvider::Ollama => self.call_ollama(prompt).await,
        }
    }

    /// Truncate content to the configured maximum number of characters.
    pub fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        let max = self.config.max_content_chars;
        if max == 0 {
            return text;
        }
        match text.char_indices().nth(max) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }

    /// Call the Gemini generateContent API.
    async fn call_gemini(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model()
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!(
                "Gemini HTTP {}: {}",
                status,
                first_line(&body)
            )));
        }

        let gemini_resp: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.without_url().to_string()))?;

        if let Some(error) = gemini_resp.error {
            return Err(LlmError::Api(format!("Gemini: {}", error.message)));
        }

        gemini_resp
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyResponse("Gemini"))
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.config.model().to_string(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint());
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!(
                "Ollama HTTP {}: {}",
                status,
                first_line(&body)
            )));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if ollama_resp.response.trim().is_empty() {
            return Err(LlmError::EmptyResponse("Ollama"));
        }
        Ok(ollama_resp.response)
    }
}

fn first_line(body: &str) -> &str {
    let line = body.lines().next().unwrap_or("").trim();
    let mut end = line.len().min(200);
    while end > 0 && !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

//! LLM client configuration.

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Generative Language API (default)
    #[default]
    Gemini,
    /// Ollama API (local)
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Ollama => "http://localhost:11434",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::Ollama => "llama3.1:8b",
        }
    }

    /// Whether calls need an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Gemini)
    }
}

/// Configuration for the analysis LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (gemini or ollama)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key (required for gemini)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of document text to send; 0 sends everything
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// HTTP timeout for a single call; unset waits as long as the server does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_content_chars() -> usize {
    200_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::new(LlmProvider::default()).with_env_overrides()
    }
}

impl LlmConfig {
    /// Defaults for a provider, without environment overrides.
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            endpoint: None,
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            timeout_secs: None,
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Effective endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Effective model name.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Whether the configured provider has the credentials it needs.
    pub fn has_credentials(&self) -> bool {
        !self.provider.requires_api_key()
            || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "gemini" (default) or "ollama"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key; `GEMINI_API_KEY` is used for gemini when unset
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_MAX_CONTENT_CHARS`: Max document chars to send
    /// - `LLM_TIMEOUT_SECS`: HTTP timeout per call (no timeout when unset)
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(provider) = env_var("LLM_PROVIDER").and_then(|v| LlmProvider::from_str(&v)) {
            self.provider = provider;
        }
        if let Some(endpoint) = env_var("LLM_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(key) = env_var("LLM_API_KEY") {
            self.api_key = Some(key);
        }
        if self.api_key.is_none() && self.provider == LlmProvider::Gemini {
            self.api_key = env_var("GEMINI_API_KEY");
        }
        if let Some(model) = env_var("LLM_MODEL") {
            self.model = Some(model);
        }
        if let Some(val) = env_var("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = val;
        }
        if let Some(val) = env_var("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = val;
        }
        if let Some(val) = env_var("LLM_MAX_CONTENT_CHARS").and_then(|v| v.parse().ok()) {
            self.max_content_chars = val;
        }
        if let Some(val) = env_var("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = Some(val);
        }
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let gemini = LlmConfig::new(LlmProvider::Gemini);
        assert_eq!(gemini.model(), "gemini-2.0-flash");
        assert!(gemini.endpoint().starts_with("https://generativelanguage"));
        assert!(!gemini.has_credentials());
        assert!(gemini.clone().with_api_key("k").has_credentials());

        let ollama = LlmConfig::new(LlmProvider::Ollama);
        assert_eq!(ollama.endpoint(), "http://localhost:11434");
        assert!(ollama.has_credentials());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = LlmConfig::new(LlmProvider::Ollama).with_endpoint("http://gpu-box:11434/");
        assert_eq!(config.endpoint(), "http://gpu-box:11434");
    }

    #[test]
    fn test_blank_key_is_not_a_credential() {
        let config = LlmConfig::new(LlmProvider::Gemini).with_api_key("  ");
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: LlmConfig =
            toml::from_str("provider = \"ollama\"\nmodel = \"qwen2.5:14b\"").unwrap();
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.model(), "qwen2.5:14b");
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_timeout_is_unset_by_default() {
        assert_eq!(LlmConfig::new(LlmProvider::Gemini).timeout_secs, None);

        let config: LlmConfig = toml::from_str("timeout_secs = 45").unwrap();
        assert_eq!(config.timeout_secs, Some(45));
    }
}

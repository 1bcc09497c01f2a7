//! Analyzer backed by the configured LLM provider.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{normalize_reply, AnalysisError, Analyzer};
use crate::llm::{build_analysis_prompt, LlmClient, LlmConfig};
use crate::models::AnalysisResult;

/// Sends the analysis prompt once and normalizes whatever comes back.
#[derive(Clone)]
pub struct LlmAnalyzer {
    client: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Build an analyzer with its own HTTP client.
    pub fn from_config(config: LlmConfig) -> Result<Self, AnalysisError> {
        Ok(Self::new(LlmClient::new(config)?))
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let content = self.client.truncate_content(text);
        if content.len() < text.len() {
            debug!(
                "Truncated document text from {} to {} bytes",
                text.len(),
                content.len()
            );
        }

        let prompt = build_analysis_prompt(content);
        let reply = self.client.generate(&prompt).await?;

        normalize_reply(&reply).inspect_err(|e| {
            warn!("Discarding LLM reply ({} chars): {}", reply.len(), e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;

    #[tokio::test]
    async fn test_missing_credentials_is_unavailable() {
        let config = LlmConfig::new(LlmProvider::Gemini).with_endpoint("http://127.0.0.1:9");
        let analyzer = LlmAnalyzer::from_config(config).unwrap();

        let err = analyzer.analyze("Some lease text").await.unwrap_err();
        assert!(matches!(err, AnalysisError::AnalysisUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_unavailable() {
        let config = LlmConfig::new(LlmProvider::Ollama).with_endpoint("http://127.0.0.1:9");
        let analyzer = LlmAnalyzer::from_config(config).unwrap();

        let err = analyzer.analyze("").await.unwrap_err();
        assert!(matches!(err, AnalysisError::AnalysisUnavailable(_)));
    }
}

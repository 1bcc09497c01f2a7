//! Document analysis: prompting the LLM, normalizing its reply, and scoring
//! the result.

mod normalize;
mod requester;
mod scoring;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::LlmError;
use crate::models::AnalysisResult;

pub use normalize::{find_json_object, normalize_reply, normalize_value};
pub use requester::LlmAnalyzer;
pub use scoring::{confidence_score, CHECK_WEIGHT};

/// Errors from requesting an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The LLM could not be reached, rejected the call, or is not configured.
    #[error("Analysis service unavailable: {0}")]
    AnalysisUnavailable(String),

    /// The LLM answered, but not with a usable JSON object.
    #[error("Invalid analysis format: {0}")]
    InvalidAnalysisFormat(String),
}

impl From<LlmError> for AnalysisError {
    fn from(e: LlmError) -> Self {
        if e.is_unavailable() {
            AnalysisError::AnalysisUnavailable(e.to_string())
        } else {
            AnalysisError::InvalidAnalysisFormat(e.to_string())
        }
    }
}

/// Produces a normalized analysis from document text.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError>;
}

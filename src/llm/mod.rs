//! LLM access for document analysis.
//!
//! Supports the Gemini API (default) and Ollama for local inference.

mod client;
mod config;
mod prompts;

pub use client::{LlmClient, LlmError};
pub use config::{LlmConfig, LlmProvider};
pub use prompts::{build_analysis_prompt, ANALYSIS_PROMPT, DOCUMENT_PLACEHOLDER};

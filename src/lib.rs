//! DocuMind - legal document analysis service.
//!
//! Accepts PDF and Word uploads, extracts their text, asks an LLM for a
//! structured analysis, scores it, and tracks each document through
//! `pending`, `processing`, `completed`, and `failed`. Free accounts are
//! limited to a fixed number of analyses per period; billing events move
//! accounts between plans.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod storage;

//! Data models for DocuMind.

mod analysis;
mod document;
mod user;

pub use analysis::{
    AnalysisEntry, AnalysisResult, FinancialTerm, KeyDate, Obligation, Party, Risk, StoredAnalysis,
    TerminationCondition, NO_SUMMARY,
};
pub use document::{Document, DocumentStatus, DocumentSummary};
pub use user::{Plan, SubscriptionStatus, User};

//! Shared helper functions for CLI commands.

use std::sync::Arc;

use crate::analysis::LlmAnalyzer;
use crate::config::{Config, Settings};
use crate::models::User;
use crate::repository::DbContext;
use crate::services::DocumentService;

/// Open the database, creating the schema if needed.
pub async fn open_context(settings: &Settings) -> anyhow::Result<DbContext> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;
    Ok(ctx)
}

/// Build the document service the same way the server does.
pub fn document_service(
    ctx: &DbContext,
    settings: &Settings,
    config: &Config,
) -> anyhow::Result<DocumentService> {
    let analyzer = LlmAnalyzer::from_config(config.llm.clone())?;
    Ok(DocumentService::new(
        ctx.clone(),
        Arc::new(analyzer),
        settings.upload_store(),
        settings.plan,
    ))
}

/// Look up an account by email.
pub async fn find_user(ctx: &DbContext, email: &str) -> anyhow::Result<User> {
    ctx.users()
        .get_by_email(email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No account with email {}", email))
}

/// Truncate to at most `max` characters, marking the cut with "...".
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.2} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.2} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.2} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} bytes", bytes)
    }
}

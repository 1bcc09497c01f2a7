//! HTTP API for uploading, analyzing, and reading back legal documents.
//!
//! All document and account routes authenticate with a bearer API token.
//! Billing events authenticate with a shared secret header.

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::AuthUser;
pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::analysis::{Analyzer, LlmAnalyzer};
use crate::config::{Config, Settings};
use crate::repository::{DbContext, DieselUserRepository};
use crate::services::{BillingService, DocumentService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
    pub billing: Arc<BillingService>,
    pub users: Arc<DieselUserRepository>,
    pub billing_secret: Option<Arc<str>>,
    pub max_upload_bytes: u64,
    pub cors_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(settings: &Settings, config: &Config) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context()?;
        let analyzer = LlmAnalyzer::from_config(config.llm.clone())?;
        Ok(Self::with_analyzer(ctx, Arc::new(analyzer), settings))
    }

    /// Build state around an explicit analyzer.
    pub fn with_analyzer(ctx: DbContext, analyzer: Arc<dyn Analyzer>, settings: &Settings) -> Self {
        let documents = DocumentService::new(
            ctx.clone(),
            analyzer,
            settings.upload_store(),
            settings.plan,
        );

        Self {
            documents: Arc::new(documents),
            billing: Arc::new(BillingService::new(ctx.users())),
            users: Arc::new(ctx.users()),
            billing_secret: settings.billing_secret.as_deref().map(Arc::from),
            max_upload_bytes: settings.max_upload_bytes,
            cors_origins: settings.cors_origins.clone().into(),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings, config)?;

    if settings.processing_timeout_secs > 0 {
        let timeout = chrono::Duration::seconds(settings.processing_timeout_secs as i64);
        let reclaimed = state.documents.reclaim_stale(timeout).await?;
        if !reclaimed.is_empty() {
            tracing::info!("Reclaimed {} stale processing documents", reclaimed.len());
        }
    }

    if state.billing_secret.is_none() {
        tracing::warn!("No billing secret configured; billing events endpoint is disabled");
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

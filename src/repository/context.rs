//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection pool and hands out repositories that share it.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::analysis::DieselAnalysisRepository;
use super::document::DieselDocumentRepository;
use super::pool::{DbError, DbPool};
use super::user::DieselUserRepository;

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:/data/documind.db")?;
/// let user = ctx.users().get_by_token(token).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database file path (SQLite only).
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: DbPool::sqlite_from_path(db_path),
        }
    }

    /// Create a context from a database URL.
    ///
    /// Supports:
    /// - SQLite: file paths or `sqlite:` URLs
    /// - PostgreSQL: `postgres://` or `postgresql://` URLs
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        Ok(Self {
            pool: DbPool::from_url(url)?,
        })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get a user repository.
    pub fn users(&self) -> DieselUserRepository {
        DieselUserRepository::new(self.pool.clone())
    }

    /// Get a document repository.
    pub fn documents(&self) -> DieselDocumentRepository {
        DieselDocumentRepository::new(self.pool.clone())
    }

    /// Get an analysis repository.
    pub fn analyses(&self) -> DieselAnalysisRepository {
        DieselAnalysisRepository::new(self.pool.clone())
    }

    /// Initialize database schema. Safe to run repeatedly.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        crate::with_conn_split!(self.pool,
            sqlite: conn => {
                init_sqlite_schema(&mut conn).await
            },
            postgres: conn => {
                init_postgres_schema(&mut conn).await
            }
        )
    }
}

/// Initialize SQLite schema.
async fn init_sqlite_schema(conn: &mut super::pool::SqliteConn) -> Result<(), DbError> {
    conn.batch_execute(include_str!("schema_sqlite.sql")).await
}

/// Initialize PostgreSQL schema.
#[cfg(feature = "postgres")]
async fn init_postgres_schema(conn: &mut diesel_async::AsyncPgConnection) -> Result<(), DbError> {
    use diesel_async::RunQueryDsl;

    // PostgreSQL needs statements executed separately
    for stmt in schema_statements(include_str!("schema_postgres.sql")) {
        diesel::sql_query(stmt).execute(conn).await?;
    }
    Ok(())
}

/// Split a schema script into statements, dropping comment lines.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
fn schema_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|stmt| {
            stmt.lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

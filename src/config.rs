//! Configuration management for DocuMind using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::repository::util::{is_postgres_url, redact_url_password, validate_database_url};
use crate::repository::{DbContext, DbError};
use crate::services::PlanLimits;
use crate::storage::{UploadStore, DEFAULT_MAX_UPLOAD_BYTES};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "documind.db";

/// Default uploads subdirectory name.
const UPLOADS_SUBDIR: &str = "uploads";

/// Default bind address for `serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or config.
    pub database_url: Option<String>,
    /// Directory for stored uploads.
    pub uploads_dir: PathBuf,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: u64,
    /// Free plan limits.
    pub plan: PlanLimits,
    /// Documents processing longer than this are reclaimed at server start (0 = never).
    pub processing_timeout_secs: u64,
    /// Shared secret expected on billing event requests (None = billing endpoint disabled).
    pub billing_secret: Option<String>,
    /// Origins allowed by CORS (empty = any).
    pub cors_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/documind/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("documind");

        Self {
            uploads_dir: data_dir.join(UPLOADS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            plan: PlanLimits::default(),
            processing_timeout_secs: 0,
            billing_secret: None,
            cors_origins: Vec::new(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            uploads_dir: data_dir.join(UPLOADS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Database URL safe for logs.
    pub fn display_database_url(&self) -> String {
        redact_url_password(&self.database_url())
    }

    /// Check if using PostgreSQL (vs SQLite).
    pub fn is_postgres(&self) -> bool {
        self.database_url
            .as_ref()
            .is_some_and(|url| is_postgres_url(url))
    }

    /// Get the full path to the database (for SQLite file-based databases).
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    /// For PostgreSQL: always returns true (connection errors handled elsewhere).
    pub fn database_exists(&self) -> bool {
        self.is_postgres() || self.database_path().exists()
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [("data", &self.data_dir), ("uploads", &self.uploads_dir)] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> Result<DbContext, DbError> {
        DbContext::from_url(&self.database_url())
    }

    /// Upload store rooted at `uploads_dir`.
    pub fn upload_store(&self) -> UploadStore {
        UploadStore::new(&self.uploads_dir, self.max_upload_bytes)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Upload directory (default: `<data_dir>/uploads`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<String>,
    /// Largest accepted upload in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<u64>,
    /// Seconds after which a `processing` document is considered stuck.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_timeout_secs: Option<u64>,
    /// Shared secret for the billing events endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_secret: Option<String>,
    /// CORS allowed origins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors_origins: Vec<String>,
    /// Free plan limits.
    #[serde(default)]
    pub plan: PlanLimits,
    /// LLM configuration for document analysis.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers documind config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("documind").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found, use defaults with env overrides
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        let mut config: Config = match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };
        // Environment wins over file values for LLM settings
        config.llm = config.llm.with_env_overrides();
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir` (config file location or CWD)
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.uploads_dir = settings.data_dir.join(UPLOADS_SUBDIR);
        }
        if let Some(ref uploads_dir) = self.uploads_dir {
            settings.uploads_dir = self.resolve_path(uploads_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        if let Some(timeout) = self.processing_timeout_secs {
            settings.processing_timeout_secs = timeout;
        }
        if let Some(ref secret) = self.billing_secret {
            settings.billing_secret = Some(secret.clone());
        }
        if !self.cors_origins.is_empty() {
            settings.cors_origins = self.cors_origins.clone();
        }
        settings.plan = self.plan;
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory or database file (--data flag).
    /// Can be a directory containing documind.db or a .db file directly.
    pub data: Option<PathBuf>,
}

fn is_db_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Split a `--data` value into a data directory and an optional database filename.
fn resolve_data_path(path: &Path) -> (PathBuf, Option<String>) {
    let path = absolutize(path);
    if is_db_file(&path) || path.is_file() {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (dir, filename)
    } else {
        (path, None)
    }
}

/// Look for a config file next to the database.
fn find_config_next_to_db(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "yaml", "yml", "toml"];
    let basenames = ["documind", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions, data_dir_override: Option<&PathBuf>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}: {}", config_path.display(), e);
                Config::default()
            }
        };
    }

    // Priority 2: Config next to data dir
    if let Some(data_dir) = data_dir_override {
        if let Some(config_path) = find_config_next_to_db(data_dir) {
            tracing::debug!("Found config next to data dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_default();
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> anyhow::Result<(Settings, Config)> {
    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|s| !s.is_empty());
    if let Some(ref url) = database_url {
        validate_database_url(url).map_err(|e| {
            anyhow::anyhow!(
                "{}\n\nEither:\n  \
                 - Use a build with the 'postgres' feature enabled\n  \
                 - Use a sqlite: URL instead\n  \
                 - Remove DATABASE_URL to use the default SQLite database",
                e
            )
        })?;
    }

    let data_override = options.data.as_deref().map(resolve_data_path);
    let config = load_file_config(&options, data_override.as_ref().map(|(dir, _)| dir)).await;

    let mut settings = Settings::default();

    // Determine base directory for resolving relative paths
    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // --data override takes precedence for data_dir and the database file
    if let Some((data_dir, filename)) = data_override {
        if config.uploads_dir.is_none() {
            settings.uploads_dir = data_dir.join(UPLOADS_SUBDIR);
        }
        settings.data_dir = data_dir;
        if let Some(filename) = filename {
            settings.database_filename = filename;
        }
    }

    // DATABASE_URL environment variable takes highest precedence
    if let Some(url) = database_url {
        tracing::debug!(
            "Using DATABASE_URL from environment: {}",
            redact_url_password(&url)
        );
        settings.database_url = Some(url);
    }

    if let Some(secret) = std::env::var("BILLING_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
    {
        settings.billing_secret = Some(secret);
    }

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_sections() {
        let config = Config::parse(
            r#"
data_dir = "~/legal"
max_upload_bytes = 2048
processing_timeout_secs = 600

[plan]
free_monthly_limit = 3

[llm]
provider = "ollama"
model = "qwen2.5:14b"
"#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.data_dir.as_deref(), Some("~/legal"));
        assert_eq!(config.plan.free_monthly_limit, 3);
        assert_eq!(config.plan.reset_after_days, 30);
        assert_eq!(config.max_upload_bytes, Some(2048));
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse("billing_secret: s3cret\nplan:\n  reset_after_days: 14\n", "yaml")
            .unwrap();
        assert_eq!(yaml.billing_secret.as_deref(), Some("s3cret"));
        assert_eq!(yaml.plan.reset_after_days, 14);

        let json = Config::parse(r#"{"database": "legal.db"}"#, "json").unwrap();
        assert_eq!(json.database.as_deref(), Some("legal.db"));

        assert!(Config::parse("{not json", "json").is_err());
    }

    #[test]
    fn test_apply_to_settings_resolves_relative_paths() {
        let config = Config {
            data_dir: Some("data".to_string()),
            processing_timeout_secs: Some(900),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/srv/documind"));

        assert_eq!(settings.data_dir, PathBuf::from("/srv/documind/data"));
        assert_eq!(settings.uploads_dir, PathBuf::from("/srv/documind/data/uploads"));
        assert_eq!(settings.processing_timeout_secs, 900);
        assert_eq!(
            settings.database_url(),
            "sqlite:/srv/documind/data/documind.db"
        );
    }

    #[test]
    fn test_explicit_uploads_dir() {
        let config = Config {
            data_dir: Some("/var/lib/documind".to_string()),
            uploads_dir: Some("/mnt/uploads".to_string()),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/"));
        assert_eq!(settings.uploads_dir, PathBuf::from("/mnt/uploads"));
    }

    #[test]
    fn test_resolve_data_path() {
        let (dir, file) = resolve_data_path(Path::new("/tmp/legal/contracts.db"));
        assert_eq!(dir, PathBuf::from("/tmp/legal"));
        assert_eq!(file.as_deref(), Some("contracts.db"));

        let (dir, file) = resolve_data_path(Path::new("/tmp/legal-data-dir-that-does-not-exist"));
        assert_eq!(dir, PathBuf::from("/tmp/legal-data-dir-that-does-not-exist"));
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documind.toml");
        std::fs::write(&path, "data_dir = \".\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));
    }
}

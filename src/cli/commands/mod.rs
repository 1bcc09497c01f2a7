//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod docs;
mod helpers;
mod init;
mod serve;
mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions, DEFAULT_BIND};

#[derive(Parser)]
#[command(name = "documind")]
#[command(about = "Legal document analysis service")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file (overrides config file).
    /// Can be a directory containing documind.db or a .db file directly.
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP API server
    Serve {
        /// Address to bind to: port, host, or host:port
        #[arg(default_value = DEFAULT_BIND)]
        bind: String,

        /// Skip schema creation on startup
        #[arg(long)]
        no_migrate: bool,
    },

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Work with documents
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create an account and print its API token
    Create {
        email: String,
        /// Display name (defaults to the email's local part)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List accounts
    List,

    /// Set an account's plan
    Plan {
        email: String,
        /// free or pro
        plan: String,
    },

    /// Show an account and its usage
    Show { email: String },
}

#[derive(Subcommand)]
enum DocsCommands {
    /// List an account's documents
    Ls {
        /// Account email
        #[arg(short, long)]
        user: String,
        /// Output format: table, json, ids
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Upload a PDF or DOCX file for an account
    Upload {
        #[arg(short, long)]
        user: String,
        file: PathBuf,
    },

    /// Analyze a pending or failed document
    Analyze {
        #[arg(short, long)]
        user: String,
        doc_id: String,
    },

    /// Show a completed document's analysis
    Results {
        #[arg(short, long)]
        user: String,
        doc_id: String,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move documents stuck in processing back to failed
    Reclaim {
        /// Minimum time in processing, in seconds
        #[arg(long, default_value = "600")]
        older_than: u64,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.data,
    };
    let (settings, config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Serve { bind, no_migrate } => {
            serve::cmd_serve(&settings, &config, &bind, no_migrate).await
        }
        Commands::User { command } => match command {
            UserCommands::Create { email, name } => {
                user::cmd_user_create(&settings, &email, name.as_deref()).await
            }
            UserCommands::List => user::cmd_user_list(&settings).await,
            UserCommands::Plan { email, plan } => {
                user::cmd_user_plan(&settings, &email, &plan).await
            }
            UserCommands::Show { email } => user::cmd_user_show(&settings, &email).await,
        },
        Commands::Docs { command } => match command {
            DocsCommands::Ls { user, format } => {
                docs::cmd_ls(&settings, &config, &user, &format).await
            }
            DocsCommands::Upload { user, file } => {
                docs::cmd_upload(&settings, &config, &user, &file).await
            }
            DocsCommands::Analyze { user, doc_id } => {
                docs::cmd_analyze(&settings, &config, &user, &doc_id).await
            }
            DocsCommands::Results { user, doc_id, json } => {
                docs::cmd_results(&settings, &config, &user, &doc_id, json).await
            }
            DocsCommands::Reclaim { older_than } => {
                docs::cmd_reclaim(&settings, &config, older_than).await
            }
        },
    }
}

//! Initialize command.

use console::style;

use crate::config::{Config, Settings};
use crate::extract::pdftotext_path;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    println!(
        "  {} Database ready at {}",
        style("✓").green(),
        settings.display_database_url()
    );
    println!(
        "  {} Uploads stored in {}",
        style("✓").green(),
        settings.uploads_dir.display()
    );

    match pdftotext_path() {
        Some(path) => println!("  {} pdftotext found at {}", style("✓").green(), path.display()),
        None => {
            println!("{} pdftotext not found on PATH", style("!").yellow());
            println!("  Install poppler-utils to analyze PDF uploads");
        }
    }

    match config.source_path {
        Some(ref path) => println!("  {} Using config {}", style("✓").green(), path.display()),
        None => {
            println!("{} No documind config file found", style("!").yellow());
            println!("  Using defaults; LLM settings can come from LLM_* environment variables");
        }
    }

    println!(
        "{} Initialized DocuMind in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!(
        "  Create an account with: {}",
        style("documind user create <email>").cyan()
    );

    Ok(())
}

//! Web server command.

use console::style;

use crate::config::{Config, Settings};

/// Port used when the bind address names only a host.
const DEFAULT_PORT: u16 = 3030;

/// Start the web server.
pub async fn cmd_serve(
    settings: &Settings,
    config: &Config,
    bind: &str,
    no_migrate: bool,
) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    if !no_migrate {
        println!("{} Preparing database...", style("→").cyan());
        settings.ensure_directories()?;
        let ctx = settings.create_db_context()?;
        match ctx.init_schema().await {
            Ok(()) => println!("  {} Database ready", style("✓").green()),
            Err(e) => {
                eprintln!("  {} Schema setup failed: {}", style("✗").red(), e);
                return Err(anyhow::anyhow!("Database schema setup failed: {}", e));
            }
        }
    }

    println!(
        "{} Starting DocuMind server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, config, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

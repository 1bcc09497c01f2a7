//! Document commands: list, upload, analyze, results, reclaim.

use std::path::Path;

use console::style;

use super::helpers::{document_service, find_user, format_bytes, open_context, truncate};
use crate::config::{Config, Settings};
use crate::models::{AnalysisResult, StoredAnalysis};

/// List an account's documents.
pub async fn cmd_ls(
    settings: &Settings,
    config: &Config,
    email: &str,
    format: &str,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let user = find_user(&ctx, email).await?;
    let service = document_service(&ctx, settings, config)?;
    let documents = service.list(&user.id).await?;

    if documents.is_empty() {
        println!("{} No documents found", style("!").yellow());
        return Ok(());
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&documents)?),
        "ids" => {
            for doc in &documents {
                println!("{}", doc.id);
            }
        }
        _ => {
            println!(
                "\n{:<36}  {:<30}  {:<10}  {:<10}  Score",
                "ID", "Filename", "Size", "Status"
            );
            println!("{}", "-".repeat(100));

            for doc in &documents {
                let score = doc
                    .confidence_score
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<36}  {:<30}  {:<10}  {:<10}  {}",
                    doc.id,
                    truncate(&doc.filename, 30),
                    format_bytes(doc.file_size),
                    doc.status.as_str(),
                    score
                );
            }
            println!("\n{} documents", documents.len());
        }
    }

    Ok(())
}

/// Upload a local file for an account.
pub async fn cmd_upload(
    settings: &Settings,
    config: &Config,
    email: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let user = find_user(&ctx, email).await?;
    let service = document_service(&ctx, settings, config)?;

    let content = tokio::fs::read(file).await?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?;

    let doc = service.upload(&user.id, filename, None, &content).await?;

    println!(
        "{} Uploaded {} ({})",
        style("✓").green(),
        doc.filename,
        format_bytes(doc.file_size)
    );
    println!("  Document ID: {}", doc.id);
    Ok(())
}

/// Analyze a document and print the result.
pub async fn cmd_analyze(
    settings: &Settings,
    config: &Config,
    email: &str,
    doc_id: &str,
) -> anyhow::Result<()> {
    if !config.llm.has_credentials() {
        println!(
            "{} {} has no API key configured; analysis will fail",
            style("!").yellow(),
            config.llm.provider.as_str()
        );
    }

    let ctx = open_context(settings).await?;
    let user = find_user(&ctx, email).await?;
    let service = document_service(&ctx, settings, config)?;

    println!(
        "{} Analyzing {} with {} ({})...",
        style("→").cyan(),
        doc_id,
        config.llm.provider.as_str(),
        config.llm.model()
    );
    let analysis = service.analyze(&user.id, doc_id).await?;

    println!("{} Analysis complete", style("✓").green());
    print_analysis(&analysis);
    Ok(())
}

/// Print a completed document's analysis.
pub async fn cmd_results(
    settings: &Settings,
    config: &Config,
    email: &str,
    doc_id: &str,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let user = find_user(&ctx, email).await?;
    let service = document_service(&ctx, settings, config)?;
    let (doc, analysis) = service.results(&user.id, doc_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("\n{}", style(&doc.filename).bold());
    println!(
        "  Uploaded {}  |  Analyzed {}",
        doc.created_at.format("%Y-%m-%d %H:%M"),
        analysis.created_at.format("%Y-%m-%d %H:%M")
    );
    print_analysis(&analysis);
    Ok(())
}

/// Move documents stuck in processing to failed.
pub async fn cmd_reclaim(
    settings: &Settings,
    config: &Config,
    older_than_secs: u64,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let service = document_service(&ctx, settings, config)?;

    let reclaimed = service
        .reclaim_stale(chrono::Duration::seconds(older_than_secs as i64))
        .await?;

    if reclaimed.is_empty() {
        println!("{} No stale documents", style("✓").green());
        return Ok(());
    }

    for doc in &reclaimed {
        println!("  {} {} ({})", style("↺").yellow(), doc.id, doc.filename);
    }
    println!(
        "{} Reclaimed {} documents",
        style("✓").green(),
        reclaimed.len()
    );
    Ok(())
}

fn print_analysis(analysis: &StoredAnalysis) {
    let result: &AnalysisResult = &analysis.result;

    println!(
        "\n{} {:.0}%",
        style("Confidence:").bold(),
        analysis.confidence_score * 100.0
    );
    println!("\n{}\n  {}", style("Summary").bold(), result.summary);

    if !result.parties.is_empty() {
        println!("\n{}", style("Parties").bold());
        for party in &result.parties {
            println!("  - {} ({}, {})", party.name, party.role, party.kind);
        }
    }

    if !result.dates.is_empty() {
        println!("\n{}", style("Key dates").bold());
        for date in &result.dates {
            println!(
                "  - {} [{}] {} ({})",
                date.date, date.kind, date.description, date.importance
            );
        }
    }

    if !result.financial_terms.is_empty() {
        println!("\n{}", style("Financial terms").bold());
        for term in &result.financial_terms {
            print!(
                "  - {} {:.2} {}: {}",
                term.kind, term.amount, term.currency, term.description
            );
            match term.due_date {
                Some(ref due) => println!(" (due {})", due),
                None => println!(),
            }
        }
    }

    if !result.obligations.is_empty() {
        println!("\n{}", style("Obligations").bold());
        for ob in &result.obligations {
            print!("  - {}: {} [{}]", ob.party, ob.obligation, ob.priority);
            match ob.deadline {
                Some(ref deadline) => println!(" by {}", deadline),
                None => println!(),
            }
        }
    }

    if !result.risks.is_empty() {
        println!("\n{}", style("Risks").bold());
        for risk in &result.risks {
            let severity = match risk.severity.as_str() {
                "high" => style(risk.severity.as_str()).red(),
                "medium" => style(risk.severity.as_str()).yellow(),
                _ => style(risk.severity.as_str()).dim(),
            };
            println!("  - [{}] {}: {}", severity, risk.kind, risk.description);
            if !risk.recommendation.is_empty() {
                println!("      {}", risk.recommendation);
            }
        }
    }

    if !result.termination_conditions.is_empty() {
        println!("\n{}", style("Termination").bold());
        for condition in &result.termination_conditions {
            for line in condition.display_lines() {
                println!("  - {}", line);
            }
        }
    }
}

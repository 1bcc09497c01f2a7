//! Account management commands.

use console::style;

use super::helpers::{find_user, open_context};
use crate::config::Settings;
use crate::models::{Plan, User};
use crate::services::PlanLimiter;

/// Create an account and print its API token.
pub async fn cmd_user_create(
    settings: &Settings,
    email: &str,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let users = ctx.users();

    if users.get_by_email(email).await?.is_some() {
        anyhow::bail!("An account with email {} already exists", email);
    }

    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());
    let user = User::new(email, name);
    users.create(&user).await?;

    println!("{} Created account {}", style("✓").green(), user.email);
    println!("  ID:        {}", user.id);
    println!("  Plan:      {}", user.plan);
    println!("  API token: {}", style(&user.api_token).bold());

    Ok(())
}

/// List accounts.
pub async fn cmd_user_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let users = ctx.users().list().await?;

    if users.is_empty() {
        println!("{} No accounts found", style("!").yellow());
        return Ok(());
    }

    println!(
        "\n{:<36}  {:<30}  {:<6}  {:<10}  Status",
        "ID", "Email", "Plan", "This month"
    );
    println!("{}", "-".repeat(100));
    for user in &users {
        println!(
            "{:<36}  {:<30}  {:<6}  {:<10}  {}",
            user.id,
            super::helpers::truncate(&user.email, 30),
            user.plan,
            user.documents_processed_this_month,
            user.subscription_status
        );
    }
    println!("\n{} accounts", users.len());

    Ok(())
}

/// Set an account's plan directly.
pub async fn cmd_user_plan(settings: &Settings, email: &str, plan: &str) -> anyhow::Result<()> {
    let plan = Plan::from_str(plan)
        .ok_or_else(|| anyhow::anyhow!("Unknown plan '{}' (expected free or pro)", plan))?;

    let ctx = open_context(settings).await?;
    let user = find_user(&ctx, email).await?;
    ctx.users().set_plan(&user.id, plan).await?;

    println!(
        "{} {} is now on the {} plan",
        style("✓").green(),
        user.email,
        plan
    );
    Ok(())
}

/// Show an account and its usage.
pub async fn cmd_user_show(settings: &Settings, email: &str) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let user = find_user(&ctx, email).await?;
    let usage = PlanLimiter::new(ctx.users(), settings.plan)
        .usage(&user.id)
        .await?;

    println!("\n{}", style(&user.email).bold());
    println!("  ID:           {}", user.id);
    println!("  Name:         {}", user.name);
    println!("  Plan:         {}", usage.plan);
    println!("  Subscription: {}", usage.subscription_status);
    if let Some(end) = usage.subscription_end_date {
        println!("  Ended:        {}", end.format("%Y-%m-%d"));
    }
    match (usage.monthly_limit, usage.remaining) {
        (Some(limit), Some(remaining)) => println!(
            "  This month:   {}/{} documents ({} remaining)",
            usage.documents_processed_this_month, limit, remaining
        ),
        _ => println!(
            "  This month:   {} documents (unlimited)",
            usage.documents_processed_this_month
        ),
    }
    println!("  Created:      {}", user.created_at.format("%Y-%m-%d %H:%M"));

    let counts = ctx.documents().count_by_status(Some(&user.id)).await?;
    if !counts.is_empty() {
        let summary: Vec<String> = counts
            .iter()
            .map(|(status, n)| format!("{} {}", n, status))
            .collect();
        println!("  Documents:    {}", summary.join(", "));
    }

    Ok(())
}

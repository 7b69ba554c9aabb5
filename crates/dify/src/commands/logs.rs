//! Logs command - list workflow logs.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use dify_client::LogsRequest;

use super::Context;

/// Arguments for the logs command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Search keyword
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Filter by status
    #[arg(short, long, value_parser = ["succeeded", "failed", "stopped"])]
    pub status: Option<String>,

    /// Page number, starting at 1
    #[arg(short, long)]
    pub page: Option<u32>,

    /// Entries per page
    #[arg(short, long)]
    pub limit: Option<u32>,
}

/// Run the logs command.
pub async fn run(args: LogsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let filter = LogsRequest {
        keyword: args.keyword,
        status: args.status,
        page: args.page,
        limit: args.limit,
    };
    let logs = client.workflow().logs(&filter).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!(
        "{} {}",
        style("Workflow logs").bold(),
        dim.apply_to(format!("(page {}, {} total)", logs.page, logs.total))
    );
    println!("{}", dim.apply_to("─".repeat(50)));

    if logs.data.is_empty() {
        println!("{}", dim.apply_to("No logs found"));
        return Ok(());
    }

    for entry in &logs.data {
        let run = &entry["workflow_run"];
        let run_id = run["id"].as_str().unwrap_or("-");
        let status = run["status"].as_str().unwrap_or("unknown");
        let created = entry["created_at"]
            .as_i64()
            .map(|t| t.to_string())
            .unwrap_or_default();
        println!(
            "{}  {}  {}",
            run_id,
            super::run::status_style(status),
            dim.apply_to(created)
        );
    }

    if logs.has_more {
        println!();
        println!(
            "{}",
            dim.apply_to(format!("More results: --page {}", logs.page + 1))
        );
    }
    Ok(())
}

//! Detail command - show the state of a workflow execution.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the detail command.
#[derive(Args, Debug)]
pub struct DetailArgs {
    /// Workflow execution ID
    pub run_id: String,
}

/// Run the detail command.
pub async fn run(args: DetailArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let detail = client.workflow().detail(&args.run_id).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style(format!("Run {}", detail.id)).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!("Status:   {}", super::run::status_style(&detail.status));
    if !detail.workflow_id.is_empty() {
        println!("Workflow: {}", detail.workflow_id);
    }
    println!("Steps:    {}", detail.total_steps);
    println!("Tokens:   {}", detail.total_tokens);
    if let Some(elapsed) = detail.elapsed_time {
        println!("Elapsed:  {:.2}s", elapsed);
    }
    if let Some(ref error) = detail.error
        && !error.is_empty()
    {
        println!("Error:    {}", Style::new().red().apply_to(error));
    }
    if !detail.outputs.is_null() {
        println!();
        println!("{}", serde_json::to_string_pretty(&detail.outputs)?);
    }
    Ok(())
}

//! Stop command - stop a streaming workflow task.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the stop command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Task ID, as reported by a streaming run
    pub task_id: String,

    /// End-user identifier that started the run
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Run the stop command.
pub async fn run(args: StopArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let user = ctx.user(args.user);
    let response = client.workflow().stop(&args.task_id, &user).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let green = Style::new().green();
        println!(
            "{} Task {} stopped ({})",
            green.apply_to("✓"),
            args.task_id,
            response.result
        );
    }
    Ok(())
}

//! Run command - execute a published workflow.

use anyhow::{Result, anyhow};
use clap::Args;
use console::{Style, StyledObject, style};
use dify_client::{CancellationToken, RunRequest, WorkflowStreamEvent};
use serde_json::Value;
use tracing::debug;

use super::Context;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow input (repeatable). Values that parse as JSON are sent as
    /// JSON, anything else as a string.
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,

    /// End-user identifier
    #[arg(short, long)]
    pub user: Option<String>,

    /// Stream progress events as they happen
    #[arg(long)]
    pub stream: bool,

    /// Decode event payloads as Base64
    #[arg(long, requires = "stream")]
    pub base64: bool,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let user = ctx.user(args.user);
    let mut request = RunRequest::new(user.clone());
    for (name, value) in args.inputs {
        request.inputs.insert(name, value);
    }

    if args.stream {
        run_streaming(request, args.base64, &user, ctx).await
    } else {
        run_blocking(request, ctx).await
    }
}

async fn run_blocking(request: RunRequest, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let dim = Style::new().dim();

    if ctx.verbose {
        eprintln!("{}", dim.apply_to(format!("Sending to: {}", client.base_url())));
    }

    let response = client.workflow().run(request).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "{} {}",
        status_style(&response.data.status),
        dim.apply_to(format!(
            "run {} · task {}",
            response.workflow_run_id, response.task_id
        ))
    );
    if let Some(ref error) = response.data.error
        && !error.is_empty()
    {
        println!("{} {}", Style::new().red().apply_to("Error:"), error);
    }
    if !response.data.outputs.is_null() {
        println!("{}", serde_json::to_string_pretty(&response.data.outputs)?);
    }
    Ok(())
}

async fn run_streaming(request: RunRequest, base64: bool, user: &str, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if base64 {
        config.stream.get_or_insert_with(Default::default).encoding_base64 = Some(true);
    }
    let client = super::client_for(&config)?;
    let dim = Style::new().dim();

    if ctx.verbose {
        eprintln!("{}", dim.apply_to(format!("Streaming from: {}", client.base_url())));
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut task_id: Option<String> = None;
    let mut failed: Option<String> = None;
    let json_output = ctx.json_output;

    let result = client
        .workflow()
        .run_stream(request, cancel, |event| {
            let progress = match WorkflowStreamEvent::from_event(&event) {
                Ok(progress) => progress,
                Err(e) => {
                    debug!(error = %e, "Event payload is not a workflow event");
                    if json_output {
                        println!("{}", event.data_str().unwrap_or_default());
                    }
                    return;
                }
            };
            if task_id.is_none() {
                task_id = progress.task_id.clone();
            }
            if progress.is_terminal()
                && let Some(error) = progress.data["error"].as_str()
                && !error.is_empty()
            {
                failed = Some(error.to_string());
            }
            if json_output {
                // one event per line
                if let Ok(line) = serde_json::to_string(&progress) {
                    println!("{}", line);
                }
            } else {
                print_event(&progress);
            }
        })
        .await;
    interrupt.abort();

    match result {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {
            eprintln!("{}", dim.apply_to("Interrupted"));
            if let Some(ref task_id) = task_id {
                client.workflow().stop(task_id, user).await?;
                eprintln!("{}", dim.apply_to(format!("Stopped task {}", task_id)));
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    match failed {
        Some(error) => Err(anyhow!("workflow failed: {}", error)),
        None => Ok(()),
    }
}

fn print_event(progress: &WorkflowStreamEvent) {
    let dim = Style::new().dim();
    let data = &progress.data;
    match progress.event.as_str() {
        "workflow_started" => println!(
            "{} {}",
            style("▶ workflow started").bold(),
            dim.apply_to(progress.workflow_run_id.as_deref().unwrap_or_default())
        ),
        "node_started" => println!(
            "  {} {}",
            dim.apply_to("→"),
            data["title"].as_str().unwrap_or_else(|| data["node_id"].as_str().unwrap_or("node"))
        ),
        "node_finished" => println!(
            "  {} {} {}",
            dim.apply_to("←"),
            data["title"].as_str().unwrap_or_else(|| data["node_id"].as_str().unwrap_or("node")),
            status_style(data["status"].as_str().unwrap_or("unknown"))
        ),
        "text_chunk" => print!("{}", data["text"].as_str().unwrap_or_default()),
        "workflow_finished" => {
            println!(
                "{} {}",
                style("■ workflow finished").bold(),
                status_style(data["status"].as_str().unwrap_or("unknown"))
            );
            if !data["outputs"].is_null()
                && let Ok(outputs) = serde_json::to_string_pretty(&data["outputs"])
            {
                println!("{}", outputs);
            }
        }
        "ping" => {}
        other => println!("  {}", dim.apply_to(other)),
    }
}

/// Colour a run status.
pub(crate) fn status_style(status: &str) -> StyledObject<&str> {
    match status {
        "succeeded" => Style::new().green().apply_to(status),
        "failed" => Style::new().red().apply_to(status),
        "stopped" => Style::new().yellow().apply_to(status),
        _ => Style::new().cyan().apply_to(status),
    }
}

/// Parse a `KEY=VALUE` input.
fn parse_input(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err("input name must not be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input_string() {
        assert_eq!(
            parse_input("query=hello world").unwrap(),
            ("query".to_string(), json!("hello world"))
        );
    }

    #[test]
    fn test_parse_input_json() {
        assert_eq!(parse_input("n=3").unwrap().1, json!(3));
        assert_eq!(parse_input("flag=true").unwrap().1, json!(true));
        assert_eq!(parse_input("tags=[\"a\",\"b\"]").unwrap().1, json!(["a", "b"]));
    }

    #[test]
    fn test_parse_input_keeps_later_equals() {
        assert_eq!(parse_input("expr=a=b").unwrap().1, json!("a=b"));
    }

    #[test]
    fn test_parse_input_rejects_malformed() {
        assert!(parse_input("novalue").is_err());
        assert!(parse_input("=x").is_err());
    }
}

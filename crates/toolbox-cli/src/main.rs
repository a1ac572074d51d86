//! CLI entry point for toolbox.
//!
//! This binary provides the `toolbox` command.  Each tool subcommand loads
//! configuration, connects the adapters, makes exactly one tool call, and
//! prints the reply string.

mod adapters;
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use toolbox_adapters::{Adapter, ToolsConfig, TracingObserver};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::Toolset;
use crate::cli::{Cli, Commands};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(match cli.command {
        Commands::Tools | Commands::Status => "warn",
        _ => "info",
    });

    let config =
        ToolsConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    for warning in config.validate() {
        warn!("{warning}");
    }

    let toolset = Toolset::init(&config, std::sync::Arc::new(TracingObserver))
        .await
        .context("failed to initialize adapters")?;

    match cli.command {
        Commands::Tools => cmd_tools(&toolset),
        Commands::Status => cmd_status(&config, &toolset).await,
        Commands::Call { tool, params } => {
            let params: Value = serde_json::from_str(&params)
                .with_context(|| format!("--params is not valid JSON: {params}"))?;
            run_tool(&toolset, &tool, params).await
        }
        Commands::Weather { city } => {
            run_tool(&toolset, "get_weather", json!({ "city": city })).await
        }
        Commands::Search { query } => {
            run_tool(&toolset, "search_web", json!({ "query": query })).await
        }
        Commands::Email {
            to,
            subject,
            message,
            cc,
        } => {
            let params = json!({
                "to": to,
                "subject": subject,
                "message": message,
                "cc_email": cc,
            });
            run_tool(&toolset, "send_email", params).await
        }
        Commands::Image { prompt, output } => {
            let params = json!({ "prompt": prompt, "output_file": output });
            run_tool(&toolset, "generate_image", params).await
        }
        Commands::Website {
            title,
            content,
            output,
        } => {
            let params = json!({ "title": title, "content": content, "output_file": output });
            run_tool(&toolset, "create_website", params).await
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn run_tool(toolset: &Toolset, tool: &str, params: Value) -> Result<()> {
    info!(tool, "invoking tool");
    let reply = toolset.call(tool, params).await?;
    println!("{reply}");
    Ok(())
}

fn cmd_tools(toolset: &Toolset) -> Result<()> {
    let tools = toolset.tools();
    let rendered =
        serde_json::to_string_pretty(&tools).context("failed to serialize tool definitions")?;
    println!("{rendered}");
    Ok(())
}

async fn cmd_status(config: &ToolsConfig, toolset: &Toolset) -> Result<()> {
    println!();
    println!("  toolbox status");
    println!("  ==============");
    println!();

    let configured = |ok: bool| if ok { "CONFIGURED" } else { "NOT SET" };
    println!(
        "  Gmail credentials: {}",
        configured(config.email.credentials().is_some())
    );
    println!(
        "  Google API key:    {}",
        configured(config.image.api_key().is_some())
    );
    println!("  Output directory:  {}", config.output_root().display());
    println!();

    for adapter in toolset.adapters() {
        let health = adapter.health_check().await?;
        println!("  {:<12} {health}", adapter.id());
    }
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
/// Logs go to stderr so stdout carries only tool output.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

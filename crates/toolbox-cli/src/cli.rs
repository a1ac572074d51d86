//! CLI argument definitions for toolbox.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// toolbox -- agent tools for weather, search, email, images, and web pages.
#[derive(Parser)]
#[command(
    name = "toolbox",
    version,
    about = "toolbox -- agent tools for weather, search, email, images, and web pages",
    long_about = "Runs the tool adapters a conversational agent would call. Every command \
                  prints the tool's reply exactly as the agent would receive it."
)]
pub struct Cli {
    /// Path to a TOML config file (default: config/default.toml if present).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every tool definition as JSON.
    Tools,

    /// Call any tool by name with JSON parameters.
    Call {
        /// Tool name, e.g. `get_weather`.
        tool: String,

        /// Tool parameters as a JSON object.
        #[arg(long, short, default_value = "{}")]
        params: String,
    },

    /// Current weather for a city.
    Weather {
        city: String,
    },

    /// Search the web.
    Search {
        query: String,
    },

    /// Send an email.
    Email {
        /// Recipient address.
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: String,

        /// Plain-text body.
        #[arg(long)]
        message: String,

        /// Optional CC address.
        #[arg(long)]
        cc: Option<String>,
    },

    /// Generate an image from a prompt.
    Image {
        prompt: String,

        /// Output file (default from config: generated_image.png).
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Render a one-page website.
    Website {
        #[arg(long)]
        title: String,

        /// Page body; may contain HTML.
        #[arg(long)]
        content: String,

        /// Output file (default from config: index.html).
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Show configuration and adapter health.
    Status,
}

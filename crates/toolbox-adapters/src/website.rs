//! Website adapter -- render a one-page static site and write it to disk.
//!
//! The title and content are interpolated verbatim into a fixed page (header,
//! inline CSS, content block, footer).  Content may contain markup.  The file
//! is written as UTF-8 and replaces any existing file of the same name.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use crate::config::WebsiteConfig;
use crate::error::{AdapterError, Result};
use crate::observer::{Outcome, ToolEvent, ToolObserver, default_observer};
use crate::output::OutputDir;
use crate::traits::{
    Adapter, AdapterType, AuthRequirement, HealthStatus, ToolDefinition, ensure_connected,
    optional_str, require_str,
};

/// Tool name exposed to the agent.
pub const TOOL_CREATE_WEBSITE: &str = "create_website";

/// Attribution shown in every page footer.
pub const FOOTER_TEXT: &str = "Created by your AI assistant";

const PAGE_CSS: &str = "
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            background: #f5f5f7;
            color: #1d1d1f;
            line-height: 1.6;
        }
        header {
            background: #24292e;
            color: #ffffff;
            padding: 2rem 1rem;
            text-align: center;
        }
        main {
            max-width: 800px;
            margin: 2rem auto;
            padding: 2rem;
            background: #ffffff;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0, 0, 0, 0.08);
        }
        footer {
            text-align: center;
            color: #6e6e73;
            font-size: 0.875rem;
            padding: 1rem;
        }
";

/// Render the full page.
pub fn render_page(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title}</title>
    <style>{PAGE_CSS}    </style>
</head>
<body>
    <header>
        <h1>{title}</h1>
    </header>
    <main>
        {content}
    </main>
    <footer>
        <p>{FOOTER_TEXT}</p>
    </footer>
</body>
</html>
"
    )
}

/// Static page publisher.
pub struct WebsiteAdapter {
    id: String,
    connected: bool,
    default_output: String,
    output: OutputDir,
    observer: Arc<dyn ToolObserver>,
}

impl WebsiteAdapter {
    pub fn new(id: impl Into<String>, config: &WebsiteConfig, output: OutputDir) -> Self {
        Self {
            id: id.into(),
            connected: false,
            default_output: config.default_output.clone(),
            output,
            observer: default_observer(),
        }
    }

    /// Replace the outcome observer.
    pub fn with_observer(mut self, observer: Arc<dyn ToolObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Render and write the page.  Returns the written path.
    pub async fn publish(&self, title: &str, content: &str, output_file: &str) -> Result<PathBuf> {
        let page = render_page(title, content);
        self.output
            .write(output_file, page.as_bytes(), TOOL_CREATE_WEBSITE)
            .await
    }

    /// Tool entry point: always returns the text shown to the user.
    pub async fn create_website(
        &self,
        title: &str,
        content: &str,
        output_file: Option<&str>,
    ) -> String {
        let output_file = output_file.unwrap_or(self.default_output.as_str());
        match self.publish(title, content, output_file).await {
            Ok(path) => {
                let detail = format!("website saved to {}", path.display());
                self.observer.record(&ToolEvent {
                    tool: TOOL_CREATE_WEBSITE,
                    outcome: Outcome::Success,
                    detail: &detail,
                });
                format!("Website '{title}' created and saved to {output_file}")
            }
            Err(e) => {
                let detail = format!("error creating website: {e}");
                self.observer.record(&ToolEvent {
                    tool: TOOL_CREATE_WEBSITE,
                    outcome: Outcome::Failure(e.kind()),
                    detail: &detail,
                });
                format!("An error occurred while creating website: {e}")
            }
        }
    }
}

#[async_trait]
impl Adapter for WebsiteAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Content
    }

    async fn connect(&mut self) -> Result<()> {
        info!(
            id = %self.id,
            output_dir = %self.output.root().display(),
            "website adapter connected"
        );
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "website adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        match tokio::fs::metadata(self.output.root()).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy),
            // Created on first write.
            Err(_) => Ok(HealthStatus::Degraded),
        }
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_CREATE_WEBSITE.into(),
            description: "Create a simple static web page and save it as an HTML file".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Page title" },
                    "content": {
                        "type": "string",
                        "description": "Page body; may contain HTML markup"
                    },
                    "output_file": {
                        "type": "string",
                        "description": format!("File to write (default: {})", self.default_output)
                    }
                },
                "required": ["title", "content"]
            }),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        ensure_connected(self.connected, &self.id)?;
        match name {
            TOOL_CREATE_WEBSITE => {
                let title = require_str(&params, "title", TOOL_CREATE_WEBSITE)?;
                let content = require_str(&params, "content", TOOL_CREATE_WEBSITE)?;
                let output_file = optional_str(&params, "output_file");
                Ok(Value::String(
                    self.create_website(title, content, output_file).await,
                ))
            }
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_auth(&self) -> Option<AuthRequirement> {
        None
    }
}

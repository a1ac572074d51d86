//! Shared adapter initialization.
//!
//! Every subcommand works against the same set of connected adapters; this
//! module builds them once from the loaded configuration.

use std::sync::Arc;

use anyhow::{Result, bail};
use serde_json::Value;
use toolbox_adapters::{
    Adapter, EmailAdapter, ImageAdapter, ToolDefinition, ToolObserver, ToolsConfig,
    WeatherAdapter, WebSearchAdapter, WebsiteAdapter,
};

/// All connected adapters.
pub struct Toolset {
    adapters: Vec<Box<dyn Adapter>>,
}

impl Toolset {
    /// Construct and connect one adapter per tool family.
    pub async fn init(config: &ToolsConfig, observer: Arc<dyn ToolObserver>) -> Result<Self> {
        let output = config.output();

        let mut weather = WeatherAdapter::new("weather", &config.weather)
            .with_observer(Arc::clone(&observer));
        weather.connect().await?;

        let mut search = WebSearchAdapter::new("web_search", &config.search)
            .with_observer(Arc::clone(&observer));
        search.connect().await?;

        let mut email =
            EmailAdapter::new("email", &config.email).with_observer(Arc::clone(&observer));
        email.connect().await?;

        let mut image = ImageAdapter::new("image", &config.image, output.clone())
            .with_observer(Arc::clone(&observer));
        image.connect().await?;

        let mut website = WebsiteAdapter::new("website", &config.website, output)
            .with_observer(observer);
        website.connect().await?;

        tracing::debug!("adapters initialized (weather, web_search, email, image, website)");

        Ok(Self {
            adapters: vec![
                Box::new(weather),
                Box::new(search),
                Box::new(email),
                Box::new(image),
                Box::new(website),
            ],
        })
    }

    pub fn adapters(&self) -> &[Box<dyn Adapter>] {
        &self.adapters
    }

    /// Every tool across all adapters.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.adapters.iter().flat_map(|a| a.tools()).collect()
    }

    /// Route a call to the adapter that owns `tool` and return its reply.
    pub async fn call(&self, tool: &str, params: Value) -> Result<String> {
        let Some(adapter) = self
            .adapters
            .iter()
            .find(|a| a.tools().iter().any(|t| t.name == tool))
        else {
            bail!("unknown tool `{tool}`");
        };

        let output = adapter.execute_tool(tool, params).await?;
        Ok(match output {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

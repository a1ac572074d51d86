//! Weather adapter -- one-line current conditions from a plain-text service.
//!
//! Issues `GET {base_url}/{city}?format=3` (wttr.in by default) and returns the
//! trimmed body on HTTP 200.  Anything else yields a fixed apology naming the
//! city.  One attempt per call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::config::WeatherConfig;
use crate::error::{AdapterError, Result};
use crate::observer::{Outcome, ToolEvent, ToolObserver, default_observer};
use crate::traits::{
    Adapter, AdapterType, AuthRequirement, HealthStatus, ToolDefinition, ensure_connected,
    require_str,
};

/// Tool name exposed to the agent.
pub const TOOL_GET_WEATHER: &str = "get_weather";

/// Reply used for every failure.
pub fn weather_failure_reply(city: &str) -> String {
    format!("Sorry, I couldn't fetch the weather for {city} right now.")
}

/// Weather lookup adapter.
pub struct WeatherAdapter {
    id: String,
    connected: bool,
    client: reqwest::Client,
    base_url: String,
    observer: Arc<dyn ToolObserver>,
}

impl WeatherAdapter {
    pub fn new(id: impl Into<String>, config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("toolbox/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            id: id.into(),
            connected: false,
            client,
            base_url: config.base_url.clone(),
            observer: default_observer(),
        }
    }

    /// Replace the outcome observer.
    pub fn with_observer(mut self, observer: Arc<dyn ToolObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build the request URL for `city`.  The city becomes a single,
    /// percent-encoded path segment.
    pub fn request_url(&self, city: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AdapterError::ConfigError(format!("invalid weather base URL `{}`: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                AdapterError::ConfigError(format!(
                    "weather base URL `{}` cannot take a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(city);
        url.set_query(Some("format=3"));
        Ok(url)
    }

    /// Fetch the weather line for `city`.
    pub async fn lookup(&self, city: &str) -> Result<String> {
        let url = self.request_url(city)?;
        debug!(city, url = %url, "fetching weather");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                tool_name: TOOL_GET_WEATHER.into(),
                reason: e.to_string(),
            })?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(AdapterError::RequestFailed {
                tool_name: TOOL_GET_WEATHER.into(),
                reason: format!("weather service returned status {}", response.status()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                tool_name: TOOL_GET_WEATHER.into(),
                reason: format!("failed to read weather response: {e}"),
            })?;

        Ok(body.trim().to_string())
    }

    /// Tool entry point: always returns the text shown to the user.
    pub async fn get_weather(&self, city: &str) -> String {
        match self.lookup(city).await {
            Ok(report) => {
                self.observer.record(&ToolEvent {
                    tool: TOOL_GET_WEATHER,
                    outcome: Outcome::Success,
                    detail: &report,
                });
                report
            }
            Err(e) => {
                let detail = format!("weather for {city}: {e}");
                self.observer.record(&ToolEvent {
                    tool: TOOL_GET_WEATHER,
                    outcome: Outcome::Failure(e.kind()),
                    detail: &detail,
                });
                weather_failure_reply(city)
            }
        }
    }
}

#[async_trait]
impl Adapter for WeatherAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Information
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, base_url = %self.base_url, "weather adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "weather adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        match Url::parse(&self.base_url) {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(_) => Ok(HealthStatus::Unhealthy),
        }
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_GET_WEATHER.into(),
            description: "Get the weather in a given city".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": { "type": "string", "description": "Name of the city" }
                },
                "required": ["city"]
            }),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        ensure_connected(self.connected, &self.id)?;
        match name {
            TOOL_GET_WEATHER => {
                let city = require_str(&params, "city", TOOL_GET_WEATHER)?;
                Ok(Value::String(self.get_weather(city).await))
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Core adapter trait and supporting types.
//!
//! Every tool adapter (weather, search, email, image, website) implements the
//! [`Adapter`] trait, giving the hosting agent runtime a uniform way to
//! discover tools and invoke them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdapterError, Result};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// The category of service an adapter provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    /// Outbound messaging (email).
    Messaging,
    /// Read-only lookups against public services (weather, search).
    Information,
    /// Tools that produce files (images, web pages).
    Content,
}

impl std::fmt::Display for AdapterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Messaging => write!(f, "messaging"),
            Self::Information => write!(f, "information"),
            Self::Content => write!(f, "content"),
        }
    }
}

/// The health status of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The adapter is fully operational.
    Healthy,
    /// The adapter is connected but missing something it needs, such as a
    /// credential.  Calls will answer with a configuration error.
    Degraded,
    /// The adapter is not functional.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// A tool exposed by an adapter that the agent can invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Machine-readable tool name (e.g. `get_weather`, `send_email`).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    pub parameters: Value,
}

/// Credentials an adapter needs before it can do useful work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequirement {
    /// The credential provider name (e.g. `gmail`, `google`).
    pub provider: String,
    /// Environment variables that supply the credential.
    pub env_vars: Vec<String>,
}

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// The universal adapter interface.
///
/// The host discovers tools via [`Adapter::tools`] and runs them via
/// [`Adapter::execute_tool`].  A tool's output is always a single
/// human-readable string, returned as a JSON string value.  Failures of the
/// underlying service are part of that string; only dispatch problems
/// (unknown tool, malformed parameters, adapter not connected) come back as
/// `Err`.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Return the unique identifier for this adapter instance.
    fn id(&self) -> &str;

    /// Return the category of service this adapter provides.
    fn adapter_type(&self) -> AdapterType;

    /// Mark the adapter ready for use.
    async fn connect(&mut self) -> Result<()>;

    /// Mark the adapter as no longer available.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check whether the adapter is healthy and operational.
    async fn health_check(&self) -> Result<HealthStatus>;

    /// Return the list of tools this adapter exposes.
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Execute a named tool with the given JSON parameters.
    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value>;

    /// Return the credentials this adapter needs, if any.
    fn required_auth(&self) -> Option<AuthRequirement>;
}

// ---------------------------------------------------------------------------
// Parameter helpers
// ---------------------------------------------------------------------------

/// Extract a required string field from JSON params.
pub(crate) fn require_str<'a>(params: &'a Value, field: &str, tool_name: &str) -> Result<&'a str> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AdapterError::InvalidParams {
            tool_name: tool_name.to_string(),
            reason: format!("missing required string field `{field}`"),
        })
}

/// Extract an optional string field, treating `null` and `""` as absent.
pub(crate) fn optional_str<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Guard used at the top of every `execute_tool`.
pub(crate) fn ensure_connected(connected: bool, adapter_id: &str) -> Result<()> {
    if connected {
        Ok(())
    } else {
        Err(AdapterError::NotConnected {
            adapter_id: adapter_id.to_string(),
        })
    }
}

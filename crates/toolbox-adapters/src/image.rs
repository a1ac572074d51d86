//! Image generation adapter -- prompt in, decoded image file out.
//!
//! The generative model is called once with fixed sampling parameters.  The
//! first candidate's first content part carries the image as base64; it is
//! decoded and written to the output file, replacing any previous file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{ENV_GOOGLE_API_KEY, ImageConfig};
use crate::error::{AdapterError, ErrorKind, Result};
use crate::observer::{Outcome, ToolEvent, ToolObserver, default_observer};
use crate::output::OutputDir;
use crate::traits::{
    Adapter, AdapterType, AuthRequirement, HealthStatus, ToolDefinition, ensure_connected,
    optional_str, require_str,
};

/// Tool name exposed to the agent.
pub const TOOL_GENERATE_IMAGE: &str = "generate_image";

/// Reply when no API key is configured.
pub const IMAGE_CONFIG_ERROR_REPLY: &str = "Error: GOOGLE_API_KEY must be set";

/// Reply when the model returns no candidates.
pub const NO_IMAGE_REPLY: &str = "Sorry, I couldn't generate an image for that prompt.";

// ═══════════════════════════════════════════════════════════════════════
//  Wire types
// ═══════════════════════════════════════════════════════════════════════

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl From<&ImageConfig> for SamplingConfig {
    fn from(config: &ImageConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
        }
    }
}

/// Body of a `generateContent` call.
pub fn request_body(prompt: &str, sampling: &SamplingConfig) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": sampling,
    })
}

/// The parts of a `generateContent` response this adapter reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

impl Candidate {
    /// Base64 payload of the first content part: its text, or its inline
    /// data when the part carries no text.
    pub fn first_payload(&self) -> Option<&str> {
        let part = self.content.as_ref()?.parts.first()?;
        part.text
            .as_deref()
            .or_else(|| part.inline_data.as_ref().map(|d| d.data.as_str()))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Model
// ═══════════════════════════════════════════════════════════════════════

/// A generative model that answers a prompt with candidates.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        sampling: &SamplingConfig,
    ) -> Result<GenerateResponse>;
}

/// Google Generative Language API (`models/{model}:generateContent`).
pub struct GeminiImageModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiImageModel {
    pub fn new(config: &ImageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageModel for GeminiImageModel {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        sampling: &SamplingConfig,
    ) -> Result<GenerateResponse> {
        let endpoint = self.endpoint();
        debug!(model = %self.model, endpoint = %endpoint, "calling generative model");

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request_body(prompt, sampling))
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                tool_name: TOOL_GENERATE_IMAGE.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::RequestFailed {
                tool_name: TOOL_GENERATE_IMAGE.into(),
                reason: format!("generative API returned status {status}: {body}"),
            });
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| AdapterError::InvalidPayload {
                tool_name: TOOL_GENERATE_IMAGE.into(),
                reason: format!("failed to parse generative API response: {e}"),
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Adapter
// ═══════════════════════════════════════════════════════════════════════

/// Result of a generation attempt that reached the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Decoded bytes were written to this path.
    Saved(PathBuf),
    /// The model answered with zero candidates.
    NoCandidates,
}

/// Image generation adapter.
pub struct ImageAdapter {
    id: String,
    connected: bool,
    api_key: Option<String>,
    sampling: SamplingConfig,
    default_output: String,
    output: OutputDir,
    model: Arc<dyn ImageModel>,
    observer: Arc<dyn ToolObserver>,
}

impl ImageAdapter {
    /// Create an adapter backed by the Gemini API.
    pub fn new(id: impl Into<String>, config: &ImageConfig, output: OutputDir) -> Self {
        Self::with_model(id, config, output, Arc::new(GeminiImageModel::new(config)))
    }

    /// Create an adapter over any model.
    pub fn with_model(
        id: impl Into<String>,
        config: &ImageConfig,
        output: OutputDir,
        model: Arc<dyn ImageModel>,
    ) -> Self {
        Self {
            id: id.into(),
            connected: false,
            api_key: config.api_key().map(str::to_string),
            sampling: SamplingConfig::from(config),
            default_output: config.default_output.clone(),
            output,
            model,
            observer: default_observer(),
        }
    }

    /// Replace the outcome observer.
    pub fn with_observer(mut self, observer: Arc<dyn ToolObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Generate an image for `prompt` and write it to `output_file`.
    pub async fn generate(&self, prompt: &str, output_file: &str) -> Result<GeneratedImage> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AdapterError::ConfigError(format!(
                "{ENV_GOOGLE_API_KEY} must be set"
            )));
        };
        let target = self.output.resolve(output_file, TOOL_GENERATE_IMAGE)?;

        let response = self.model.generate(api_key, prompt, &self.sampling).await?;
        let Some(candidate) = response.candidates.first() else {
            return Ok(GeneratedImage::NoCandidates);
        };

        let payload = candidate
            .first_payload()
            .ok_or_else(|| AdapterError::InvalidPayload {
                tool_name: TOOL_GENERATE_IMAGE.into(),
                reason: "first candidate has no content part".into(),
            })?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| AdapterError::InvalidPayload {
                tool_name: TOOL_GENERATE_IMAGE.into(),
                reason: format!("image payload is not valid base64: {e}"),
            })?;

        self.output.write_resolved(&target, &bytes).await?;
        Ok(GeneratedImage::Saved(target))
    }

    /// Tool entry point: always returns the text shown to the user.
    pub async fn generate_image(&self, prompt: &str, output_file: Option<&str>) -> String {
        let output_file = output_file.unwrap_or(self.default_output.as_str());
        let result = self.generate(prompt, output_file).await;

        let (outcome, detail) = match &result {
            Ok(GeneratedImage::Saved(path)) => {
                (Outcome::Success, format!("image saved to {}", path.display()))
            }
            Ok(GeneratedImage::NoCandidates) => (
                Outcome::Failure(ErrorKind::Data),
                format!("no candidates returned for prompt: {prompt}"),
            ),
            Err(e) => (Outcome::Failure(e.kind()), format!("error generating image: {e}")),
        };
        self.observer.record(&ToolEvent {
            tool: TOOL_GENERATE_IMAGE,
            outcome,
            detail: &detail,
        });

        match result {
            Ok(GeneratedImage::Saved(_)) => format!("Image generated and saved to {output_file}"),
            Ok(GeneratedImage::NoCandidates) => NO_IMAGE_REPLY.to_string(),
            Err(AdapterError::ConfigError(_)) => IMAGE_CONFIG_ERROR_REPLY.to_string(),
            Err(e) => format!("An error occurred while generating image: {e}"),
        }
    }
}

#[async_trait]
impl Adapter for ImageAdapter {
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
            "image adapter connected"
        );
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "image adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        if self.api_key.is_none() {
            return Ok(HealthStatus::Degraded);
        }
        Ok(HealthStatus::Healthy)
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_GENERATE_IMAGE.into(),
            description: "Generate an image from a text prompt and save it to a file".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string", "description": "Description of the image" },
                    "output_file": {
                        "type": "string",
                        "description": format!("File to write (default: {})", self.default_output)
                    }
                },
                "required": ["prompt"]
            }),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        ensure_connected(self.connected, &self.id)?;
        match name {
            TOOL_GENERATE_IMAGE => {
                let prompt = require_str(&params, "prompt", TOOL_GENERATE_IMAGE)?;
                let output_file = optional_str(&params, "output_file");
                Ok(Value::String(self.generate_image(prompt, output_file).await))
            }
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_auth(&self) -> Option<AuthRequirement> {
        Some(AuthRequirement {
            provider: "google".into(),
            env_vars: vec![ENV_GOOGLE_API_KEY.into()],
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

//! Adapter configuration.
//!
//! [`ToolsConfig`] is built once at startup: defaults, then an optional TOML
//! file, then environment overrides.  Adapters receive their section at
//! construction and never read the environment themselves.
//!
//! ```toml
//! output_dir = "out"
//!
//! [email]
//! smtp_host = "smtp.gmail.com"
//! smtp_port = 587
//!
//! [image]
//! model = "gemini-2.0-flash-exp"
//! temperature = 1.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AdapterError, Result};
use crate::output::OutputDir;

/// Config file consulted when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub const ENV_GMAIL_USER: &str = "GMAIL_USER";
pub const ENV_GMAIL_PASSWORD: &str = "GMAIL_PASSWORD";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_OUTPUT_DIR: &str = "TOOLBOX_OUTPUT_DIR";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Top-level configuration for all adapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory that image and website outputs are resolved against.
    /// `None` means the process working directory.
    pub output_dir: Option<PathBuf>,
    pub weather: WeatherConfig,
    pub search: SearchConfig,
    pub email: EmailConfig,
    pub image: ImageConfig,
    pub website: WebsiteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the plain-text weather service.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wttr.in".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// DuckDuckGo HTML endpoint.
    pub endpoint: String,
    /// Upper bound on snippets joined into one result.
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".into(),
            max_results: 10,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address and SMTP login (`GMAIL_USER`).
    pub user: Option<String>,
    /// SMTP password or app password (`GMAIL_PASSWORD`).
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 587,
            user: None,
            password: None,
        }
    }
}

impl EmailConfig {
    /// Both credentials, if both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.user.as_deref().filter(|s| !s.is_empty())?;
        let password = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((user, password))
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Generative API key (`GOOGLE_API_KEY`).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub default_output: String,
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.0-flash-exp".into(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            default_output: "generated_image.png".into(),
            timeout_secs: 120,
        }
    }
}

impl ImageConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for ImageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("default_output", &self.default_output)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    pub default_output: String,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            default_output: "index.html".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ToolsConfig {
    /// Parse a TOML document.  Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AdapterError::ConfigError(format!("failed to parse TOML config: {e}")))
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist.  Without one, [`DEFAULT_CONFIG_PATH`] is
    /// used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::ConfigError(format!(
                "failed to read config file `{}`: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "configuration loaded from file");
        Ok(config)
    }

    /// Override credentials and the output directory from the process
    /// environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Override from an arbitrary lookup.  Empty values count as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(user) = get(ENV_GMAIL_USER) {
            self.email.user = Some(user);
        }
        if let Some(password) = get(ENV_GMAIL_PASSWORD) {
            self.email.password = Some(password);
        }
        if let Some(key) = get(ENV_GOOGLE_API_KEY) {
            self.image.api_key = Some(key);
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            self.output_dir = Some(PathBuf::from(dir));
        }
    }

    /// Startup validation.  Returns one warning per missing credential; the
    /// affected adapters still load and answer with a configuration error.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.email.credentials().is_none() {
            warnings.push(format!(
                "{ENV_GMAIL_USER} and {ENV_GMAIL_PASSWORD} must be set to send email"
            ));
        }
        if self.image.api_key().is_none() {
            warnings.push(format!("{ENV_GOOGLE_API_KEY} must be set to generate images"));
        }
        warnings
    }

    /// The directory outputs are written under.
    pub fn output_root(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Output placement for the file-writing tools.  An explicitly configured
    /// `output_dir` confines writes to that directory; the default working
    /// directory only anchors relative paths.
    pub fn output(&self) -> OutputDir {
        match &self.output_dir {
            Some(dir) => OutputDir::confined(dir.clone()),
            None => OutputDir::new(self.output_root()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_public_endpoints() {
        let config = ToolsConfig::default();
        assert_eq!(config.weather.base_url, "https://wttr.in");
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.image.default_output, "generated_image.png");
        assert_eq!(config.website.default_output, "index.html");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ToolsConfig::from_toml_str(
            r#"
            output_dir = "/srv/out"

            [image]
            top_k = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/out")));
        assert_eq!(config.image.top_k, 32);
        assert_eq!(config.image.top_p, 0.95);
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = ToolsConfig::from_toml_str("[email\nsmtp_port = ").unwrap_err();
        assert!(matches!(err, AdapterError::ConfigError(_)));
    }

    #[test]
    fn env_overrides_credentials() {
        let mut config = ToolsConfig::default();
        config.apply_env_from(lookup(&[
            (ENV_GMAIL_USER, "me@gmail.com"),
            (ENV_GMAIL_PASSWORD, "app-password"),
            (ENV_GOOGLE_API_KEY, "key-123"),
        ]));
        assert_eq!(config.email.credentials(), Some(("me@gmail.com", "app-password")));
        assert_eq!(config.image.api_key(), Some("key-123"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn empty_env_values_count_as_unset() {
        let mut config = ToolsConfig::default();
        config.apply_env_from(lookup(&[(ENV_GMAIL_USER, "me@gmail.com"), (ENV_GMAIL_PASSWORD, "")]));
        assert!(config.email.credentials().is_none());
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = ToolsConfig::default();
        config.email.password = Some("hunter2".into());
        config.image.api_key = Some("secret-key".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn explicit_output_dir_confines_writes() {
        let mut config = ToolsConfig::default();
        assert!(!config.output().is_confined());

        config.apply_env_from(lookup(&[(ENV_OUTPUT_DIR, "/srv/toolbox-out")]));
        let output = config.output();
        assert!(output.is_confined());
        assert!(output.resolve("../escape.html", "create_website").is_err());
    }

    #[test]
    fn load_rejects_missing_explicit_file() {
        let err = ToolsConfig::load(Some(Path::new("/nonexistent/toolbox.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}

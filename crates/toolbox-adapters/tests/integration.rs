//! Integration tests for the toolbox-adapters crate.
//!
//! These exercise the adapters through the [`Adapter`] trait the way a host
//! would: discover tools, connect, dispatch by name with JSON parameters, and
//! read back the string reply.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use toolbox_adapters::config::{EmailConfig, ImageConfig, SearchConfig, WeatherConfig, WebsiteConfig};
use toolbox_adapters::email::SmtpCredentials;
use toolbox_adapters::image::{Candidate, Content, GenerateResponse, Part, SamplingConfig};
use toolbox_adapters::{
    Adapter, AdapterError, EmailAdapter, HealthStatus, ImageAdapter, ImageModel, MailTransport,
    MemoryObserver, OutboundMessage, OutputDir, Outcome, SearchBackend, ToolsConfig,
    WeatherAdapter, WebSearchAdapter, WebsiteAdapter,
};

/// On macOS, tempfile returns `/var/folders/...` but the filesystem
/// canonicalizes to `/private/var/folders/...`.
fn canon_tempdir() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let canon = dir.path().canonicalize().unwrap();
    (dir, canon)
}

fn reply(value: Value) -> String {
    value.as_str().expect("tool replies are strings").to_string()
}

// ═══════════════════════════════════════════════════════════════════════
//  Fakes
// ═══════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(
        &self,
        _credentials: &SmtpCredentials,
        message: &OutboundMessage,
    ) -> toolbox_adapters::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(message.recipients().into_iter().map(String::from).collect());
        Ok(())
    }
}

struct EchoBackend;

#[async_trait]
impl SearchBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn search(&self, query: &str) -> toolbox_adapters::Result<String> {
        Ok(format!("results for {query}"))
    }
}

struct PixelModel;

#[async_trait]
impl ImageModel for PixelModel {
    async fn generate(
        &self,
        _api_key: &str,
        _prompt: &str,
        _sampling: &SamplingConfig,
    ) -> toolbox_adapters::Result<GenerateResponse> {
        Ok(GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    parts: vec![Part {
                        // "PIXEL"
                        text: Some("UElYRUw=".into()),
                        inline_data: None,
                    }],
                }),
            }],
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Email
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn email_dispatch_with_and_without_cc() {
    let mut config = ToolsConfig::default();
    config.apply_env_from(|name| match name {
        "GMAIL_USER" => Some("bot@gmail.com".into()),
        "GMAIL_PASSWORD" => Some("app-password".into()),
        _ => None,
    });

    let transport = Arc::new(RecordingTransport::default());
    let mut adapter = EmailAdapter::with_transport("email", &config.email, transport.clone());
    adapter.connect().await.unwrap();
    assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);

    let out = adapter
        .execute_tool(
            "send_email",
            json!({
                "to": "a@x.com",
                "subject": "Lunch",
                "message": "Noon?",
                "cc_email": "b@x.com"
            }),
        )
        .await
        .unwrap();
    assert_eq!(reply(out), "Email sent successfully to a@x.com");

    adapter
        .execute_tool(
            "send_email",
            json!({ "to": "a@x.com", "subject": "Lunch", "message": "Noon?" }),
        )
        .await
        .unwrap();

    let sent = transport.sent.lock().unwrap().clone();
    assert_eq!(sent, vec![vec!["a@x.com", "b@x.com"], vec!["a@x.com"]]);
}

#[tokio::test]
async fn email_without_credentials_makes_no_transport_call() {
    let transport = Arc::new(RecordingTransport::default());
    let mut adapter =
        EmailAdapter::with_transport("email", &EmailConfig::default(), transport.clone());
    adapter.connect().await.unwrap();

    let out = adapter
        .execute_tool(
            "send_email",
            json!({ "to": "a@x.com", "subject": "s", "message": "m" }),
        )
        .await
        .unwrap();

    assert_eq!(reply(out), "Error: GMAIL_USER and GMAIL_PASSWORD must be set");
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn email_missing_params_is_a_dispatch_error() {
    let transport = Arc::new(RecordingTransport::default());
    let mut adapter = EmailAdapter::with_transport("email", &EmailConfig::default(), transport);
    adapter.connect().await.unwrap();

    let result = adapter
        .execute_tool("send_email", json!({ "to": "a@x.com" }))
        .await;
    assert!(matches!(result, Err(AdapterError::InvalidParams { .. })));
}

// ═══════════════════════════════════════════════════════════════════════
//  Search
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn search_dispatch_returns_backend_text() {
    let mut adapter = WebSearchAdapter::with_backend("search", Arc::new(EchoBackend));
    adapter.connect().await.unwrap();

    let out = adapter
        .execute_tool("search_web", json!({ "query": "rust async" }))
        .await
        .unwrap();
    assert_eq!(reply(out), "results for rust async");
}

#[tokio::test]
async fn default_search_adapter_exposes_one_tool() {
    let adapter = WebSearchAdapter::new("search", &SearchConfig::default());
    let tools = adapter.tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "search_web");
    assert_eq!(tools[0].parameters["required"], json!(["query"]));
}

// ═══════════════════════════════════════════════════════════════════════
//  Image + website
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn image_dispatch_writes_decoded_bytes() {
    let (_dir, canon) = canon_tempdir();
    let config = ImageConfig {
        api_key: Some("key".into()),
        ..ImageConfig::default()
    };
    let observer = Arc::new(MemoryObserver::new());
    let mut adapter =
        ImageAdapter::with_model("image", &config, OutputDir::new(&canon), Arc::new(PixelModel))
            .with_observer(observer.clone());
    adapter.connect().await.unwrap();

    let out = adapter
        .execute_tool(
            "generate_image",
            json!({ "prompt": "a pixel", "output_file": "art/pixel.png" }),
        )
        .await
        .unwrap();

    assert_eq!(reply(out), "Image generated and saved to art/pixel.png");
    assert_eq!(std::fs::read(canon.join("art/pixel.png")).unwrap(), b"PIXEL");
    assert_eq!(observer.events()[0].outcome, Outcome::Success);
}

#[tokio::test]
async fn image_output_outside_confined_root_is_refused() {
    let (_dir, canon) = canon_tempdir();
    let config = ImageConfig {
        api_key: Some("key".into()),
        ..ImageConfig::default()
    };
    let mut adapter = ImageAdapter::with_model(
        "image",
        &config,
        OutputDir::confined(&canon),
        Arc::new(PixelModel),
    );
    adapter.connect().await.unwrap();

    let out = adapter
        .execute_tool(
            "generate_image",
            json!({ "prompt": "x", "output_file": "../../escape.png" }),
        )
        .await
        .unwrap();
    let text = reply(out);
    assert!(text.starts_with("An error occurred while generating image:"));
    assert!(text.contains("outside the output directory"));
}

#[tokio::test]
async fn image_absolute_output_is_written_as_given() {
    let (_dir, canon) = canon_tempdir();
    let (_elsewhere, other) = canon_tempdir();
    let config = ImageConfig {
        api_key: Some("key".into()),
        ..ImageConfig::default()
    };
    let mut adapter =
        ImageAdapter::with_model("image", &config, OutputDir::new(&canon), Arc::new(PixelModel));
    adapter.connect().await.unwrap();

    let target = other.join("pixel.png");
    let target_str = target.to_str().unwrap();
    let out = adapter
        .execute_tool(
            "generate_image",
            json!({ "prompt": "x", "output_file": target_str }),
        )
        .await
        .unwrap();
    assert_eq!(reply(out), format!("Image generated and saved to {target_str}"));
    assert_eq!(std::fs::read(&target).unwrap(), b"PIXEL");
}

#[tokio::test]
async fn website_writes_outside_default_root() {
    let (_dir, canon) = canon_tempdir();
    let nested = canon.join("work");
    std::fs::create_dir(&nested).unwrap();
    let (_elsewhere, other) = canon_tempdir();
    let mut adapter =
        WebsiteAdapter::new("website", &WebsiteConfig::default(), OutputDir::new(&nested));
    adapter.connect().await.unwrap();

    let absolute = other.join("site.html");
    let absolute_str = absolute.to_str().unwrap();
    let out = adapter
        .execute_tool(
            "create_website",
            json!({ "title": "T", "content": "C", "output_file": absolute_str }),
        )
        .await
        .unwrap();
    assert_eq!(reply(out), format!("Website 'T' created and saved to {absolute_str}"));
    assert!(absolute.exists());

    let out = adapter
        .execute_tool(
            "create_website",
            json!({ "title": "T", "content": "C", "output_file": "../sibling.html" }),
        )
        .await
        .unwrap();
    assert_eq!(reply(out), "Website 'T' created and saved to ../sibling.html");
    assert!(canon.join("sibling.html").exists());
}

#[tokio::test]
async fn website_dispatch_uses_default_filename() {
    let (_dir, canon) = canon_tempdir();
    let mut adapter =
        WebsiteAdapter::new("website", &WebsiteConfig::default(), OutputDir::new(&canon));
    adapter.connect().await.unwrap();
    assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);

    let out = adapter
        .execute_tool(
            "create_website",
            json!({ "title": "Garden Club", "content": "<ul><li>Tomatoes</li></ul>" }),
        )
        .await
        .unwrap();
    assert_eq!(reply(out), "Website 'Garden Club' created and saved to index.html");

    let page = std::fs::read_to_string(canon.join("index.html")).unwrap();
    assert!(page.contains("Garden Club"));
    assert!(page.contains("<ul><li>Tomatoes</li></ul>"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn adapters_refuse_calls_after_disconnect() {
    let mut adapter = WeatherAdapter::new("weather", &WeatherConfig::default());
    adapter.connect().await.unwrap();
    assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);

    adapter.disconnect().await.unwrap();
    assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Unhealthy);

    let result = adapter
        .execute_tool("get_weather", json!({ "city": "Paris" }))
        .await;
    assert!(matches!(result, Err(AdapterError::NotConnected { .. })));
}

#[tokio::test]
async fn tool_names_are_unique_across_adapters() {
    let (_dir, canon) = canon_tempdir();
    let config = ToolsConfig::default();
    let output = OutputDir::new(&canon);
    let adapters: Vec<Box<dyn Adapter>> = vec![
        Box::new(WeatherAdapter::new("weather", &config.weather)),
        Box::new(WebSearchAdapter::new("search", &config.search)),
        Box::new(EmailAdapter::new("email", &config.email)),
        Box::new(ImageAdapter::new("image", &config.image, output.clone())),
        Box::new(WebsiteAdapter::new("website", &config.website, output)),
    ];

    let mut names: Vec<String> = adapters
        .iter()
        .flat_map(|a| a.tools().into_iter().map(|t| t.name))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["create_website", "generate_image", "get_weather", "search_web", "send_email"]
    );
}

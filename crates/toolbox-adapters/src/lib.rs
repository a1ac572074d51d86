//! Tool adapters for conversational agents -- weather, web search, email,
//! image generation, and static web pages.
//!
//! Each adapter implements the [`Adapter`] trait defined in [`traits`] and
//! answers every tool call with a single human-readable string.  Outcomes are
//! reported through an injected [`ToolObserver`].

pub mod config;
pub mod email;
pub mod error;
pub mod image;
pub mod observer;
pub mod output;
pub mod traits;
pub mod weather;
pub mod web_search;
pub mod website;

pub use config::ToolsConfig;
pub use email::{EmailAdapter, MailTransport, OutboundMessage, StartTlsTransport};
pub use error::{AdapterError, ErrorKind, Result};
pub use image::{GeminiImageModel, ImageAdapter, ImageModel};
pub use observer::{MemoryObserver, Outcome, ToolEvent, ToolObserver, TracingObserver};
pub use output::OutputDir;
pub use traits::{Adapter, AdapterType, AuthRequirement, HealthStatus, ToolDefinition};
pub use weather::WeatherAdapter;
pub use web_search::{DuckDuckGoBackend, SearchBackend, WebSearchAdapter};
pub use website::WebsiteAdapter;

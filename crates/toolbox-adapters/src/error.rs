//! Adapter error types.
//!
//! Every adapter surfaces failures through [`AdapterError`].  The variants form
//! a closed set that [`AdapterError::kind`] collapses into four classes, which
//! is all the tool boundary needs to pick the reply shown to the user.

/// Coarse classification of an adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required credential or setting is missing.  Detected before any I/O.
    Configuration,
    /// The remote side refused or failed: non-2xx status, SMTP error,
    /// rejected authentication.
    Transport,
    /// The remote side answered but the payload was missing or malformed.
    Data,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Transport => write!(f, "transport"),
            Self::Data => write!(f, "data"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Unified error type for toolbox adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// An I/O operation failed within the adapter.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// The requested tool does not exist on this adapter.
    #[error("tool not found: `{tool_name}` on adapter `{adapter_id}`")]
    ToolNotFound {
        adapter_id: String,
        tool_name: String,
    },

    /// The parameters supplied to a tool are invalid.
    #[error("invalid parameters for tool `{tool_name}`: {reason}")]
    InvalidParams { tool_name: String, reason: String },

    /// The adapter has not been connected yet.
    #[error("adapter `{adapter_id}` is not connected")]
    NotConnected { adapter_id: String },

    /// A required credential or setting is absent.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// An HTTP request could not be completed or returned a non-success status.
    #[error("request failed for tool `{tool_name}`: {reason}")]
    RequestFailed { tool_name: String, reason: String },

    /// The SMTP server rejected the supplied credentials.
    #[error("authentication rejected: {0}")]
    AuthenticationFailed(String),

    /// The SMTP server answered with an error during the session.
    #[error("{0}")]
    Protocol(String),

    /// The remote response lacked the expected payload or could not be decoded.
    #[error("unexpected payload for tool `{tool_name}`: {reason}")]
    InvalidPayload { tool_name: String, reason: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.  Prefer a typed variant
    /// whenever possible.
    #[error("{0}")]
    Internal(String),
}

impl AdapterError {
    /// Collapse this error into its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) => ErrorKind::Configuration,
            Self::RequestFailed { .. } | Self::AuthenticationFailed(_) | Self::Protocol(_) => {
                ErrorKind::Transport
            }
            Self::InvalidPayload { .. } | Self::SerializationError(_) => ErrorKind::Data,
            Self::IoError(_)
            | Self::ToolNotFound { .. }
            | Self::InvalidParams { .. }
            | Self::NotConnected { .. }
            | Self::Internal(_) => ErrorKind::Unknown,
        }
    }
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

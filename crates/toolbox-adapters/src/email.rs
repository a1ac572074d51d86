//! Email adapter -- send a plain-text message over authenticated SMTP.
//!
//! One tool, `send_email`.  Each call builds an [`OutboundMessage`], opens a
//! fresh STARTTLS session (smtp.gmail.com:587 by default), logs in, sends to
//! the primary recipient plus the optional CC, and closes the session.  There
//! is no connection pool and no retry.
//!
//! The reply distinguishes four outcomes: missing credentials (no network
//! attempt is made), rejected authentication, any other SMTP error, and
//! everything else.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{ENV_GMAIL_PASSWORD, ENV_GMAIL_USER, EmailConfig};
use crate::error::{AdapterError, Result};
use crate::observer::{Outcome, ToolEvent, ToolObserver, default_observer};
use crate::traits::{
    Adapter, AdapterType, AuthRequirement, HealthStatus, ToolDefinition, ensure_connected,
    optional_str, require_str,
};

/// Tool name exposed to the agent.
pub const TOOL_SEND_EMAIL: &str = "send_email";

/// Reply when either credential is missing.
pub const CONFIG_ERROR_REPLY: &str = "Error: GMAIL_USER and GMAIL_PASSWORD must be set";

/// Reply when the server rejects the login.
pub const AUTH_ERROR_REPLY: &str =
    "Email sending failed: Authentication error. Please check your Gmail credentials.";

/// SMTP reply codes that mean the login itself was refused.
const AUTH_REJECTED_CODES: [&str; 2] = ["534", "535"];

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single outgoing email, built per call and discarded after sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cc: None,
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Attach a CC address.  Empty strings are ignored.
    pub fn with_cc(mut self, cc: Option<&str>) -> Self {
        self.cc = cc.filter(|c| !c.is_empty()).map(str::to_string);
        self
    }

    /// Envelope recipients: the primary recipient, then the CC if any.
    pub fn recipients(&self) -> Vec<&str> {
        let mut recipients = vec![self.to.as_str()];
        if let Some(cc) = &self.cc {
            recipients.push(cc.as_str());
        }
        recipients
    }

    /// SMTP envelope carrying the full recipient list.
    pub fn envelope(&self) -> Result<Envelope> {
        let from = parse_address(&self.from, "from")?;
        let recipients = self
            .recipients()
            .into_iter()
            .map(|r| parse_address(r, "recipient"))
            .collect::<Result<Vec<_>>>()?;
        Envelope::new(Some(from), recipients).map_err(|e| AdapterError::InvalidParams {
            tool_name: TOOL_SEND_EMAIL.into(),
            reason: format!("invalid envelope: {e}"),
        })
    }

    /// Build the `multipart/mixed` message with a single `text/plain` part.
    pub fn to_message(&self) -> Result<Message> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.from, "from")?)
            .to(parse_mailbox(&self.to, "to")?)
            .subject(self.subject.clone());

        if let Some(cc) = &self.cc {
            builder = builder.cc(parse_mailbox(cc, "cc_email")?);
        }

        builder
            .multipart(MultiPart::mixed().singlepart(SinglePart::plain(self.body.clone())))
            .map_err(|e| AdapterError::Internal(format!("failed to build email message: {e}")))
    }
}

fn parse_mailbox(raw: &str, field: &str) -> Result<Mailbox> {
    Mailbox::from_str(raw.trim()).map_err(|e| AdapterError::InvalidParams {
        tool_name: TOOL_SEND_EMAIL.into(),
        reason: format!("invalid `{field}` address `{raw}`: {e}"),
    })
}

fn parse_address(raw: &str, field: &str) -> Result<Address> {
    Ok(parse_mailbox(raw, field)?.email)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// SMTP login pair.  Never printed.
#[derive(Clone)]
pub struct SmtpCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Delivers one message per call over its own session.
///
/// Implementations report a refused login as
/// [`AdapterError::AuthenticationFailed`] and other server-side SMTP errors as
/// [`AdapterError::Protocol`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, credentials: &SmtpCredentials, message: &OutboundMessage) -> Result<()>;
}

/// STARTTLS relay built with `lettre`.  A new connection is opened for every
/// message and closed once it is sent.
#[derive(Debug, Clone)]
pub struct StartTlsTransport {
    host: String,
    port: u16,
    plaintext: bool,
}

impl StartTlsTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            plaintext: false,
        }
    }

    /// Unencrypted session for local test servers.
    #[cfg(test)]
    fn plaintext(host: impl Into<String>, port: u16) -> Self {
        Self {
            plaintext: true,
            ..Self::new(host, port)
        }
    }
}

#[async_trait]
impl MailTransport for StartTlsTransport {
    async fn send(&self, credentials: &SmtpCredentials, message: &OutboundMessage) -> Result<()> {
        let envelope = message.envelope()?;
        let email = message.to_message()?;

        let builder = if self.plaintext {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
                .map_err(classify_smtp_error)?
        };
        let transport = builder
            .port(self.port)
            .credentials(Credentials::new(
                credentials.user.clone(),
                credentials.password.clone(),
            ))
            .build();

        debug!(
            host = %self.host,
            port = self.port,
            recipients = envelope.to().len(),
            "sending email over STARTTLS"
        );
        transport
            .send_raw(&envelope, &email.formatted())
            .await
            .map_err(classify_smtp_error)?;
        Ok(())
    }
}

/// Sort a `lettre` SMTP error into authentication, protocol, or other.
fn classify_smtp_error(err: lettre::transport::smtp::Error) -> AdapterError {
    if let Some(code) = err.status() {
        let code = code.to_string();
        if AUTH_REJECTED_CODES.contains(&code.as_str()) {
            return AdapterError::AuthenticationFailed(err.to_string());
        }
    }
    if err.is_permanent() || err.is_transient() || err.is_response() || err.is_client() {
        return AdapterError::Protocol(err.to_string());
    }
    AdapterError::Internal(err.to_string())
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Email service adapter.
pub struct EmailAdapter {
    id: String,
    connected: bool,
    config: EmailConfig,
    transport: Arc<dyn MailTransport>,
    observer: Arc<dyn ToolObserver>,
}

impl EmailAdapter {
    /// Create an adapter that sends through the configured STARTTLS relay.
    pub fn new(id: impl Into<String>, config: &EmailConfig) -> Self {
        let transport = Arc::new(StartTlsTransport::new(
            config.smtp_host.clone(),
            config.smtp_port,
        ));
        Self::with_transport(id, config, transport)
    }

    /// Create an adapter over any transport.
    pub fn with_transport(
        id: impl Into<String>,
        config: &EmailConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            id: id.into(),
            connected: false,
            config: config.clone(),
            transport,
            observer: default_observer(),
        }
    }

    /// Replace the outcome observer.
    pub fn with_observer(mut self, observer: Arc<dyn ToolObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build and send one message.
    pub async fn deliver(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        cc: Option<&str>,
    ) -> Result<()> {
        let Some((user, password)) = self.config.credentials() else {
            return Err(AdapterError::ConfigError(format!(
                "{ENV_GMAIL_USER} and {ENV_GMAIL_PASSWORD} must be set"
            )));
        };

        if to.trim().is_empty() {
            return Err(AdapterError::InvalidParams {
                tool_name: TOOL_SEND_EMAIL.into(),
                reason: "recipient address must not be empty".into(),
            });
        }

        let message = OutboundMessage::new(user, to, subject, body).with_cc(cc);
        let credentials = SmtpCredentials {
            user: user.to_string(),
            password: password.to_string(),
        };
        self.transport.send(&credentials, &message).await
    }

    /// Tool entry point: always returns the text shown to the user.
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        message: &str,
        cc: Option<&str>,
    ) -> String {
        let result = self.deliver(to, subject, message, cc).await;

        let (outcome, detail) = match &result {
            Ok(()) => (Outcome::Success, format!("email sent successfully to {to}")),
            Err(e @ AdapterError::ConfigError(_)) => (Outcome::Failure(e.kind()), e.to_string()),
            Err(e @ AdapterError::AuthenticationFailed(_)) => (
                Outcome::Failure(e.kind()),
                format!("Gmail authentication failed: {e}"),
            ),
            Err(e @ AdapterError::Protocol(_)) => (
                Outcome::Failure(e.kind()),
                format!("SMTP error occurred: {e}"),
            ),
            Err(e) => (Outcome::Failure(e.kind()), format!("error sending email: {e}")),
        };
        self.observer.record(&ToolEvent {
            tool: TOOL_SEND_EMAIL,
            outcome,
            detail: &detail,
        });

        email_reply(to, &result)
    }
}

/// Map a send result to the reply shown to the user.
pub fn email_reply(to: &str, result: &Result<()>) -> String {
    match result {
        Ok(()) => format!("Email sent successfully to {to}"),
        Err(AdapterError::ConfigError(_)) => CONFIG_ERROR_REPLY.to_string(),
        Err(AdapterError::AuthenticationFailed(_)) => AUTH_ERROR_REPLY.to_string(),
        Err(AdapterError::Protocol(text)) => format!("Email sending failed: SMTP error - {text}"),
        Err(other) => format!("An error occurred while sending email: {other}"),
    }
}

#[async_trait]
impl Adapter for EmailAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn connect(&mut self) -> Result<()> {
        info!(
            id = %self.id,
            host = %self.config.smtp_host,
            port = self.config.smtp_port,
            "email adapter connected"
        );
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "email adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        if self.config.credentials().is_none() {
            return Ok(HealthStatus::Degraded);
        }
        Ok(HealthStatus::Healthy)
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_SEND_EMAIL.into(),
            description: "Send an email".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "to": { "type": "string", "description": "The email address of the recipient" },
                    "subject": { "type": "string", "description": "The subject of the email" },
                    "message": { "type": "string", "description": "The body of the email" },
                    "cc_email": {
                        "type": "string",
                        "description": "The email address of the cc recipient (optional)"
                    }
                },
                "required": ["to", "subject", "message"]
            }),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        ensure_connected(self.connected, &self.id)?;
        match name {
            TOOL_SEND_EMAIL => {
                let to = require_str(&params, "to", TOOL_SEND_EMAIL)?;
                let subject = require_str(&params, "subject", TOOL_SEND_EMAIL)?;
                let message = require_str(&params, "message", TOOL_SEND_EMAIL)?;
                let cc = optional_str(&params, "cc_email");
                Ok(Value::String(self.send_email(to, subject, message, cc).await))
            }
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_auth(&self) -> Option<AuthRequirement> {
        Some(AuthRequirement {
            provider: "gmail".into(),
            env_vars: vec![ENV_GMAIL_USER.into(), ENV_GMAIL_PASSWORD.into()],
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

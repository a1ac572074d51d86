//! Outcome reporting for tool calls.
//!
//! Adapters never log directly.  Each call reports exactly one [`ToolEvent`]
//! per outcome to an injected [`ToolObserver`], so the core logic does not
//! depend on a particular logging backend.  [`TracingObserver`] is the
//! default and forwards events to `tracing`.

use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::error::ErrorKind;

/// How a single tool call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(ErrorKind),
}

/// One reported outcome of a tool call.
#[derive(Debug, Clone, Copy)]
pub struct ToolEvent<'a> {
    /// Tool name, e.g. `send_email`.
    pub tool: &'a str,
    pub outcome: Outcome,
    /// Free-form detail: the weather line, the error text, the written path.
    pub detail: &'a str,
}

/// Sink for tool outcomes.
pub trait ToolObserver: Send + Sync {
    fn record(&self, event: &ToolEvent<'_>);
}

/// Forwards every event to `tracing`: successes at `info`, failures at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ToolObserver for TracingObserver {
    fn record(&self, event: &ToolEvent<'_>) {
        match event.outcome {
            Outcome::Success => {
                info!(tool = event.tool, detail = event.detail, "tool call succeeded");
            }
            Outcome::Failure(kind) => {
                error!(
                    tool = event.tool,
                    kind = %kind,
                    detail = event.detail,
                    "tool call failed"
                );
            }
        }
    }
}

/// The observer used when none is injected.
pub fn default_observer() -> Arc<dyn ToolObserver> {
    Arc::new(TracingObserver)
}

/// An event captured by [`MemoryObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub tool: String,
    pub outcome: Outcome,
    pub detail: String,
}

/// Keeps every event in memory.  Handy for hosts that want to show a call
/// history, and for tests.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ToolObserver for MemoryObserver {
    fn record(&self, event: &ToolEvent<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                tool: event.tool.to_string(),
                outcome: event.outcome,
                detail: event.detail.to_string(),
            });
        }
    }
}

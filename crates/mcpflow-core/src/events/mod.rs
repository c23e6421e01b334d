//! Progress event protocol
//!
//! An ordered, append-only sequence of structured notifications describing
//! loop progress. In streaming mode every event is pushed to the consumer
//! the moment it is produced; in non-streaming mode the loop runs
//! identically against a `NullSink` - unobserved, not degraded.
//!
//! A `STARTED` event precedes validation and exactly one terminal event
//! (`COMPLETED` or `ERROR`) closes every request.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Lifecycle position of an event within the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamingStatus {
    #[serde(rename = "STARTED")]
    Started,
    #[serde(rename = "IN-PROGRESS")]
    InProgress,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "COMPLETED")]
    Completed,
}

/// What the consumer should do with the event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventAction {
    #[serde(rename = "NOTIFICATION")]
    Notification,
    #[serde(rename = "MESSAGE")]
    Message,
    #[serde(rename = "AI-RESPONSE")]
    AiResponse,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "NO-ACTION")]
    NoAction,
}

/// One structured progress notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "Data")]
    pub data: Value,
    #[serde(rename = "Error")]
    pub error: Option<Value>,
    #[serde(rename = "Status")]
    pub status: bool,
    #[serde(rename = "StreamingStatus")]
    pub streaming_status: StreamingStatus,
    #[serde(rename = "Action")]
    pub action: EventAction,
}

impl ProgressEvent {
    /// Opening frame, emitted before validation
    pub fn started() -> Self {
        Self {
            data: Value::Null,
            error: None,
            status: true,
            streaming_status: StreamingStatus::Started,
            action: EventAction::NoAction,
        }
    }

    /// In-progress milestone ("Tool Calls Started", per-call notices, ...)
    pub fn notification(text: impl Into<String>) -> Self {
        Self {
            data: Value::String(text.into()),
            error: None,
            status: true,
            streaming_status: StreamingStatus::InProgress,
            action: EventAction::Notification,
        }
    }

    /// One line of terminal text output
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            data: Value::String(text.into()),
            error: None,
            status: true,
            streaming_status: StreamingStatus::InProgress,
            action: EventAction::Message,
        }
    }

    /// Full result envelope data, pushed before the closing frame
    pub fn ai_response(data: Value) -> Self {
        Self {
            data,
            error: None,
            status: true,
            streaming_status: StreamingStatus::InProgress,
            action: EventAction::AiResponse,
        }
    }

    /// Terminal error frame
    pub fn error(data: Value, error: Value) -> Self {
        Self {
            data,
            error: Some(error),
            status: false,
            streaming_status: StreamingStatus::Error,
            action: EventAction::Error,
        }
    }

    /// Terminal success frame
    pub fn completed() -> Self {
        Self {
            data: Value::Null,
            error: None,
            status: true,
            streaming_status: StreamingStatus::Completed,
            action: EventAction::NoAction,
        }
    }
}

/// Consumer of progress events
///
/// Emitting never blocks and never fails from the loop's point of view; a
/// sink with a gone consumer simply drops events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink for non-streaming mode: identical control flow, nothing observed
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Push-based sink for streaming mode, backed by an unbounded channel
pub struct ChannelSink {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the transport drains
    pub fn new() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        // Receiver gone means the client disconnected; the loop keeps going
        let _ = self.tx.send(event);
    }
}

/// Sink that records every event, for assertions in tests
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}

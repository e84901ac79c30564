//! Lifecycle events and the sinks that receive them.
//!
//! # Design
//! Every dispatched request reports `PENDING` followed by exactly one of
//! `SUCCESS` or `ERROR`. Events serialize to the action shape state
//! containers expect: `{"type": .., "meta": {"status": ..}, "payload": ..}`,
//! with `payload` omitted while pending.
//!
//! `EventSink` is the only coupling to the consumer. Closures, tokio
//! channels and `RecordingSink` all implement it.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Request lifecycle status carried in `meta.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Success,
    Error,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub status: Status,
}

/// One lifecycle message for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "type")]
    pub action_type: String,
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl LifecycleEvent {
    pub fn pending(action_type: &str) -> Self {
        Self {
            action_type: action_type.to_string(),
            meta: Meta {
                status: Status::Pending,
            },
            payload: None,
        }
    }

    pub fn success(action_type: &str, payload: Value) -> Self {
        Self {
            action_type: action_type.to_string(),
            meta: Meta {
                status: Status::Success,
            },
            payload: Some(payload),
        }
    }

    pub fn error(action_type: &str, payload: Value) -> Self {
        Self {
            action_type: action_type.to_string(),
            meta: Meta {
                status: Status::Error,
            },
            payload: Some(payload),
        }
    }

    pub fn status(&self) -> Status {
        self.meta.status
    }
}

/// Receiver of lifecycle events.
///
/// `emit` must not block for long; it runs inline on the calling task.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LifecycleEvent);
}

impl<F> EventSink for F
where
    F: Fn(LifecycleEvent) + Send + Sync,
{
    fn emit(&self, event: LifecycleEvent) {
        self(event)
    }
}

impl EventSink for UnboundedSender<LifecycleEvent> {
    fn emit(&self, event: LifecycleEvent) {
        if let Err(err) = self.send(event) {
            tracing::debug!(action_type = %err.0.action_type, "event receiver dropped");
        }
    }
}

/// Sink that keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.events().iter().map(LifecycleEvent::status).collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

//! Uniform reporting of failed requests.

use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;

use crate::config::Environment;
use crate::error::DispatchError;
use crate::event::{EventSink, LifecycleEvent};

/// A request that settled with an ERROR event.
///
/// `payload` is exactly what was emitted in that event; `source` keeps the
/// raw error for callers that need to branch on it.
#[derive(Debug, Error)]
#[error("{action_type} failed: {}", payload_text(.payload))]
pub struct Rejection {
    pub action_type: String,
    pub payload: Value,
    #[source]
    pub source: DispatchError,
}

impl Rejection {
    pub fn status(&self) -> Option<u16> {
        self.source.status()
    }
}

/// String payloads print without JSON quotes; anything else prints as JSON.
fn payload_text(payload: &Value) -> Cow<'_, str> {
    match payload {
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

/// Log (development only), normalize, and emit an ERROR event for `error`.
///
/// Always returns the rejection so call sites can write
/// `Err(report_error(..))`.
pub fn report_error<S>(
    sink: &S,
    error: DispatchError,
    action_type: &str,
    environment: Environment,
) -> Rejection
where
    S: EventSink + ?Sized,
{
    if environment.is_development() {
        tracing::warn!(action_type, error = %error, "request failed");
    }

    let payload = error.payload();
    sink.emit(LifecycleEvent::error(action_type, payload.clone()));

    Rejection {
        action_type: action_type.to_string(),
        payload,
        source: error,
    }
}

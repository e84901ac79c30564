//! Error types for request dispatch.
//!
//! # Design
//! `DispatchError` is the raw failure produced by `Dispatcher::execute`. It
//! distinguishes "no response at all" (`Transport`, `Join`) from "the server
//! answered with a non-2xx status" (`Http`), from "a response arrived but its
//! body could not be read" (`UnreadableBody`) and from failures while building
//! the request (`MissingToken`, `Serialization`). The error reporter turns any
//! of them into a single JSON payload via `DispatchError::payload`.

use serde_json::Value;
use thiserror::Error;

use crate::http::body_to_value;

/// Raw failure of a single dispatched request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request never produced a response (connection refused, DNS, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The blocking transport task panicked or was cancelled.
    #[error("transport task failed: {0}")]
    Join(String),

    /// A response arrived but its body could not be read (too large, or the
    /// connection dropped mid-body).
    #[error("response body unreadable (HTTP {status}): {reason}")]
    UnreadableBody { status: u16, reason: String },

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Authentication was requested but the token source had no token.
    #[error("no auth token available")]
    MissingToken,

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A success payload could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl DispatchError {
    /// Body of the HTTP response carried by this error, if there is one and it
    /// is non-empty.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            DispatchError::Http { body, .. } if !body.trim().is_empty() => Some(body),
            _ => None,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Http { status, .. } | DispatchError::UnreadableBody { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Normalized payload reported for this error: the response body when one
    /// exists, otherwise the error itself rendered as a string.
    pub fn payload(&self) -> Value {
        match self.response_body() {
            Some(body) => body_to_value(body),
            None => Value::String(self.to_string()),
        }
    }
}

/// Errors raised while loading `DispatcherConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("invalid base URL {0:?}: expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

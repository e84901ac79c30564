//! Transports execute an `HttpRequest` and return the `HttpResponse`.
//!
//! # Design
//! The dispatcher owns no networking code; it talks to a `Transport`. The
//! production implementation, `UreqTransport`, runs ureq's blocking client
//! on tokio's blocking pool so callers can simply `.await` it. Tests supply
//! their own scripted transports.
//!
//! A transport returns `Err` only when no response was obtained. Any status
//! code, including 4xx/5xx, comes back as data.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        (**self).send(request).await
    }
}

/// Largest response body `UreqTransport` reads by default (64 MiB).
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// ureq-backed transport. Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    /// Build an agent that reports 4xx/5xx responses as data rather than
    /// `Err`, leaving status interpretation to the dispatcher.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Use a preconfigured agent. It should have `http_status_as_error`
    /// disabled.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap on response body size; larger bodies fail with
    /// `DispatchError::UnreadableBody`.
    pub fn with_body_limit(mut self, body_limit: u64) -> Self {
        self.body_limit = body_limit;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        let agent = self.agent.clone();
        let body_limit = self.body_limit;
        tokio::task::spawn_blocking(move || execute_blocking(&agent, body_limit, request))
            .await
            .map_err(|e| DispatchError::Join(e.to_string()))?
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    body_limit: u64,
    request: HttpRequest,
) -> Result<HttpResponse, DispatchError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let result = match method {
        HttpMethod::Get => with_headers(agent.get(&url), &headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&url), &headers).call(),
        HttpMethod::Post => send_body(with_headers(agent.post(&url), &headers), body),
        HttpMethod::Put => send_body(with_headers(agent.put(&url), &headers), body),
    };
    let mut response = result.map_err(|e| DispatchError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    // Bodies are decoded lossily: a response arrived, so a non-UTF-8 body is
    // still data, not a transport failure.
    let bytes = response
        .body_mut()
        .with_config()
        .limit(body_limit)
        .read_to_vec()
        .map_err(|e| DispatchError::UnreadableBody {
            status,
            reason: e.to_string(),
        })?;
    let body = String::from_utf8_lossy(&bytes).into_owned();

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

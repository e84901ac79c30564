//! Request dispatch with lifecycle reporting.
//!
//! # Design
//! `Dispatcher` holds its configuration, a `Transport` and a `TokenSource`,
//! and carries no mutable state between calls. A call is split the same way
//! every time:
//!
//! - `build_request` turns a verb and `RequestOptions` into an `HttpRequest`,
//! - the transport executes it,
//! - `parse_response` maps the `HttpResponse` to a JSON payload or an error.
//!
//! `execute` wraps those steps with the PENDING and SUCCESS events but leaves
//! failures unreported. The verb wrappers (`get`, `post`, `put`, `delete`)
//! route failures through `report_error`, so a call made through them always
//! emits PENDING followed by exactly one of SUCCESS or ERROR.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::event::{EventSink, LifecycleEvent};
use crate::http::{body_to_value, HttpMethod, HttpRequest, HttpResponse, RequestOptions};
use crate::report::{report_error, Rejection};
use crate::token::TokenSource;
use crate::transport::{Transport, UreqTransport};

pub const AUTHORIZATION: &str = "authorization";
pub const CONTENT_TYPE: &str = "content-type";
const JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct Dispatcher<T, K> {
    config: DispatcherConfig,
    transport: T,
    tokens: K,
}

impl<K: TokenSource> Dispatcher<UreqTransport, K> {
    /// Dispatcher backed by a fresh `UreqTransport`.
    pub fn with_ureq(config: DispatcherConfig, tokens: K) -> Self {
        Self::new(config, UreqTransport::new(), tokens)
    }
}

impl<T: Transport, K: TokenSource> Dispatcher<T, K> {
    pub fn new(config: DispatcherConfig, transport: T, tokens: K) -> Self {
        Self {
            config,
            transport,
            tokens,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Build the outgoing request. The auth token is read here, on every call.
    pub fn build_request(
        &self,
        method: HttpMethod,
        options: &RequestOptions,
    ) -> Result<HttpRequest, DispatchError> {
        let mut headers = Vec::new();

        if options.requires_auth {
            let token = self.tokens.token().ok_or(DispatchError::MissingToken)?;
            headers.push((AUTHORIZATION.to_string(), token));
        }

        let body = if method.sends_body() {
            let body = match &options.body {
                Some(value) => serde_json::to_string(value),
                None => serde_json::to_string(&serde_json::Map::new()),
            }
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
            headers.push((CONTENT_TYPE.to_string(), JSON.to_string()));
            Some(body)
        } else {
            None
        };

        Ok(HttpRequest {
            method,
            url: self.config.url_for(&options.endpoint),
            headers,
            body,
        })
    }

    /// Any 2xx status is success; everything else becomes `DispatchError::Http`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, DispatchError> {
        if !response.is_success() {
            return Err(DispatchError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(body_to_value(&response.body))
    }

    /// Send one request, emitting PENDING up front and SUCCESS on success.
    ///
    /// Failures are returned as-is with no ERROR event; reporting them is the
    /// caller's job (see `report_error`).
    pub async fn execute<S>(
        &self,
        sink: &S,
        method: HttpMethod,
        action_type: &str,
        options: RequestOptions,
    ) -> Result<Value, DispatchError>
    where
        S: EventSink + ?Sized,
    {
        sink.emit(LifecycleEvent::pending(action_type));

        let request = self.build_request(method, &options)?;
        tracing::debug!(action_type, method = %request.method, url = %request.url, "dispatching request");

        let response = self.transport.send(request).await?;
        tracing::debug!(action_type, status = response.status, "response received");

        let payload = self.parse_response(response)?;
        sink.emit(LifecycleEvent::success(action_type, payload.clone()));
        Ok(payload)
    }

    pub async fn get<S>(
        &self,
        sink: &S,
        action_type: &str,
        endpoint: &str,
        requires_auth: bool,
    ) -> Result<Value, Rejection>
    where
        S: EventSink + ?Sized,
    {
        let options = RequestOptions::new(endpoint).requires_auth(requires_auth);
        self.settle(sink, HttpMethod::Get, action_type, options).await
    }

    pub async fn post<S>(
        &self,
        sink: &S,
        action_type: &str,
        endpoint: &str,
        data: Value,
        requires_auth: bool,
    ) -> Result<Value, Rejection>
    where
        S: EventSink + ?Sized,
    {
        let options = RequestOptions::new(endpoint)
            .body(data)
            .requires_auth(requires_auth);
        self.settle(sink, HttpMethod::Post, action_type, options).await
    }

    pub async fn put<S>(
        &self,
        sink: &S,
        action_type: &str,
        endpoint: &str,
        data: Value,
        requires_auth: bool,
    ) -> Result<Value, Rejection>
    where
        S: EventSink + ?Sized,
    {
        let options = RequestOptions::new(endpoint)
            .body(data)
            .requires_auth(requires_auth);
        self.settle(sink, HttpMethod::Put, action_type, options).await
    }

    pub async fn delete<S>(
        &self,
        sink: &S,
        action_type: &str,
        endpoint: &str,
        requires_auth: bool,
    ) -> Result<Value, Rejection>
    where
        S: EventSink + ?Sized,
    {
        let options = RequestOptions::new(endpoint).requires_auth(requires_auth);
        self.settle(sink, HttpMethod::Delete, action_type, options).await
    }

    async fn settle<S>(
        &self,
        sink: &S,
        method: HttpMethod,
        action_type: &str,
        options: RequestOptions,
    ) -> Result<Value, Rejection>
    where
        S: EventSink + ?Sized,
    {
        self.execute(sink, method, action_type, options)
            .await
            .map_err(|err| report_error(sink, err, action_type, self.config.environment()))
    }
}

/// Decode a success payload into a concrete type.
pub fn payload_as<T: DeserializeOwned>(payload: Value) -> Result<T, DispatchError> {
    serde_json::from_value(payload).map_err(|e| DispatchError::Deserialization(e.to_string()))
}

//! Request dispatch with lifecycle reporting for a JSON backend API.
//!
//! # Overview
//! Each call builds one HTTP request against a configured base URL,
//! optionally attaches the auth token from a cookie store, awaits the
//! response, and reports `PENDING` then `SUCCESS` or `ERROR` to an
//! `EventSink`. Errors are normalized to a single JSON payload.
//!
//! # Design
//! - `Dispatcher` is stateless apart from its injected config, transport and
//!   token source, so one instance can serve concurrent calls.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   the network lives behind the `Transport` trait.
//! - The event sink is a trait, not a specific state-management library.
//!
//! ```no_run
//! use api_dispatch::{CookieStore, Dispatcher, DispatcherConfig, RecordingSink};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DispatcherConfig::from_env()?;
//! let cookies = CookieStore::from_header("token=abc123");
//! let dispatcher = Dispatcher::with_ureq(config, cookies);
//!
//! let sink = RecordingSink::new();
//! let user = dispatcher.get(&sink, "FETCH_USER", "user/1", true).await?;
//! println!("{user}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod http;
pub mod report;
pub mod token;
pub mod transport;

pub use config::{DispatcherConfig, Environment};
pub use dispatcher::{payload_as, Dispatcher};
pub use error::{ConfigError, DispatchError};
pub use event::{EventSink, LifecycleEvent, RecordingSink, Status};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use report::{report_error, Rejection};
pub use token::{CookieStore, StaticToken, TokenSource};
pub use transport::{Transport, UreqTransport, DEFAULT_BODY_LIMIT};

//! Auth token sources.
//!
//! The dispatcher reads the token on every authenticated call and never
//! caches it, so updates to a shared `CookieStore` are visible to the next
//! request.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Name of the cookie holding the auth token.
pub const TOKEN_COOKIE: &str = "token";

/// Read-only supplier of the current auth token.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Shared cookie jar. Clones share the same underlying cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    cookies: Arc<RwLock<HashMap<String, String>>>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` header value such as `theme=dark; token=abc`.
    /// Pairs without `=` are ignored; later duplicates win.
    pub fn from_header(header: &str) -> Self {
        let store = Self::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    store.set(name, value.trim());
                }
            }
        }
        store
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set(&self, name: &str, value: &str) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

impl TokenSource for CookieStore {
    fn token(&self) -> Option<String> {
        self.get(TOKEN_COOKIE)
    }
}

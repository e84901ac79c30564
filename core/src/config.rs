//! Dispatcher configuration.
//!
//! # Design
//! The API base URL and the runtime environment are resolved once at startup
//! and handed to `Dispatcher::new`. Nothing here is global; tests build a
//! config directly or through `from_lookup` without touching the process
//! environment.

use std::fmt;

use crate::error::ConfigError;

pub const API_URL_VAR: &str = "API_URL";
pub const APP_ENV_VAR: &str = "APP_ENV";

/// Runtime environment. Development enables diagnostic logging of failed
/// requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// `development` and `dev` (any case) select Development; anything else
    /// is Production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    base_url: String,
    environment: Environment,
}

impl DispatcherConfig {
    /// Validate `base_url` and strip a trailing `/` so endpoint joining never
    /// doubles the separator.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            environment: Environment::default(),
        })
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Load from `API_URL` (required) and `APP_ENV` (optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_VAR).ok_or(ConfigError::MissingVar(API_URL_VAR))?;
        let environment = lookup(APP_ENV_VAR)
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();
        Ok(Self::new(&base_url)?.with_environment(environment))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// `base_url + "/" + endpoint`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = DispatcherConfig::new("http://localhost:3000/").unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000");
        assert_eq!(config.url_for("user/1"), "http://localhost:3000/user/1");
    }

    #[test]
    fn empty_endpoint_keeps_separator() {
        let config = DispatcherConfig::new("https://api.example.com").unwrap();
        assert_eq!(config.url_for(""), "https://api.example.com/");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = DispatcherConfig::new("localhost:3000").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse(" DEV "), Environment::Development);
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Production);
    }

    #[test]
    fn from_lookup_reads_both_vars() {
        let vars: HashMap<&str, String> = HashMap::from([
            (API_URL_VAR, "http://api.local/".to_string()),
            (APP_ENV_VAR, "development".to_string()),
        ]);
        let config = DispatcherConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.base_url(), "http://api.local");
        assert!(config.environment().is_development());
    }

    #[test]
    fn from_lookup_defaults_to_production() {
        let config =
            DispatcherConfig::from_lookup(|k| (k == API_URL_VAR).then(|| "http://api.local".to_string()))
                .unwrap();
        assert_eq!(config.environment(), Environment::Production);
    }

    #[test]
    fn from_lookup_requires_api_url() {
        let err = DispatcherConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(API_URL_VAR)));
    }
}

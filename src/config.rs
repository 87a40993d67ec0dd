//! Backend connection settings.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api base url is empty")]
    EmptyBaseUrl,
    #[error("api base url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("api base url '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Settings for talking to the Grabbitt REST backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without trailing slash, e.g. `https://api.grabbitt.in`.
    pub api_base_url: String,
    /// Bearer token of the signed-in seller.
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: trimmed.to_string(),
            reason,
        };
        let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(trimmed.to_string()));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        Ok(Self {
            api_base_url: trimmed.to_string(),
            auth_token: None,
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    /// Full URL of a backend endpoint such as `validateCustomerQR`.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api_base_url, name.trim_start_matches('/'))
    }
}

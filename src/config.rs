//! Client configuration for the suite backend.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend API, including the version prefix.
    pub base_url: String,
    /// Per-request timeout. `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read configuration from the environment.
    ///
    /// - `EVANGELIST_API_URL`: backend base URL (default: `http://localhost:8000/v1`)
    /// - `EVANGELIST_REQUEST_TIMEOUT_MS`: request timeout in milliseconds (unset: transport default)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("EVANGELIST_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "EVANGELIST_API_URL",
                reason: "must not be empty".to_string(),
            });
        }

        let request_timeout = match std::env::var("EVANGELIST_REQUEST_TIMEOUT_MS") {
            Ok(raw) => {
                let ms: u64 = raw.parse().map_err(|e| ConfigError::Invalid {
                    name: "EVANGELIST_REQUEST_TIMEOUT_MS",
                    reason: format!("{}", e),
                })?;
                Some(Duration::from_millis(ms))
            }
            Err(_) => None,
        };

        Ok(Self {
            base_url,
            request_timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `path` must start with `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

//! Error types shared by the backend client, orchestrator and gateway.

use crate::workflow::StepName;
use thiserror::Error;

/// Failures talking to the suite backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// 404 from the backend. `detail` is the backend's `detail` field when present.
    #[error("not found: {resource}")]
    NotFound {
        resource: String,
        detail: Option<String>,
    },

    /// Non-success status. `detail` is the backend's `detail` field when present.
    #[error("backend rejected request [{status}]: {message}")]
    Rejected {
        status: u16,
        detail: Option<String>,
        message: String,
    },

    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response arrived but could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        BackendError::NotFound {
            resource: resource.into(),
            detail: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }

    /// The backend's `detail` field, if the response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::NotFound { detail, .. } | BackendError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The backend's `detail` message, or this error's own text.
    pub fn detail_or_message(&self) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Failures of a step test.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TestError {
    /// Testing needs a suite; nothing was sent.
    #[error("no suite selected")]
    NoSuiteSelected,

    #[error("{step} test failed: {message}")]
    StepFailed { step: StepName, message: String },
}

/// Failures of the configuration gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to load suite data: {0}")]
    Load(#[source] BackendError),

    #[error("failed to save workflow configuration: {0}")]
    Save(#[source] BackendError),

    #[error("failed to initialize workflow: {0}")]
    Initialize(#[source] BackendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

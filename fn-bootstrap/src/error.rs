//! Error types for the bootstrap sequence.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Stage of the provisioning sequence an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Session,
    Network,
    Subnet,
    Gateway,
    Route,
    Repository,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Session => "session",
            Stage::Network => "network",
            Stage::Subnet => "subnet",
            Stage::Gateway => "gateway",
            Stage::Route => "route",
            Stage::Repository => "repository",
        };
        f.write_str(name)
    }
}

/// Failure of a single remote call.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("service error (status {status}, code {code}, opc-request-id {}): {message}", .request_id.as_deref().unwrap_or("-"))]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a service error without a request id.
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Service {
            status,
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    /// True only for the service-level "not found" class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Service { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Errors surfaced by a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Malformed input: bad key encoding or a missing field.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The authenticated client could not be constructed.
    #[error("failed to create session: {0}")]
    Session(String),

    /// A remote list/create/get/update call failed.
    #[error("{action}: {source}")]
    Provision {
        stage: Stage,
        action: &'static str,
        source: ApiError,
    },

    /// The invocation deadline elapsed before the sequence finished.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl BootstrapError {
    pub fn provision(stage: Stage, action: &'static str, source: ApiError) -> Self {
        BootstrapError::Provision {
            stage,
            action,
            source,
        }
    }

    /// Stage the error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BootstrapError::Config(_) | BootstrapError::Session(_) => Some(Stage::Session),
            BootstrapError::Provision { stage, .. } => Some(*stage),
            BootstrapError::DeadlineExceeded(_) => None,
        }
    }

    /// Whether the failure was caused by the caller's input.
    pub fn is_config(&self) -> bool {
        matches!(self, BootstrapError::Config(_))
    }
}

/// Result type for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Result type for a single remote call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

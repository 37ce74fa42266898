//! Invocation wrapper: JSON request in, JSON result or error object out.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::bootstrap::Bootstrapper;
use crate::clients::Connector;
use crate::config::ProvisioningRequest;
use crate::error::BootstrapError;
use crate::result::ProvisioningResult;

/// Why an invocation produced no result.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The request body was not a valid request object.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

impl InvokeError {
    /// Status code the HTTP shell answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            InvokeError::Decode(_) => StatusCode::BAD_REQUEST,
            InvokeError::Bootstrap(e) if e.is_config() => StatusCode::BAD_REQUEST,
            InvokeError::Bootstrap(BootstrapError::DeadlineExceeded(_)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            InvokeError::Bootstrap(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Error object written back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&InvokeError> for ErrorResponse {
    fn from(e: &InvokeError) -> Self {
        Self {
            error: format!("failed to bootstrap due to: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvokeResponse {
    Success(ProvisioningResult),
    Failure(ErrorResponse),
}

/// Handles one invocation per call; holds no per-request state.
pub struct Handler<C> {
    bootstrapper: Bootstrapper<C>,
    deadline: Option<Duration>,
}

impl<C: Connector> Handler<C> {
    pub fn new(bootstrapper: Bootstrapper<C>, deadline: Option<Duration>) -> Self {
        Self {
            bootstrapper,
            deadline,
        }
    }

    /// Decode `input` and run the bootstrap sequence within the deadline.
    pub async fn invoke(&self, input: &[u8]) -> Result<ProvisioningResult, InvokeError> {
        let request = ProvisioningRequest::from_json(input)?;
        info!(
            compartment_id = %request.compartment_id,
            vcn = %request.vcn_name,
            subnet = %request.subnet_name,
            repository = %request.repository_name,
            "Bootstrap requested"
        );

        let run = self.bootstrapper.run(&request);
        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, run)
                .await
                .unwrap_or(Err(BootstrapError::DeadlineExceeded(deadline))),
            None => run.await,
        };

        match &result {
            Ok(output) => info!(vcn_id = %output.oci_state.vcn_id, "Bootstrap succeeded"),
            Err(e) => error!(stage = ?e.stage(), "Bootstrap failed: {}", e),
        }
        Ok(result?)
    }

    /// Invoke and render the outcome as a status code and response body.
    pub async fn respond(&self, input: &[u8]) -> (StatusCode, InvokeResponse) {
        match self.invoke(input).await {
            Ok(result) => (StatusCode::OK, InvokeResponse::Success(result)),
            Err(e) => (e.status(), InvokeResponse::Failure(ErrorResponse::from(&e))),
        }
    }
}

/// HTTP routes: `POST /` invokes, `GET /health` answers liveness probes.
pub fn router<C: Connector + 'static>(handler: Arc<Handler<C>>) -> Router {
    Router::new()
        .route("/", post(invoke::<C>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn invoke<C: Connector + 'static>(
    State(handler): State<Arc<Handler<C>>>,
    body: Bytes,
) -> impl IntoResponse {
    let (status, response) = handler.respond(&body).await;
    (status, Json(response))
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Topology;
    use crate::error::{ApiError, Stage};
    use crate::test_util::{FakeCloud, Op};

    fn handler(cloud: &FakeCloud) -> Handler<FakeCloud> {
        Handler::new(Bootstrapper::new(cloud.clone(), Topology::default()), None)
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let cloud = FakeCloud::new();
        let (status, response) = handler(&cloud).respond(b"{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        match response {
            InvokeResponse::Failure(e) => {
                assert!(e.error.starts_with("failed to bootstrap due to: "))
            }
            InvokeResponse::Success(_) => panic!("expected failure"),
        }
        assert_eq!(cloud.total_calls(), 0);
    }

    #[tokio::test]
    async fn remote_failure_is_bad_gateway() {
        let cloud = FakeCloud::new();
        cloud.fail(Op::ListVcns, ApiError::Transport("refused".to_string()));
        let input = br#"{"region":"us-1","tenant_name":"acme","vcn_name":"v1",
            "regional_subnet":"s1","repo_name":"r1","compartment_id":"c1","private_key":"aw=="}"#;

        let err = handler(&cloud).invoke(input).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        match &err {
            InvokeError::Bootstrap(e) => assert_eq!(e.stage(), Some(Stage::Network)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            ErrorResponse::from(&err).error,
            "failed to bootstrap due to: failed to list vcns: transport error: refused"
        );
    }
}

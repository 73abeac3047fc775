// HTTP route handlers for the Codegate API

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use codegate_common::gateway::GatewayOutcome;
use codegate_common::types::{ExecutionResult, IncomingRequest, OutcomeKind};
use codegate_common::validation::Rejection;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::metrics;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    pub output: String,
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub success: bool,
    pub output: String,
    pub error: String,
    #[serde(rename = "type")]
    pub failure_type: &'static str,
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<u64>,
}

/// POST /execute - Run code through the gateway
pub async fn execute(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IncomingRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            let rejection = match rejection {
                JsonRejection::JsonSyntaxError(_) => Rejection::MalformedBody(rejection.body_text()),
                _ => Rejection::InvalidBody(rejection.body_text()),
            };
            info!(reason = rejection.reason(), "Request rejected");
            metrics::record_rejection(rejection.reason());
            return rejected(&rejection);
        }
    };

    let outcome = state.gateway.handle(request).await;
    metrics::record(&outcome);

    match outcome {
        GatewayOutcome::Rejected(rejection) => rejected(&rejection),
        GatewayOutcome::Completed { result, .. } => completed(result),
    }
}

fn rejected(rejection: &Rejection) -> Response {
    let body = match rejection {
        Rejection::UnsupportedLanguage { supported, .. } => json!({
            "error": rejection.to_string(),
            "supportedLanguages": supported,
        }),
        _ => json!({ "error": rejection.to_string() }),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Map an execution result onto the client contract.
/// Program failures are 200s; only gateway failures change the status.
fn completed(result: ExecutionResult) -> Response {
    let failure_type = match result.outcome {
        OutcomeKind::Success => {
            return (
                StatusCode::OK,
                Json(SuccessResponse {
                    success: true,
                    output: result.stdout,
                    outcome: result.outcome,
                    execution_time: result.execution_time_ms,
                    memory_used: result.memory_bytes,
                }),
            )
                .into_response();
        }
        OutcomeKind::CompilationError => "compilation",
        OutcomeKind::RuntimeError | OutcomeKind::Killed => "runtime",
        OutcomeKind::GatewayTimeout => {
            return (
                StatusCode::REQUEST_TIMEOUT,
                Json(json!({ "error": result.error_message })),
            )
                .into_response();
        }
        OutcomeKind::GatewayUpstreamError => {
            let status = result
                .upstream_status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error!(status = status.as_u16(), error = %result.error_message, "Execution service error");
            return (
                status,
                Json(json!({
                    "error": "Execution service error",
                    "detail": result.error_message,
                })),
            )
                .into_response();
        }
        OutcomeKind::UpstreamUnknown => {
            error!(error = %result.error_message, "Unrecognized execution engine response");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Unexpected response from execution engine",
                    "detail": result.error_message,
                })),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(FailureResponse {
            success: false,
            output: result.stdout,
            error: result.error_message,
            failure_type,
            outcome: result.outcome,
            execution_time: result.execution_time_ms,
            memory_used: result.memory_bytes,
        }),
    )
        .into_response()
}

/// GET /languages - The full language table
pub async fn list_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.gateway.registry().to_file()))
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn export_metrics() -> Response {
    match metrics::render() {
        Ok(text) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

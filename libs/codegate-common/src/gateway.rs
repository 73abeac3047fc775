//! Gateway Handler
//!
//! Drives one request through
//! `Received → Validated → LanguageResolved → Dispatched → Classified → Responded`,
//! with early exits to `Rejected` (validation or unknown language, no network
//! call) and `Failed` (engine unreachable, timed out or erroring).
//!
//! The gateway holds no per-request state; the registry is shared read-only.

use crate::classifier::classify;
use crate::config::GatewayConfig;
use crate::engine::{ClientFailure, ExecutionClient};
use crate::languages::LanguageRegistry;
use crate::types::{ExecutionResult, IncomingRequest, OutcomeKind, UpstreamPayload};
use crate::validation::{validate, Rejection};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    LanguageResolved,
    Dispatched,
    Classified,
    Rejected,
    Failed,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::LanguageResolved => "language_resolved",
            Stage::Dispatched => "dispatched",
            Stage::Classified => "classified",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Final state of one gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// Turned away before any upstream call
    Rejected(Rejection),
    /// The engine was called; the result is classified or a mapped failure
    Completed {
        result: ExecutionResult,
        upstream_elapsed: Duration,
    },
}

impl GatewayOutcome {
    /// The stage a call ended in before responding
    pub fn terminal_stage(&self) -> Stage {
        match self {
            GatewayOutcome::Rejected(_) => Stage::Rejected,
            GatewayOutcome::Completed { result, .. } => match result.outcome {
                OutcomeKind::GatewayTimeout | OutcomeKind::GatewayUpstreamError => Stage::Failed,
                _ => Stage::Classified,
            },
        }
    }
}

/// Map an engine failure onto the result contract
pub fn failure_result(failure: ClientFailure) -> ExecutionResult {
    let message = failure.to_string();
    match failure {
        ClientFailure::Timeout(_) => {
            ExecutionResult::new(OutcomeKind::GatewayTimeout, String::new(), message)
        }
        ClientFailure::Transport(_) => {
            ExecutionResult::new(OutcomeKind::GatewayUpstreamError, String::new(), message)
        }
        ClientFailure::UpstreamHttp { status, .. } => {
            let mut result =
                ExecutionResult::new(OutcomeKind::GatewayUpstreamError, String::new(), message);
            result.upstream_status = Some(status);
            result
        }
        // A body we cannot read is a contract violation, not a transport failure
        ClientFailure::MalformedResponse { .. } => {
            ExecutionResult::new(OutcomeKind::UpstreamUnknown, String::new(), message)
        }
    }
}

pub struct Gateway<C> {
    registry: Arc<LanguageRegistry>,
    client: C,
    timeout: Duration,
    max_code_bytes: usize,
}

impl<C: ExecutionClient> Gateway<C> {
    pub fn new(registry: Arc<LanguageRegistry>, client: C, config: &GatewayConfig) -> Self {
        Self {
            registry,
            client,
            timeout: config.timeout,
            max_code_bytes: config.max_code_bytes,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn handle(&self, raw: IncomingRequest) -> GatewayOutcome {
        debug!(stage = %Stage::Received, "Stage transition");
        let outcome = self.run(raw).await;
        debug!(stage = %outcome.terminal_stage(), "Stage transition");
        debug!(stage = %Stage::Responded, "Stage transition");
        outcome
    }

    async fn run(&self, raw: IncomingRequest) -> GatewayOutcome {
        let request = match validate(raw, self.max_code_bytes) {
            Ok(request) => request,
            Err(rejection) => {
                info!(reason = rejection.reason(), "Request rejected");
                return GatewayOutcome::Rejected(rejection);
            }
        };
        debug!(stage = %Stage::Validated, language = %request.language_id, "Stage transition");

        let Some(spec) = self.registry.resolve(&request.language_id) else {
            info!(language = %request.language_id, "Unsupported language");
            return GatewayOutcome::Rejected(Rejection::UnsupportedLanguage {
                language: request.language_id,
                supported: self
                    .registry
                    .list_supported()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            });
        };
        debug!(stage = %Stage::LanguageResolved, version = %spec.runtime_version, "Stage transition");

        let payload = UpstreamPayload::build(&request, spec);
        debug!(stage = %Stage::Dispatched, file = %payload.files[0].name, "Stage transition");

        let start = Instant::now();
        let response = self.client.execute(&payload, self.timeout).await;
        let upstream_elapsed = start.elapsed();

        let result = match response {
            Ok(raw) => classify(raw),
            Err(failure) => {
                warn!(
                    error = %failure,
                    elapsed_ms = upstream_elapsed.as_millis() as u64,
                    "Execution engine call failed"
                );
                failure_result(failure)
            }
        };

        info!(
            language = %payload.language,
            version = %payload.version,
            outcome = %result.outcome,
            elapsed_ms = upstream_elapsed.as_millis() as u64,
            "Execution completed"
        );

        GatewayOutcome::Completed {
            result,
            upstream_elapsed,
        }
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Pinned toolchain entry for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub id: String,
    pub runtime_version: String,
    pub source_file_name: String,
    pub display_name: String,
}

/// Raw `POST /execute` body as it arrives on the wire.
///
/// `code` and `language` stay loosely typed so the validator can
/// distinguish a missing field from one with the wrong type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingRequest {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub language: Option<serde_json::Value>,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language_id: String,
    pub stdin: String,
    pub requested_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

/// Body sent to the execution engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamPayload {
    pub language: String,
    pub version: String,
    pub files: Vec<SourceFile>,
    pub stdin: String,
    pub args: Vec<String>,
}

impl UpstreamPayload {
    /// Build the engine payload. The file name always follows the resolved
    /// language's convention; a requested version replaces the pinned one.
    pub fn build(request: &ExecutionRequest, spec: &LanguageSpec) -> Self {
        let version = request
            .requested_version
            .clone()
            .unwrap_or_else(|| spec.runtime_version.clone());

        Self {
            language: spec.id.clone(),
            version,
            files: vec![SourceFile {
                name: spec.source_file_name.clone(),
                content: request.source_code.clone(),
            }],
            stdin: request.stdin.clone(),
            args: Vec::new(),
        }
    }
}

/// One stage (`compile` or `run`) of an engine response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stdout: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stderr: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub output: String,
    #[serde(default)]
    pub cpu_time: Option<u64>,
    #[serde(default)]
    pub wall_time: Option<u64>,
    #[serde(default)]
    pub memory: Option<u64>,
}

/// Engines send `null` for streams they did not capture
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl StageReport {
    /// A stage failed if it exited non-zero, or was terminated without an exit code.
    pub fn failed(&self) -> bool {
        match self.code {
            Some(code) => code != 0,
            None => self.signal.is_some(),
        }
    }
}

/// Engine response before classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpstreamResponse {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub compile: Option<StageReport>,
    #[serde(default)]
    pub run: Option<StageReport>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RawUpstreamResponse {
    pub fn has_stages(&self) -> bool {
        self.compile.is_some() || self.run.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    CompilationError,
    RuntimeError,
    Killed,
    UpstreamUnknown,
    GatewayTimeout,
    GatewayUpstreamError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::CompilationError => "compilation_error",
            OutcomeKind::RuntimeError => "runtime_error",
            OutcomeKind::Killed => "killed",
            OutcomeKind::UpstreamUnknown => "upstream_unknown",
            OutcomeKind::GatewayTimeout => "gateway_timeout",
            OutcomeKind::GatewayUpstreamError => "gateway_upstream_error",
        }
    }

    /// Outcomes describing the executed program rather than the gateway
    pub fn is_program_outcome(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Success
                | OutcomeKind::CompilationError
                | OutcomeKind::RuntimeError
                | OutcomeKind::Killed
        )
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub outcome: OutcomeKind,
    pub stdout: String,
    pub error_message: String,
    pub execution_time_ms: Option<u64>,
    pub memory_bytes: Option<u64>,
    /// HTTP status received from the engine, for gateway upstream errors
    pub upstream_status: Option<u16>,
}

impl ExecutionResult {
    pub fn success(stdout: String) -> Self {
        Self::new(OutcomeKind::Success, stdout, String::new())
    }

    pub fn new(outcome: OutcomeKind, stdout: String, error_message: String) -> Self {
        Self {
            outcome,
            stdout,
            error_message,
            execution_time_ms: None,
            memory_bytes: None,
            upstream_status: None,
        }
    }

    pub fn with_usage(mut self, execution_time_ms: Option<u64>, memory_bytes: Option<u64>) -> Self {
        self.execution_time_ms = execution_time_ms;
        self.memory_bytes = memory_bytes;
        self
    }
}

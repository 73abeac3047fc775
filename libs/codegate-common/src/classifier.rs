//! Result Classifier
//!
//! Maps a raw engine response onto exactly one [`OutcomeKind`].

use crate::types::{ExecutionResult, OutcomeKind, RawUpstreamResponse, StageReport};

/// Engines that compile report both `compile` and `run` sections in one
/// response, so the order of the checks below decides the outcome. Keep them
/// in this single function, first match wins:
/// 1. compile stage failed          → CompilationError
/// 2. no run stage                  → UpstreamUnknown
/// 3. run stage terminated by signal → Killed
/// 4. run exit non-zero or stderr   → RuntimeError
/// 5. otherwise                     → Success
pub fn classify(raw: RawUpstreamResponse) -> ExecutionResult {
    let RawUpstreamResponse { compile, run, message, .. } = raw;

    if let Some(compile) = compile.as_ref().filter(|stage| stage.failed()) {
        let error = first_non_empty(&[&compile.stderr, &compile.output])
            .unwrap_or("Compilation failed")
            .to_string();
        let result = ExecutionResult::new(OutcomeKind::CompilationError, String::new(), error);
        return with_stage_usage(result, run.as_ref().unwrap_or(compile));
    }

    let Some(run) = run else {
        let detail = message.unwrap_or_else(|| {
            "Execution engine response has no compile or run section".to_string()
        });
        return ExecutionResult::new(OutcomeKind::UpstreamUnknown, String::new(), detail);
    };

    let result = if let Some(signal) = run.signal.as_deref() {
        ExecutionResult::new(
            OutcomeKind::Killed,
            run.stdout.clone(),
            format!("Execution killed: {}", signal),
        )
    } else if run.code.is_some_and(|code| code != 0) || !run.stderr.is_empty() {
        let error = first_non_empty(&[&run.stderr, &run.output])
            .unwrap_or("Runtime error occurred")
            .to_string();
        ExecutionResult::new(OutcomeKind::RuntimeError, run.stdout.clone(), error)
    } else {
        ExecutionResult::success(run.stdout.clone())
    };

    with_stage_usage(result, &run)
}

fn first_non_empty<'a>(candidates: &[&'a String]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|s| !s.is_empty())
        .map(String::as_str)
}

fn with_stage_usage(result: ExecutionResult, stage: &StageReport) -> ExecutionResult {
    result.with_usage(stage.wall_time.or(stage.cpu_time), stage.memory)
}

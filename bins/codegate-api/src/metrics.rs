// Prometheus metrics for the gateway

use codegate_common::gateway::GatewayOutcome;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Encoder, Histogram,
    IntCounterVec, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref EXECUTIONS_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "codegate_executions_total",
        "Dispatched executions by outcome",
        &["outcome"],
        REGISTRY
    )
    .expect("metric can be registered");

    pub static ref REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "codegate_rejections_total",
        "Requests rejected before dispatch, by reason",
        &["reason"],
        REGISTRY
    )
    .expect("metric can be registered");

    pub static ref UPSTREAM_DURATION: Histogram = register_histogram_with_registry!(
        "codegate_upstream_duration_seconds",
        "Execution engine call latency",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0],
        REGISTRY
    )
    .expect("metric can be registered");
}

pub fn record(outcome: &GatewayOutcome) {
    match outcome {
        GatewayOutcome::Rejected(rejection) => {
            REJECTIONS_TOTAL.with_label_values(&[rejection.reason()]).inc();
        }
        GatewayOutcome::Completed {
            result,
            upstream_elapsed,
        } => {
            EXECUTIONS_TOTAL
                .with_label_values(&[result.outcome.as_str()])
                .inc();
            UPSTREAM_DURATION.observe(upstream_elapsed.as_secs_f64());
        }
    }
}

pub fn record_rejection(reason: &str) {
    REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
}

/// Text exposition of every registered metric
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use pipeline::CompletedScope;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};

use crate::error::{ServerError, ServerResult};

/// Resource responses, labeled by resource and status code.
pub static RESPONSES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "bank_api_responses_total",
        "Total number of resource responses, labeled by resource and status",
        &["resource", "status"]
    )
    .expect("Failed to create bank_api_responses_total counter vec")
});

/// Requests whose `Accept` header matched no registered media type.
pub static UNSUPPORTED_MEDIA_TYPE: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "bank_api_unsupported_media_type_total",
        "Total number of requests answered with 415, labeled by resource",
        &["resource"]
    )
    .expect("Failed to create bank_api_unsupported_media_type_total counter vec")
});

/// Histogram for instrumented operation durations in seconds.
pub static INSTRUMENTED_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "bank_api_instrumented_duration_seconds",
        "Instrumented operation durations in seconds",
        &["operation"],
        vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to create instrumented duration histogram")
});

/// Instrumented operations that ran past their limit.
pub static SLOW_OPERATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "bank_api_slow_operations_total",
        "Total number of instrumented operations exceeding their limit",
        &["operation"]
    )
    .expect("Failed to create bank_api_slow_operations_total counter vec")
});

/// Count a response produced by `resource`
pub fn record_response(resource: &str, status: StatusCode) {
    RESPONSES
        .with_label_values(&[resource, status.as_str()])
        .inc();
}

/// Count a request that failed content negotiation
pub fn inc_unsupported_media_type(resource: &str) {
    UNSUPPORTED_MEDIA_TYPE.with_label_values(&[resource]).inc();
}

/// Observe a completed scope and all of its children
pub fn observe_scope(scope: &CompletedScope) {
    let operation = scope.label().to_string();
    INSTRUMENTED_DURATION
        .with_label_values(&[operation.as_str()])
        .observe(scope.duration().as_secs_f64());
    if scope.exceeded_limit() {
        SLOW_OPERATIONS.with_label_values(&[operation.as_str()]).inc();
    }
    for child in scope.children() {
        observe_scope(child);
    }
}

/// Axum handler that exports metrics in Prometheus text format
///
/// # Errors
///
/// Returns `ServerError::Runtime` if the metrics cannot be encoded
pub async fn metrics_handler() -> ServerResult<Response> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServerError::Runtime {
            message: format!("failed to encode metrics: {e}"),
        })?;

    let body = String::from_utf8(buffer).map_err(|e| ServerError::Runtime {
        message: format!("metrics buffer is not valid UTF-8: {e}"),
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    )
        .into_response())
}

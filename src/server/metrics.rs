use crate::snapshot_store::Metric;
use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all epimap metrics
const PREFIX: &str = "epimap";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Background jobs
    pub static ref BACKGROUND_JOB_EXECUTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_background_job_executions_total"),
            "Total background job executions by outcome"
        ),
        &["job_id", "status"]
    ).expect("Failed to create background_job_executions_total metric");

    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_background_job_duration_seconds"),
            "Background job execution duration in seconds"
        )
        .buckets(vec![0.1, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        &["job_id"]
    ).expect("Failed to create background_job_duration_seconds metric");

    pub static ref BACKGROUND_JOB_RUNNING: GaugeVec = GaugeVec::new(
        Opts::new(
            format!("{PREFIX}_background_job_running"),
            "Whether a background job is currently running (1) or idle (0)"
        ),
        &["job_id"]
    ).expect("Failed to create background_job_running metric");

    pub static ref BACKGROUND_JOB_SKIPPED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_background_job_skipped_total"),
            "Scheduled fires dropped because the job was still running"
        ),
        &["job_id"]
    ).expect("Failed to create background_job_skipped_total metric");

    // Snapshot
    pub static ref SNAPSHOT_ROWS: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_snapshot_rows"), "Rows stored by the last refresh"),
        &["metric"]
    ).expect("Failed to create snapshot_rows metric");

    // Chart
    pub static ref CHART_BUILD_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_chart_build_failures_total"),
            "Chart builds that ended in an error"
        ),
        &["reason"]
    ).expect("Failed to create chart_build_failures_total metric");
}

/// Register every metric with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_EXECUTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_RUNNING.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_SKIPPED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SNAPSHOT_ROWS.clone()));
    let _ = REGISTRY.register(Box::new(CHART_BUILD_FAILURES_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn set_background_job_running(job_id: &str, running: bool) {
    BACKGROUND_JOB_RUNNING
        .with_label_values(&[job_id])
        .set(if running { 1.0 } else { 0.0 });
}

/// Record a finished job run. `status` is one of `success`, `failed`, `cancelled`, `panic`.
pub fn record_background_job_execution(job_id: &str, status: &str, duration: Duration) {
    BACKGROUND_JOB_EXECUTIONS_TOTAL
        .with_label_values(&[job_id, status])
        .inc();

    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_id])
        .observe(duration.as_secs_f64());
}

pub fn record_background_job_skipped(job_id: &str) {
    BACKGROUND_JOB_SKIPPED_TOTAL
        .with_label_values(&[job_id])
        .inc();
}

pub fn set_snapshot_rows(metric: Metric, rows: usize) {
    SNAPSHOT_ROWS
        .with_label_values(&[metric.table()])
        .set(rows as f64);
}

pub fn record_chart_failure(reason: &str) {
    CHART_BUILD_FAILURES_TOTAL
        .with_label_values(&[reason])
        .inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

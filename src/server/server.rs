use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{error, info};

use crate::background_jobs::JobError;
use crate::chart::{ChartBuilder, ChartError};
use crate::snapshot_store::{Metric, SnapshotRefresh};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::metrics::{self, metrics_handler};
use super::{log_requests, state::*, ServerConfig};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const LAST_REFRESH_PLACEHOLDER: &str = "{{ last_refresh }}";

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
    pub last_refresh: Option<SnapshotRefresh>,
    pub total_rows: usize,
    pub death_rows: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn internal_server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn scheduler_unavailable() -> Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Job scheduler not available",
    )
}

fn chart_failure_reason(err: &ChartError) -> &'static str {
    match err {
        ChartError::EmptySnapshot(_) => "empty_snapshot",
        ChartError::Store(_) => "store",
        ChartError::Serialize(_) => "serialize",
    }
}

fn render_index(last_refresh: Option<&SnapshotRefresh>) -> String {
    let label = match last_refresh {
        Some(refresh) => refresh
            .refreshed_at
            .format("%Y-%m-%d %H:%M UTC")
            .to_string(),
        None => "never".to_string(),
    };
    INDEX_TEMPLATE.replace(LAST_REFRESH_PLACEHOLDER, &label)
}

async fn index(State(snapshot_store): State<GuardedSnapshotStore>) -> Response {
    match snapshot_store.last_refresh() {
        Ok(refresh) => Html(render_index(refresh.as_ref())).into_response(),
        Err(err) => {
            error!("Failed to read last refresh: {:#}", err);
            internal_server_error()
        }
    }
}

async fn get_map(State(state): State<ServerState>) -> Response {
    match state.chart_builder.render(state.snapshot_store.as_ref()) {
        Ok(payload) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            payload,
        )
            .into_response(),
        Err(err) => {
            error!("Failed to build map chart: {}", err);
            metrics::record_chart_failure(chart_failure_reason(&err));
            internal_server_error()
        }
    }
}

async fn get_status(State(state): State<ServerState>) -> Response {
    let store = &state.snapshot_store;
    let stats = (|| -> Result<ServerStats> {
        Ok(ServerStats {
            uptime: format_uptime(state.start_time.elapsed()),
            version: env!("CARGO_PKG_VERSION"),
            last_refresh: store.last_refresh()?,
            total_rows: store.count(Metric::Total)?,
            death_rows: store.count(Metric::Death)?,
        })
    })();

    match stats {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            error!("Failed to read status: {:#}", err);
            internal_server_error()
        }
    }
}

async fn list_jobs(State(scheduler_handle): State<OptionalSchedulerHandle>) -> Response {
    match scheduler_handle {
        Some(handle) => Json(handle.list_jobs().await).into_response(),
        None => scheduler_unavailable(),
    }
}

async fn get_job(
    State(scheduler_handle): State<OptionalSchedulerHandle>,
    Path(job_id): Path<String>,
) -> Response {
    let Some(handle) = scheduler_handle else {
        return scheduler_unavailable();
    };
    match handle.get_job(&job_id).await {
        Some(job) => Json(job).into_response(),
        None => json_error(StatusCode::NOT_FOUND, format!("Job not found: {}", job_id)),
    }
}

async fn trigger_job(
    State(scheduler_handle): State<OptionalSchedulerHandle>,
    Path(job_id): Path<String>,
) -> Response {
    let Some(handle) = scheduler_handle else {
        return scheduler_unavailable();
    };
    match handle.trigger_job(&job_id).await {
        Ok(()) => {
            info!("Job {} triggered over HTTP", job_id);
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "triggered", "job_id": job_id })),
            )
                .into_response()
        }
        Err(JobError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, format!("Job not found: {}", job_id))
        }
        Err(JobError::AlreadyRunning) => json_error(
            StatusCode::CONFLICT,
            format!("Job already running: {}", job_id),
        ),
        Err(err) => {
            error!("Failed to trigger job {}: {}", job_id, err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub fn make_app(state: ServerState) -> Router {
    let scheduler_routes: Router = Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/run", post(trigger_job))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(index))
        .route("/map", get(get_map))
        .route("/status", get(get_status))
        .with_state(state.clone())
        .nest("/scheduler", scheduler_routes);

    if let Some(static_dir) = &state.config.static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Serve the app and the metrics endpoint until `shutdown_token` is cancelled.
pub async fn run_server(
    config: ServerConfig,
    snapshot_store: GuardedSnapshotStore,
    chart_builder: ChartBuilder,
    scheduler_handle: OptionalSchedulerHandle,
    shutdown_token: CancellationToken,
) -> Result<()> {
    metrics::init_metrics();

    let port = config.port;
    let metrics_port = config.metrics_port;
    let state = ServerState::new(config, snapshot_store, chart_builder, scheduler_handle);
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    let app_shutdown = shutdown_token.clone();
    let metrics_shutdown = shutdown_token.clone();

    let app_server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { app_shutdown.cancelled().await })
            .await
            .context("HTTP server failed")
    };
    let metrics_server = async move {
        axum::serve(metrics_listener, make_metrics_app())
            .with_graceful_shutdown(async move { metrics_shutdown.cancelled().await })
            .await
            .context("Metrics server failed")
    };

    tokio::try_join!(app_server, metrics_server)?;
    Ok(())
}

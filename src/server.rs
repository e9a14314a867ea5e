//! HTTP facade for the backend side of the connector.
//!
//! Mounts two routes:
//! - `POST /query` — accepts a request envelope, runs each visible target
//!   through the injected SQL executor in order, tags produced frames with
//!   the originating `refId` and returns the flattened frame list.
//! - `GET /health` — runs the configured probe statement and reports ok/error.
//!
//! The executor is the seam to whatever actually talks to the store; this
//! module owns none of that.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{debug, error, info};

use crate::datasource::{HealthStatus, HEALTH_PROBE_SQL};
use crate::error::{AppError, AppResult};
use crate::frame::Frame;
use crate::query::{QueryRequest, QueryResponse};

/// Executes one resolved statement against the backing store and returns its
/// frames. Implementations own connectivity, pooling and timeouts.
pub trait SqlExecutor: Send + Sync + 'static {
    fn run(&self, sql: &str) -> impl Future<Output = anyhow::Result<Vec<Frame>>> + Send;
}

/// Shared server state injected into all handlers.
pub struct AppState<E> {
    pub executor: Arc<E>,
    pub probe_sql: String,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        AppState { executor: self.executor.clone(), probe_sql: self.probe_sql.clone() }
    }
}

impl<E: SqlExecutor> AppState<E> {
    pub fn new(executor: E) -> Self {
        AppState { executor: Arc::new(executor), probe_sql: HEALTH_PROBE_SQL.to_string() }
    }
}

/// Run every visible target in order and flatten the results. Hidden targets
/// are skipped without consuming an executor call; any executor fault fails
/// the whole request.
pub async fn run_queries<E: SqlExecutor>(
    executor: &E,
    request: &QueryRequest,
) -> anyhow::Result<QueryResponse> {
    let mut data: Vec<Frame> = Vec::new();
    for target in &request.targets {
        if target.hide {
            debug!(target: "tabsource", "skipping hidden target {}", target.ref_id);
            continue;
        }
        let sql = target.query_text.as_deref().unwrap_or("");
        let frames = executor.run(sql).await?;
        for mut frame in frames {
            frame.ref_id = Some(target.ref_id.clone());
            data.push(frame);
        }
    }
    Ok(QueryResponse { data })
}

async fn query_handler<E: SqlExecutor>(
    State(state): State<AppState<E>>,
    Json(request): Json<QueryRequest>,
) -> AppResult<Json<QueryResponse>> {
    if request.targets.is_empty() {
        return Err(AppError::user("empty_request", "request has no targets"));
    }
    match run_queries(state.executor.as_ref(), &request).await {
        Ok(res) => Ok(Json(res)),
        Err(e) => {
            error!(target: "tabsource", "query failed: {}", e);
            Err(AppError::from(e))
        }
    }
}

async fn health_handler<E: SqlExecutor>(
    State(state): State<AppState<E>>,
) -> Json<HealthStatus> {
    match state.executor.run(&state.probe_sql).await {
        Ok(frames) => {
            let detail = frames
                .first()
                .and_then(|f| f.first_field())
                .and_then(|f| f.values.first())
                .map(|v| v.to_string());
            let message = match detail {
                Some(ts) => format!("Check successful; current timestamp = {}", ts),
                None => "Check successful".to_string(),
            };
            Json(HealthStatus { status: "ok".to_string(), message })
        }
        Err(e) => Json(HealthStatus { status: "error".to_string(), message: e.to_string() }),
    }
}

/// Build the router over the given state.
pub fn router<E: SqlExecutor>(state: AppState<E>) -> Router {
    Router::new()
        .route("/query", post(query_handler::<E>))
        .route("/health", get(health_handler::<E>))
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run<E: SqlExecutor>(addr: &str, state: AppState<E>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: "tabsource", "listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

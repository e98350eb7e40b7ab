use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::data::snapshot::{MarketSnapshot, SnapshotPayload};
use crate::data::store::MarketStore;
use crate::error::SchedulerError;
use crate::services::journal::EventJournal;
use crate::services::router::SignalRouter;
use crate::services::scheduler::TickScheduler;

pub struct AppState {
    pub router: Arc<SignalRouter>,
    pub scheduler: TickScheduler,
    pub store: MarketStore,
    pub journal: EventJournal,
    pub config: AppConfig,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signals/latest", get(latest_signal))
        .route("/signals/history", get(signal_history))
        .route("/tick", post(run_tick))
        .route("/start", post(start_scheduler))
        .route("/stop", post(stop_scheduler))
        .route("/snapshots", post(ingest_snapshot))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>) -> std::io::Result<()> {
    let bind = state.config.api.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🌐 [API] Server listening on {}", bind);
    axum::serve(listener, app(state)).await
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let running = state.scheduler.is_running().await;
    Json(json!({
        "status": "ok",
        "symbol": state.router.symbol(),
        "scheduler_running": running,
        "schedule": state.scheduler.cron(),
        "sources": state.router.aggregator().registry().ids(),
        "policy": state.router.aggregator().config().policy.as_str(),
        "journal": state.journal.summary(),
    }))
}

async fn latest_signal(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.router.smoother().latest() {
        Some(entry) => Json(json!(entry)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"status": "no_signals"}))).into_response(),
    }
}

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn signal_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let history = state.router.smoother().history();
    let limit = params.limit.unwrap_or(history.len());
    let start = history.len().saturating_sub(limit);
    Json(json!({
        "count": history.len() - start,
        "history": &history[start..],
    }))
}

async fn run_tick(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.router.tick().await {
        Some(decision) => Json(json!(decision)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "abandoned"})),
        )
            .into_response(),
    }
}

async fn start_scheduler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.scheduler.start().await {
        Ok(()) => Json(json!({"status": "started"})).into_response(),
        Err(SchedulerError::AlreadyRunning) => Json(json!({"status": "already_running"})).into_response(),
        Err(e) => {
            error!("❌ [API] Failed to start scheduler: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": e.to_string()})),
            )
                .into_response()
        }
    }
}

async fn stop_scheduler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.scheduler.stop().await {
        Ok(()) => Json(json!({"status": "stopped"})).into_response(),
        Err(SchedulerError::NotRunning) => Json(json!({"status": "not_running"})).into_response(),
        Err(e) => {
            error!("❌ [API] Failed to stop scheduler: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": e.to_string()})),
            )
                .into_response()
        }
    }
}

async fn ingest_snapshot(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SnapshotPayload>,
) -> impl IntoResponse {
    match MarketSnapshot::try_from(payload) {
        Ok(snapshot) => {
            state.store.ingest_snapshot(&snapshot);
            info!(
                "📥 [API] Ingested {} bars for {} ({})",
                snapshot.len(),
                snapshot.symbol,
                snapshot.timeframe
            );
            Json(json!({
                "status": "ingested",
                "symbol": snapshot.symbol,
                "bars": snapshot.len().min(state.store.limit),
            }))
            .into_response()
        }
        Err(e) => {
            warn!("⚠️ [API] Rejected snapshot: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "rejected", "message": e.to_string()})),
            )
                .into_response()
        }
    }
}

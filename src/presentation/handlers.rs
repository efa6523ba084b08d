// HTTP request handlers
use crate::domain::chart::{ChartMode, ChartRequest};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const DEFAULT_HOURS: u32 = 1;
const DEFAULT_MINI_HOURS: u32 = 12;

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub hours: Option<u32>,
    pub cut_peak: Option<bool>,
    pub mini: Option<bool>,
}

impl ChartQuery {
    fn to_request(&self) -> ChartRequest {
        let mini = self.mini.unwrap_or(false);
        let (mode, default_hours) = if mini {
            (ChartMode::Mini, DEFAULT_MINI_HOURS)
        } else {
            (ChartMode::Full, DEFAULT_HOURS)
        };

        ChartRequest::new(self.hours.unwrap_or(default_hours))
            .with_cut_peak(self.cut_peak.unwrap_or(false))
            .with_mode(mode)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/charts/views", get(chart_views))
        .route("/charts/ping/:uuid", get(ping_chart))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Normalized ping chart for one node
pub async fn ping_chart(
    Path(uuid): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    match state.chart_service.get_chart(&uuid, query.to_request()).await {
        Ok(chart) => respond(StatusCode::OK, &chart, compress).await,
        Err(e) => backend_error(e, compress).await,
    }
}

/// History ranges the backend can serve
pub async fn chart_views(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);

    match state.chart_service.list_views().await {
        Ok(views) => respond(StatusCode::OK, &views, compress).await,
        Err(e) => backend_error(e, compress).await,
    }
}

async fn backend_error(e: anyhow::Error, compress: bool) -> Response {
    tracing::error!("Backend request failed: {:#}", e);
    let body = ErrorBody {
        error: format!("{:#}", e),
    };
    respond(StatusCode::BAD_GATEWAY, &body, compress).await
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

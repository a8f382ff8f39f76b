//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "docparse-server";

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct AnalyzerStatus {
    pub enable_table: bool,
    pub enable_formula: bool,
    pub lang: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
pub struct DetailedHealthResponse {
    #[serde(flatten)]
    pub health: HealthResponse,
    pub inference_available: bool,
    pub analyzer: AnalyzerStatus,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Docparse API is running",
        status: "running",
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(basic_health())
}

pub async fn detailed_health(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let inference_available = state.engine().is_available().await;
    if !inference_available {
        tracing::warn!("Inference service is not reachable");
    }

    let analyzer = &state.config().analyzer;
    Json(DetailedHealthResponse {
        health: basic_health(),
        inference_available,
        analyzer: AnalyzerStatus {
            enable_table: analyzer.enable_table,
            enable_formula: analyzer.enable_formula,
            lang: analyzer.lang.clone(),
            timeout_secs: analyzer.timeout_secs,
        },
    })
}

fn basic_health() -> HealthResponse {
    HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health))
}

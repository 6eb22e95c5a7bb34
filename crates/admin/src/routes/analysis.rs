//! Business metrics and the narrative analysis.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use kennel_core::BusinessMetrics;

use crate::error::AppError;
use crate::services::{self, AnalysisReport, AnalysisService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analysis", post(analyze))
        .route("/api/analysis/metrics", get(metrics))
}

fn service(state: &AppState) -> AnalysisService<'_> {
    AnalysisService::new(state.data(), state.store(), state.analysis())
}

/// The metrics payload without calling the model.
async fn metrics(State(state): State<AppState>) -> Result<Json<BusinessMetrics>, AppError> {
    let metrics = service(&state).metrics(services::today()).await?;
    Ok(Json(metrics))
}

/// Returns 503 when no analysis key is configured.
async fn analyze(State(state): State<AppState>) -> Result<Json<AnalysisReport>, AppError> {
    let report = service(&state).analyze(services::today()).await?;
    Ok(Json(report))
}

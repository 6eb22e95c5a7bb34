use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use kennel_core::FinancialSummary;

use super::ListParams;
use crate::db::ListQuery;
use crate::error::AppError;
use crate::services::FinanceService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/finance/summary", get(summary))
}

async fn summary(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<FinancialSummary>, AppError> {
    let query = ListQuery::try_from(params)?;
    let summary = FinanceService::new(state.data(), state.store())
        .summary(&query)
        .await?;
    Ok(Json(summary))
}

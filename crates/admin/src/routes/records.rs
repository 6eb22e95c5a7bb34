//! Handlers for the per-dog record tables. These are read straight from the
//! data store and never cached.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use kennel_core::{
    Expense, GrowthEvent, HealthRecord, Litter, NewLitter, Purchase, PurchaseView, Sale,
    SaleView, Validate,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ListParams;
use crate::db::{ListQuery, Record};
use crate::error::AppError;
use crate::services::{self, FinanceService, RecordService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/purchases",
            get(list_purchases).post(create::<Purchase>),
        )
        .route("/api/purchases/{id}", delete(remove::<Purchase>))
        .route("/api/sales", get(list_sales).post(create::<Sale>))
        .route("/api/sales/{id}", delete(remove::<Sale>))
        .route("/api/expenses", get(list::<Expense>).post(create::<Expense>))
        .route("/api/expenses/{id}", delete(remove::<Expense>))
        .route("/api/litters", get(list::<Litter>).post(create_litter))
        .route("/api/litters/{id}", delete(remove::<Litter>))
        .route(
            "/api/health-records",
            get(list::<HealthRecord>).post(create::<HealthRecord>),
        )
        .route("/api/health-records/{id}", delete(remove::<HealthRecord>))
        .route(
            "/api/growth-events",
            get(list::<GrowthEvent>).post(create::<GrowthEvent>),
        )
        .route("/api/growth-events/{id}", delete(remove::<GrowthEvent>))
}

async fn list<R>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<R>>, AppError>
where
    R: Record + Serialize,
    R::New: Validate,
{
    let query = ListQuery::try_from(params)?;
    let rows = RecordService::<R>::new(state.data(), state.store())
        .list(&query)
        .await?;
    Ok(Json(rows))
}

async fn create<R>(
    State(state): State<AppState>,
    Json(input): Json<R::New>,
) -> Result<(StatusCode, Json<R>), AppError>
where
    R: Record + Serialize,
    R::New: Validate + DeserializeOwned,
{
    let row = RecordService::<R>::new(state.data(), state.store())
        .create(&input, services::today())
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn remove<R>(
    State(state): State<AppState>,
    Path(id): Path<R::Id>,
) -> Result<StatusCode, AppError>
where
    R: Record,
    R::Id: DeserializeOwned,
    R::New: Validate,
{
    RecordService::<R>::new(state.data(), state.store())
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Purchases with the bought dog's details.
async fn list_purchases(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PurchaseView>>, AppError> {
    let query = ListQuery::try_from(params)?;
    let rows = FinanceService::new(state.data(), state.store())
        .purchases(&query)
        .await?;
    Ok(Json(rows))
}

/// Sales with the sold dog's details.
async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SaleView>>, AppError> {
    let query = ListQuery::try_from(params)?;
    let rows = FinanceService::new(state.data(), state.store())
        .sales(&query)
        .await?;
    Ok(Json(rows))
}

/// Litters also have their parents' sexes checked against the roster.
async fn create_litter(
    State(state): State<AppState>,
    Json(input): Json<NewLitter>,
) -> Result<(StatusCode, Json<Litter>), AppError> {
    let litter = RecordService::<Litter>::new(state.data(), state.store())
        .create_litter(&input, services::today())
        .await?;
    Ok((StatusCode::CREATED, Json(litter)))
}

//! Roster handlers. Reads come from the store; writes go to the data store
//! first and are then mirrored into the store.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use kennel_core::{Dog, DogId, DogPatch, NewDog, QrCode};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::{self, DogService, RefreshOutcome};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dogs", get(list).post(create))
        .route("/api/dogs/refresh", post(refresh))
        .route("/api/dogs/{id}", patch(update).delete(remove))
        .route("/api/dogs/{id}/qrcode", get(qr_code).put(save_qr_code))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRequest {
    pub code_url: String,
}

async fn list(State(state): State<AppState>) -> Json<Vec<Dog>> {
    Json(state.store().dogs())
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshOutcome>, AppError> {
    let outcome = DogService::new(state.data(), state.store())
        .refresh()
        .await?;
    Ok(Json(outcome))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewDog>,
) -> Result<(StatusCode, Json<Dog>), AppError> {
    let dog = DogService::new(state.data(), state.store())
        .create(&input, services::today())
        .await?;
    Ok((StatusCode::CREATED, Json(dog)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<DogId>,
    Json(patch): Json<DogPatch>,
) -> Result<Json<Dog>, AppError> {
    let dog = DogService::new(state.data(), state.store())
        .update(id, &patch, services::today())
        .await?;
    Ok(Json(dog))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<DogId>,
) -> Result<StatusCode, AppError> {
    DogService::new(state.data(), state.store())
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn qr_code(
    State(state): State<AppState>,
    Path(id): Path<DogId>,
) -> Result<Json<QrCode>, AppError> {
    DogService::new(state.data(), state.store())
        .qr_code(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("QR code for dog {id}")))
}

async fn save_qr_code(
    State(state): State<AppState>,
    Path(id): Path<DogId>,
    Json(body): Json<QrCodeRequest>,
) -> Result<Json<QrCode>, AppError> {
    let code = DogService::new(state.data(), state.store())
        .save_qr_code(id, &body.code_url)
        .await?;
    Ok(Json(code))
}

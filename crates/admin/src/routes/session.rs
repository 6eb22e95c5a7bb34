//! Session and status handlers: who is signed in, which dog is selected,
//! and the UI flags.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
};
use kennel_core::{Dog, DogId, User};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::DogService;
use crate::state::AppState;
use crate::store::AppStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(show))
        .route("/api/session/user", put(set_user))
        .route("/api/session/selected-dog", put(select_dog))
        .route("/api/status", get(status))
        .route("/api/status/error", delete(clear_error))
}

/// The durable part of the store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Option<User>,
    pub selected_dog: Option<Dog>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub is_loading: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectDogRequest {
    pub dog_id: Option<DogId>,
}

fn session_view(state: &AppState) -> SessionView {
    state.store().read(|s| SessionView {
        user: s.current_user().cloned(),
        selected_dog: s.selected_dog().cloned(),
    })
}

async fn show(State(state): State<AppState>) -> Json<SessionView> {
    Json(session_view(&state))
}

/// Sign a user in (`null` signs out).
async fn set_user(
    State(state): State<AppState>,
    Json(user): Json<Option<User>>,
) -> Json<SessionView> {
    tracing::info!(user = ?user.as_ref().map(|u| u.id), "Session user changed");
    state.store().write(|s| s.set_user(user));
    Json(session_view(&state))
}

/// Select a dog by id (`null` clears the selection).
///
/// # Errors
///
/// Returns 404 if the dog does not exist, or 502 if the data store fails.
async fn select_dog(
    State(state): State<AppState>,
    Json(body): Json<SelectDogRequest>,
) -> Result<Json<SessionView>, AppError> {
    DogService::new(state.data(), state.store())
        .select(body.dog_id)
        .await?;
    Ok(Json(session_view(&state)))
}

async fn status(State(state): State<AppState>) -> Json<StatusView> {
    Json(state.store().read(|s| StatusView {
        is_loading: s.is_loading(),
        last_error: s.last_error().map(str::to_string),
    }))
}

async fn clear_error(State(state): State<AppState>) -> StatusCode {
    state.store().write(AppStore::clear_error);
    StatusCode::NO_CONTENT
}

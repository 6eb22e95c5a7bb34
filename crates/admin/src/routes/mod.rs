//! JSON API for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Data store reachable
//!
//! # Session
//! GET    /api/session                  - Current user and selected dog
//! PUT    /api/session/user             - Set or clear the current user
//! PUT    /api/session/selected-dog     - Set or clear the selected dog
//! GET    /api/status                   - Loading flag and last error
//! DELETE /api/status/error             - Dismiss the last error
//!
//! # Dogs
//! GET    /api/dogs                     - Roster held by the store
//! POST   /api/dogs/refresh             - Re-read the roster
//! POST   /api/dogs                     - Register a dog
//! PATCH  /api/dogs/{id}                - Update a dog
//! DELETE /api/dogs/{id}                - Delete a dog
//! GET    /api/dogs/{id}/qrcode         - QR code lookup
//! PUT    /api/dogs/{id}/qrcode         - Store a generated QR code
//!
//! # Records (purchases, sales, expenses, litters, health-records, growth-events)
//! GET    /api/{table}                  - List (dog_id, from, to)
//! POST   /api/{table}                  - Create
//! DELETE /api/{table}/{id}             - Delete
//!
//! # Finance and analysis
//! GET    /api/finance/summary          - Totals (dog_id, from, to)
//! GET    /api/analysis/metrics         - Business metrics snapshot
//! POST   /api/analysis                 - Narrative analysis
//! ```

mod analysis;
mod dogs;
mod finance;
mod records;
mod session;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use kennel_core::DogId;
use serde::Deserialize;

use crate::db::ListQuery;
use crate::error::AppError;
use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(session::router())
        .merge(dogs::router())
        .merge(records::router())
        .merge(finance::router())
        .merge(analysis::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the data store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.data().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Query parameters accepted by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub dog_id: Option<DogId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TryFrom<ListParams> for ListQuery {
    type Error = AppError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        if let (Some(from), Some(to)) = (params.from, params.to) {
            if from > to {
                return Err(AppError::BadRequest(format!(
                    "'from' ({from}) is after 'to' ({to})"
                )));
            }
        }

        let query = Self::new().between(params.from, params.to);
        Ok(match params.dog_id {
            Some(dog_id) => query.for_dog(dog_id),
            None => query,
        })
    }
}

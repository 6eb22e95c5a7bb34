//! Unified error handling for the dashboard API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kennel_core::{LineageError, ValidationError};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::db::RepositoryError;

/// Application-level error type for the dashboard API.
#[derive(Debug, Error)]
pub enum AppError {
    /// The hosted data store failed or refused the request.
    #[error("Data store error: {0}")]
    Repository(#[from] RepositoryError),

    /// The narrative analysis request failed.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Narrative analysis is not configured.
    #[error("Analysis is not configured")]
    AnalysisDisabled,

    /// Form input was rejected.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Proposed parents were rejected.
    #[error("Invalid lineage: {0}")]
    Lineage(#[from] LineageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error comes from one of the external collaborators and
    /// should be shown in the dashboard's error banner.
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::Analysis(_))
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Repository(RepositoryError::NotFound) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Repository(_) | Self::Analysis(_) => StatusCode::BAD_GATEWAY,
            Self::AnalysisDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) | Self::Lineage(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server-side failures with Sentry
        if status.is_server_error() && !matches!(self, Self::AnalysisDisabled) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Repository(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Repository(_) => "Data store request failed".to_string(),
            Self::Analysis(AnalysisError::Api { status, .. }) => {
                format!("Analysis service returned status {status}")
            }
            Self::Analysis(_) => "Analysis request failed".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use kennel_core::DogId;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Repository(RepositoryError::Api {
                status: 500,
                body: "boom".to_string()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Repository(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Lineage(LineageError::OwnParent(DogId::generate())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation(ValidationError::Blank { field: "name" }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AnalysisDisabled.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_response_hides_upstream_body() {
        let response = AppError::Repository(RepositoryError::Api {
            status: 500,
            body: "secret internals".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_collaborator_failures() {
        assert!(AppError::Repository(RepositoryError::NotFound).is_collaborator_failure());
        assert!(!AppError::BadRequest("x".to_string()).is_collaborator_failure());
    }
}

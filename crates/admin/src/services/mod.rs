//! Business logic services for the dashboard.
//!
//! Services sit between the HTTP handlers and the two collaborators. They
//! validate input, call the hosted data store, and then record the outcome
//! in the application state store. Collaborator failures are written to the
//! store's `last_error` before being returned.
//!
//! # Services
//!
//! - `dogs` - Roster refresh, dog CRUD with pedigree checks, selection, QR codes
//! - `records` - CRUD for trades, expenses, litters, health and growth records
//! - `finance` - Financial summary and trade views
//! - `analysis` - Business metrics and the narrative analysis

pub mod analysis;
pub mod dogs;
pub mod finance;
pub mod records;

use chrono::{NaiveDate, Utc};
use kennel_core::{DogId, LineageError, ValidationError};
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::store::StoreHandle;

pub use analysis::{AnalysisReport, AnalysisService};
pub use dogs::{DogService, RefreshOutcome};
pub use finance::FinanceService;
pub use records::RecordService;

/// Errors returned by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lineage(#[from] LineageError),

    #[error("dog {0} not found")]
    DogNotFound(DogId),

    #[error("analysis is not configured")]
    AnalysisDisabled,
}

impl ServiceError {
    /// Failures of the data store or the analysis API, other than a
    /// missing row.
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::Repository(
                RepositoryError::Http(_)
                    | RepositoryError::Api { .. }
                    | RepositoryError::Unauthorized(_)
                    | RepositoryError::Parse(_)
            ) | Self::Analysis(_)
        )
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Repository(e) => Self::Repository(e),
            ServiceError::Analysis(e) => Self::Analysis(e),
            ServiceError::Validation(e) => Self::Validation(e),
            ServiceError::Lineage(e) => Self::Lineage(e),
            ServiceError::DogNotFound(id) => Self::NotFound(format!("dog {id}")),
            ServiceError::AnalysisDisabled => Self::AnalysisDisabled,
        }
    }
}

/// Today's date in UTC, the reference for "not in the future" checks.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Convert `result`'s error and, for collaborator failures, raise it in the
/// store's error banner.
pub(crate) fn flag<T, E>(store: &StoreHandle, result: Result<T, E>) -> Result<T, ServiceError>
where
    E: Into<ServiceError>,
{
    result.map_err(|e| {
        let err = e.into();
        if err.is_collaborator_failure() {
            tracing::warn!(error = %err, "Collaborator request failed");
            store.set_error(err.to_string());
        }
        err
    })
}

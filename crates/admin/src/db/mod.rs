//! Access to the hosted data store.
//!
//! The store exposes its tables through a PostgREST-style REST API under
//! `{DATA_STORE_URL}/rest/v1/`.
//!
//! ## Tables
//!
//! - `dogs` - The roster
//! - `purchases`, `sales`, `expenses` - The books
//! - `litters` - Breeding records
//! - `health_records` - Vaccinations, checkups and treatments
//! - `growth_events` - Growth milestones with photos
//! - `qrcodes` - One QR code per dog, keyed by `dog_id`

mod client;
pub mod query;
pub mod repository;

use thiserror::Error;

pub use client::DataClient;
pub use query::{Direction, ListQuery};
pub use repository::{
    DogRepository, ExpenseRepository, GrowthEventRepository, HealthRecordRepository,
    LitterRepository, PurchaseRepository, QrCodeRepository, Record, Repository, SaleRepository,
    Table,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Transport-level failure talking to the data store.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The data store answered with a non-success status.
    #[error("data store error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Requested row was not found.
    #[error("not found")]
    NotFound,

    /// A row did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

//! Kennel Desk Core - Shared domain library.
//!
//! This crate provides the records and rules shared by the admin backend and
//! its tests:
//! - typed ids, money and enumerated attributes
//! - the stored records (dogs, trades, expenses, litters, health, growth,
//!   QR codes) and their form inputs
//! - validation of form input and of pedigree links
//! - derived finance figures and the business metrics snapshot
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks (callers pass `today` in). This keeps it usable from
//! anywhere and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails and statuses
//! - [`models`] - Stored records and their `New*` inputs
//! - [`validation`] - Form input checks
//! - [`lineage`] - Sire/dam graph checks
//! - [`finance`] - Financial summary and trade display joins
//! - [`metrics`] - Business metrics for the narrative analysis

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod finance;
pub mod lineage;
pub mod metrics;
pub mod models;
pub mod types;
pub mod validation;

pub use finance::{FinancialSummary, PurchaseView, SaleView};
pub use lineage::{LineageError, Pedigree};
pub use metrics::{BusinessMetrics, MetricsInput};
pub use models::*;
pub use types::*;
pub use validation::{Validate, ValidationError};

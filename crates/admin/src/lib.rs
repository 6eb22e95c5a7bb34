//! Kennel Desk admin backend.
//!
//! This crate provides the dashboard backend as a library, allowing it to be
//! tested and reused:
//! - [`store`] - The application state store and its durable subset
//! - [`db`] - Client and repositories for the hosted data store
//! - [`analysis`] - Client for the narrative business analysis
//! - [`services`] - Roster sync, record CRUD, finance and analysis
//! - [`routes`] - The JSON API
//!
//! The binary in `main.rs` wires these together with logging, error
//! tracking and graceful shutdown.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

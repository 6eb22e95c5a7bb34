//! Core value types for Kennel Desk.
//!
//! This module provides type-safe wrappers for ids, money, emails and the
//! enumerated record attributes.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;

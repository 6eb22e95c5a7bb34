//! Input validation for records submitted from the dashboard forms.
//!
//! The application state store accepts whatever it is given, so every form
//! submission passes through these checks before it reaches the hosted store
//! or the roster.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use crate::types::Money;

/// A single broken rule on a submitted record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be blank")]
    Blank { field: &'static str },

    #[error("{field} cannot be in the future ({date})")]
    FutureDate { field: &'static str, date: NaiveDate },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("{field} must be an http(s) URL")]
    NotAUrl { field: &'static str },

    #[error("{0}")]
    Invalid(String),
}

/// Types that can check themselves before being written.
pub trait Validate {
    /// Check the record against `today`'s date.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError>;
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

pub(crate) fn require_optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| require_text(field, v))
}

pub(crate) fn require_past(
    field: &'static str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if date > today {
        return Err(ValidationError::FutureDate { field, date });
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: Money) -> Result<(), ValidationError> {
    if value.is_negative() {
        return Err(ValidationError::Negative { field });
    }
    Ok(())
}

pub(crate) fn require_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value.trim()).map_err(|_| ValidationError::NotAUrl { field })?;
    let web = matches!(url.scheme(), "http" | "https");
    if !web || url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::NotAUrl { field });
    }
    Ok(())
}

pub(crate) fn require_optional_url(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| require_url(field, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Bella").is_ok());
        assert_eq!(
            require_text("name", "  "),
            Err(ValidationError::Blank { field: "name" })
        );
    }

    #[test]
    fn test_require_past_allows_today() {
        let today = day(2024, 5, 1);
        assert!(require_past("birth_date", today, today).is_ok());
        assert!(require_past("birth_date", day(2024, 5, 2), today).is_err());
    }

    #[test]
    fn test_require_url() {
        assert!(require_url("photo", "https://cdn.example.com/a.jpg").is_ok());
        assert!(require_url("photo", "http://x").is_ok());
        assert!(require_url("photo", "ftp://x").is_err());
        assert!(require_url("photo", "https://").is_err());
        assert!(require_url("photo", "mailto:vet@clinic.dk").is_err());
        assert!(require_url("photos", "https://exa mple.com/a b.jpg").is_err());
        assert!(require_url("photos", "http://:::").is_err());
        assert!(require_url("photos", "https://%%%").is_err());
    }

    #[test]
    fn test_amount_checks() {
        assert!(require_positive("weight", Decimal::new(125, 1)).is_ok());
        assert!(require_positive("weight", Decimal::ZERO).is_err());
        assert!(require_non_negative("amount", Money::ZERO).is_ok());
        assert!(require_non_negative("amount", Money::from_cents(-1)).is_err());
    }
}

//! Records attached to dogs: trades, costs, litters, health and growth.
//!
//! Each table has a stored form (with `id` and `created_at` assigned by the
//! hosted store) and a `New*` form input.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    DogId, ExpenseCategory, ExpenseId, GrowthEventId, HealthRecordId, HealthRecordType, LitterId,
    Money, PurchaseId, SaleId,
};
use crate::validation::{
    Validate, ValidationError, require_non_negative, require_optional_url, require_past,
    require_text, require_url,
};

// =============================================================================
// Finance
// =============================================================================

/// A dog bought into the kennel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub dog_id: DogId,
    pub price: Money,
    pub purchase_date: NaiveDate,
    pub seller_name: String,
    #[serde(default)]
    pub seller_contact: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub dog_id: DogId,
    pub price: Money,
    pub purchase_date: NaiveDate,
    pub seller_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for NewPurchase {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_non_negative("price", self.price)?;
        require_past("purchase_date", self.purchase_date, today)?;
        require_text("seller_name", &self.seller_name)
    }
}

/// A dog sold to a buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub dog_id: DogId,
    pub price: Money,
    pub sale_date: NaiveDate,
    pub buyer_name: String,
    #[serde(default)]
    pub buyer_contact: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub dog_id: DogId,
    pub price: Money,
    pub sale_date: NaiveDate,
    pub buyer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for NewSale {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_non_negative("price", self.price)?;
        require_past("sale_date", self.sale_date, today)?;
        require_text("buyer_name", &self.buyer_name)
    }
}

/// A running cost booked against a dog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub dog_id: DogId,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub dog_id: DogId,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub expense_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for NewExpense {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_non_negative("amount", self.amount)?;
        require_past("expense_date", self.expense_date, today)
    }
}

// =============================================================================
// Breeding
// =============================================================================

/// A litter whelped by `dam_id` and sired by `sire_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Litter {
    pub id: LitterId,
    pub sire_id: DogId,
    pub dam_id: DogId,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub puppy_ids: Vec<DogId>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Litter {
    #[must_use]
    pub fn size(&self) -> usize {
        self.puppy_ids.len()
    }

    /// Whether `dog_id` took part in the litter as a parent or a puppy.
    #[must_use]
    pub fn involves(&self, dog_id: DogId) -> bool {
        self.sire_id == dog_id || self.dam_id == dog_id || self.puppy_ids.contains(&dog_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLitter {
    pub sire_id: DogId,
    pub dam_id: DogId,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub puppy_ids: Vec<DogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for NewLitter {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_past("birth_date", self.birth_date, today)?;
        if self.sire_id == self.dam_id {
            return Err(ValidationError::Invalid(
                "sire and dam must be different dogs".to_string(),
            ));
        }
        if self
            .puppy_ids
            .iter()
            .any(|puppy| *puppy == self.sire_id || *puppy == self.dam_id)
        {
            return Err(ValidationError::Invalid(
                "a parent cannot be listed as its own puppy".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Health & growth
// =============================================================================

/// A vaccination, checkup or treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: HealthRecordId,
    pub dog_id: DogId,
    #[serde(rename = "type")]
    pub record_type: HealthRecordType,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHealthRecord {
    pub dog_id: DogId,
    #[serde(rename = "type")]
    pub record_type: HealthRecordType,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

impl Validate for NewHealthRecord {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_past("date", self.date, today)?;
        require_text("description", &self.description)?;
        require_optional_url("document_url", self.document_url.as_deref())
    }
}

/// A growth milestone, usually a dated photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthEvent {
    pub id: GrowthEventId,
    pub dog_id: DogId,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGrowthEvent {
    pub dog_id: DogId,
    pub event_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for NewGrowthEvent {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_past("event_date", self.event_date, today)?;
        require_optional_url("photo_url", self.photo_url.as_deref())?;
        if self.photo_url.is_none() && self.notes.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(ValidationError::Invalid(
                "a growth event needs a photo or notes".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// QR codes
// =============================================================================

/// The generated QR code for a dog's public profile. One per dog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    pub dog_id: DogId,
    pub code_url: String,
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    /// Build a fresh code record stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAUrl`] if `code_url` is not an http(s)
    /// URL.
    pub fn new(
        dog_id: DogId,
        code_url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let code_url = code_url.into();
        require_url("code_url", &code_url)?;
        Ok(Self {
            dog_id,
            code_url,
            updated_at: now,
        })
    }
}

//! Dogs: the aggregation root every other record hangs off.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{DogId, DogStatus, Gender};
use crate::validation::{
    Validate, ValidationError, require_optional_text, require_past, require_positive, require_text,
    require_url,
};

/// A dog known to the kennel, as stored in the `dogs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub name: String,
    pub breed: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub color: String,
    /// Weight in kilograms.
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub microchip_id: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub owner_contact: Option<String>,
    #[serde(default)]
    pub status: DogStatus,
    /// Photo URLs, first one is the profile picture.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub sire_id: Option<DogId>,
    #[serde(default)]
    pub dam_id: Option<DogId>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Form input for registering a dog. The hosted store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDog {
    pub name: String,
    pub breed: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microchip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_contact: Option<String>,
    #[serde(default)]
    pub status: DogStatus,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sire_id: Option<DogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dam_id: Option<DogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for NewDog {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("breed", &self.breed)?;
        require_text("color", &self.color)?;
        require_past("birth_date", self.birth_date, today)?;
        if let Some(weight) = self.weight {
            require_positive("weight", weight)?;
        }
        require_optional_text("microchip_id", self.microchip_id.as_deref())?;
        require_optional_text("registration_number", self.registration_number.as_deref())?;
        for photo in &self.photos {
            require_url("photos", photo)?;
        }
        Ok(())
    }
}

/// Partial update of a [`Dog`].
///
/// Absent fields are left alone. For nullable columns the outer `Option`
/// says "touch this field" and the inner one carries the new value, so
/// `Some(None)` clears it. `id` and `created_at` cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub weight: Option<Option<Decimal>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub microchip_id: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub registration_number: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub owner_contact: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DogStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub sire_id: Option<Option<DogId>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub dam_id: Option<Option<DogId>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub notes: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub updated_at: Option<Option<DateTime<Utc>>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing key (`None`,
/// via `#[serde(default)]`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl DogPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: DogStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether applying the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields present in the patch, one by one.
    pub fn apply_to(&self, dog: &mut Dog) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        set(&mut dog.name, self.name.as_ref());
        set(&mut dog.breed, self.breed.as_ref());
        set(&mut dog.gender, self.gender.as_ref());
        set(&mut dog.birth_date, self.birth_date.as_ref());
        set(&mut dog.color, self.color.as_ref());
        set(&mut dog.weight, self.weight.as_ref());
        set(&mut dog.microchip_id, self.microchip_id.as_ref());
        set(&mut dog.registration_number, self.registration_number.as_ref());
        set(&mut dog.owner_contact, self.owner_contact.as_ref());
        set(&mut dog.status, self.status.as_ref());
        set(&mut dog.photos, self.photos.as_ref());
        set(&mut dog.sire_id, self.sire_id.as_ref());
        set(&mut dog.dam_id, self.dam_id.as_ref());
        set(&mut dog.notes, self.notes.as_ref());
        set(&mut dog.updated_at, self.updated_at.as_ref());
    }

    /// Return a copy of `dog` with the patch applied.
    #[must_use]
    pub fn merged(&self, dog: &Dog) -> Dog {
        let mut merged = dog.clone();
        self.apply_to(&mut merged);
        merged
    }
}

impl Validate for DogPatch {
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_optional_text("name", self.name.as_deref())?;
        require_optional_text("breed", self.breed.as_deref())?;
        require_optional_text("color", self.color.as_deref())?;
        if let Some(birth_date) = self.birth_date {
            require_past("birth_date", birth_date, today)?;
        }
        if let Some(Some(weight)) = self.weight {
            require_positive("weight", weight)?;
        }
        for photo in self.photos.iter().flatten() {
            require_url("photos", photo)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_dog() -> Dog {
        Dog {
            id: DogId::generate(),
            name: "Bella".to_string(),
            breed: "Samoyed".to_string(),
            gender: Gender::Female,
            birth_date: NaiveDate::from_ymd_opt(2022, 3, 15).unwrap(),
            color: "white".to_string(),
            weight: Some(Decimal::new(215, 1)),
            microchip_id: Some("985112004536789".to_string()),
            registration_number: None,
            owner_contact: None,
            status: DogStatus::Owned,
            photos: vec!["https://cdn.example.com/bella.jpg".to_string()],
            sire_id: None,
            dam_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_patch_overwrites_only_present_fields() {
        let dog = sample_dog();
        let patch = DogPatch {
            status: Some(DogStatus::Sold),
            notes: Some(Some("to Oslo".to_string())),
            ..DogPatch::default()
        };

        let merged = patch.merged(&dog);
        assert_eq!(merged.status, DogStatus::Sold);
        assert_eq!(merged.notes.as_deref(), Some("to Oslo"));
        assert_eq!(merged.id, dog.id);
        assert_eq!(merged.name, dog.name);
        assert_eq!(merged.weight, dog.weight);
        assert_eq!(merged.photos, dog.photos);
    }

    #[test]
    fn test_patch_explicit_null_clears_field() {
        let patch: DogPatch = serde_json::from_str(r#"{"microchip_id": null}"#).unwrap();
        assert_eq!(patch.microchip_id, Some(None));
        assert_eq!(patch.weight, None);

        let merged = patch.merged(&sample_dog());
        assert_eq!(merged.microchip_id, None);
        assert!(merged.weight.is_some());
    }

    #[test]
    fn test_patch_serializes_only_touched_fields() {
        let patch = DogPatch {
            sire_id: Some(None),
            ..DogPatch::status(DogStatus::Returned)
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "returned", "sire_id": null})
        );
    }

    #[test]
    fn test_empty_patch() {
        assert!(DogPatch::default().is_empty());
        assert!(!DogPatch::status(DogStatus::Owned).is_empty());
    }

    #[test]
    fn test_dog_deserializes_with_defaults() {
        let json = serde_json::json!({
            "id": "3b0f6a6e-8c1d-4a59-b0d4-6f3e2f0b9a11",
            "name": "Rex",
            "breed": "Beagle",
            "gender": "male",
            "birth_date": "2021-06-01",
            "color": "tricolor",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let dog: Dog = serde_json::from_value(json).unwrap();
        assert_eq!(dog.status, DogStatus::Owned);
        assert!(dog.photos.is_empty());
        assert!(dog.updated_at.is_none());
    }

    #[test]
    fn test_new_dog_validation() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut input = NewDog {
            name: "Milo".to_string(),
            breed: "Poodle".to_string(),
            gender: Gender::Male,
            birth_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            color: "apricot".to_string(),
            weight: None,
            microchip_id: None,
            registration_number: None,
            owner_contact: None,
            status: DogStatus::Owned,
            photos: vec![],
            sire_id: None,
            dam_id: None,
            notes: None,
        };
        assert!(input.validate(today).is_ok());

        input.birth_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(matches!(
            input.validate(today),
            Err(ValidationError::FutureDate { field: "birth_date", .. })
        ));

        input.birth_date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        input.photos = vec!["file:///tmp/milo.png".to_string()];
        assert_eq!(
            input.validate(today),
            Err(ValidationError::NotAUrl { field: "photos" })
        );
    }
}

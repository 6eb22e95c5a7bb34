//! The dog roster: the one entity kept in the application state store.

use chrono::{NaiveDate, Utc};
use kennel_core::{
    Dog, DogId, DogPatch, Gender, LineageError, NewDog, Pedigree, QrCode, Validate,
    ValidationError,
};
use serde::Serialize;
use tracing::instrument;

use super::{ServiceError, flag};
use crate::db::{DataClient, DogRepository, ListQuery, QrCodeRepository};
use crate::store::{AddOutcome, StoreHandle};

/// Result of a roster refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    /// `false` if a later refresh started before this one finished, in which
    /// case the fetched roster was dropped.
    pub applied: bool,
    pub dogs: usize,
}

/// Roster service.
pub struct DogService<'a> {
    dogs: DogRepository<'a>,
    qr_codes: QrCodeRepository<'a>,
    store: &'a StoreHandle,
}

impl<'a> DogService<'a> {
    #[must_use]
    pub const fn new(data: &'a DataClient, store: &'a StoreHandle) -> Self {
        Self {
            dogs: DogRepository::new(data),
            qr_codes: QrCodeRepository::new(data),
            store,
        }
    }

    /// Re-read the whole roster. Only the latest of overlapping refreshes
    /// writes to the store; a cancelled one only ends its loading state.
    ///
    /// # Errors
    ///
    /// Returns the data store error; it is also recorded as `last_error`.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, ServiceError> {
        let pending = self.store.begin_refresh();

        match self.dogs.list(&ListQuery::new()).await {
            Ok(dogs) => {
                let count = dogs.len();
                let applied = pending.finish(Ok(dogs));
                tracing::info!(dogs = count, applied, "Roster refreshed");
                Ok(RefreshOutcome {
                    applied,
                    dogs: count,
                })
            }
            Err(e) => {
                let err = ServiceError::from(e);
                pending.finish(Err(err.to_string()));
                Err(err)
            }
        }
    }

    /// Register a new dog.
    ///
    /// # Errors
    ///
    /// Returns a validation or lineage error before anything is sent, or
    /// the data store error.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &NewDog, today: NaiveDate) -> Result<Dog, ServiceError> {
        input.validate(today)?;
        let roster = self.store.dogs();
        // The new dog has no descendants yet, so any unused id will do.
        Pedigree::new(&roster).check_parents(DogId::generate(), input.sire_id, input.dam_id)?;

        let dog = flag(self.store, self.dogs.create(input).await)?;
        let outcome = self.store.write(|s| s.add_dog(dog.clone()));
        if outcome == AddOutcome::Replaced {
            tracing::warn!(id = %dog.id, "Created dog was already in the roster");
        }
        Ok(dog)
    }

    /// Apply `patch` to a dog. The selected dog follows the update even when
    /// the roster has not been loaded.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or invalid patch or a lineage
    /// error before anything is sent,
    /// [`ServiceError::DogNotFound`] if the dog does not exist, or the data
    /// store error.
    #[instrument(skip(self, patch), fields(%id))]
    pub async fn update(
        &self,
        id: DogId,
        patch: &DogPatch,
        today: NaiveDate,
    ) -> Result<Dog, ServiceError> {
        if patch.is_empty() {
            return Err(ValidationError::Invalid("nothing to update".to_string()).into());
        }
        patch.validate(today)?;

        if patch.sire_id.is_some() || patch.dam_id.is_some() || patch.gender.is_some() {
            let current = self.find(id).await?;
            let roster = self.store.dogs();
            check_patched_lineage(&roster, &patch.merged(&current))?;
        }

        let stamped = DogPatch {
            updated_at: Some(Some(Utc::now())),
            ..patch.clone()
        };
        let dog = flag(self.store, self.dogs.update(id, &stamped).await).map_err(|e| {
            not_found_as_dog(e, id)
        })?;
        self.store.write(|s| {
            if s.dog(id).is_some() {
                s.update_dog(id, &stamped);
            } else {
                s.replace_selected(&dog);
            }
        });
        Ok(dog)
    }

    /// Delete a dog, clearing the selection if it pointed at it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DogNotFound`] or the data store error.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: DogId) -> Result<(), ServiceError> {
        flag(self.store, self.dogs.delete(id).await).map_err(|e| not_found_as_dog(e, id))?;
        self.store.write(|s| {
            if s.dog(id).is_some() {
                s.delete_dog(id);
            } else {
                s.forget_selected(id);
            }
        });
        Ok(())
    }

    /// Select a dog (or clear the selection with `None`). Dogs outside the
    /// roster are fetched from the data store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DogNotFound`] or the data store error.
    #[instrument(skip(self))]
    pub async fn select(&self, id: Option<DogId>) -> Result<Option<Dog>, ServiceError> {
        let dog = match id {
            Some(id) => Some(self.find(id).await?),
            None => None,
        };
        self.store.write(|s| s.set_selected_dog(dog.clone()));
        Ok(dog)
    }

    /// The roster entry for `id`, falling back to the data store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DogNotFound`] or the data store error.
    pub async fn find(&self, id: DogId) -> Result<Dog, ServiceError> {
        if let Some(dog) = self.store.read(|s| s.dog(id).cloned()) {
            return Ok(dog);
        }
        flag(self.store, self.dogs.get(id).await)?.ok_or(ServiceError::DogNotFound(id))
    }

    /// The dog's QR code, if one was generated.
    ///
    /// # Errors
    ///
    /// Returns the data store error.
    pub async fn qr_code(&self, id: DogId) -> Result<Option<QrCode>, ServiceError> {
        flag(self.store, self.qr_codes.get_for_dog(id).await)
    }

    /// Store the URL of a freshly generated QR code for the dog, replacing
    /// any previous one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad URL, or the data store error.
    #[instrument(skip(self, code_url), fields(%id))]
    pub async fn save_qr_code(&self, id: DogId, code_url: &str) -> Result<QrCode, ServiceError> {
        let code = QrCode::new(id, code_url, Utc::now())?;
        flag(self.store, self.qr_codes.upsert(&code).await)
    }
}

fn not_found_as_dog(err: ServiceError, id: DogId) -> ServiceError {
    match err {
        ServiceError::Repository(crate::db::RepositoryError::NotFound) => {
            ServiceError::DogNotFound(id)
        }
        other => other,
    }
}

/// Check `dog` (with a patch already applied) against the roster: its own
/// parents, and its fitness as a parent of the dogs that name it.
fn check_patched_lineage(roster: &[Dog], dog: &Dog) -> Result<(), LineageError> {
    Pedigree::new(roster).check_parents(dog.id, dog.sire_id, dog.dam_id)?;

    for child in roster.iter().filter(|other| other.id != dog.id) {
        if child.sire_id == Some(dog.id) && dog.gender != Gender::Male {
            return Err(LineageError::SireNotMale(dog.id));
        }
        if child.dam_id == Some(dog.id) && dog.gender != Gender::Female {
            return Err(LineageError::DamNotFemale(dog.id));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kennel_core::DogStatus;

    use super::*;

    fn dog(gender: Gender, sire: Option<DogId>) -> Dog {
        Dog {
            id: DogId::generate(),
            name: "Ace".to_string(),
            breed: "Vizsla".to_string(),
            gender,
            birth_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            color: "rust".to_string(),
            weight: None,
            microchip_id: None,
            registration_number: None,
            owner_contact: None,
            status: DogStatus::Owned,
            photos: vec![],
            sire_id: sire,
            dam_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_sire_cannot_change_sex() {
        let sire = dog(Gender::Male, None);
        let pup = dog(Gender::Female, Some(sire.id));
        let roster = vec![sire.clone(), pup];

        let patched = DogPatch {
            gender: Some(Gender::Female),
            ..DogPatch::default()
        }
        .merged(&sire);
        assert_eq!(
            check_patched_lineage(&roster, &patched),
            Err(LineageError::SireNotMale(sire.id))
        );
    }

    #[test]
    fn test_patched_parents_are_checked() {
        let grandsire = dog(Gender::Male, None);
        let sire = dog(Gender::Male, Some(grandsire.id));
        let roster = vec![grandsire.clone(), sire.clone()];

        let patched = DogPatch {
            sire_id: Some(Some(sire.id)),
            ..DogPatch::default()
        }
        .merged(&grandsire);
        assert!(matches!(
            check_patched_lineage(&roster, &patched),
            Err(LineageError::Cycle { .. })
        ));
    }

    #[test]
    fn test_unrelated_patch_passes() {
        let sire = dog(Gender::Male, None);
        let pup = dog(Gender::Male, Some(sire.id));
        let roster = vec![sire, pup.clone()];
        let patched = DogPatch::status(DogStatus::Sold).merged(&pup);
        assert!(check_patched_lineage(&roster, &patched).is_ok());
    }
}

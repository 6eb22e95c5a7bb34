//! Pedigree checks on the sire/dam references between dogs.
//!
//! Parent links form a directed graph over the roster. Writes that would put
//! a dog among its own ancestors, or give it a parent of the wrong sex, are
//! rejected before they reach the hosted store.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::Dog;
use crate::types::{DogId, Gender};

/// Why a proposed pair of parents was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    #[error("dog {0} cannot be its own parent")]
    OwnParent(DogId),

    #[error("dog {0} cannot be both sire and dam")]
    SameSireAndDam(DogId),

    #[error("sire {0} is not male")]
    SireNotMale(DogId),

    #[error("dam {0} is not female")]
    DamNotFemale(DogId),

    #[error("dog {dog} would become an ancestor of itself through {via}")]
    Cycle { dog: DogId, via: DogId },
}

/// Parent links of every dog in a roster, keyed by id.
pub struct Pedigree<'a> {
    dogs: HashMap<DogId, &'a Dog>,
}

impl<'a> Pedigree<'a> {
    #[must_use]
    pub fn new(roster: &'a [Dog]) -> Self {
        Self {
            dogs: roster.iter().map(|dog| (dog.id, dog)).collect(),
        }
    }

    /// Check that giving `dog_id` the parents `sire` and `dam` keeps the graph
    /// acyclic and the sexes right.
    ///
    /// Parents missing from the roster are accepted: they may simply not have
    /// been loaded yet.
    ///
    /// # Errors
    ///
    /// Returns the first [`LineageError`] found.
    pub fn check_parents(
        &self,
        dog_id: DogId,
        sire: Option<DogId>,
        dam: Option<DogId>,
    ) -> Result<(), LineageError> {
        if sire == Some(dog_id) || dam == Some(dog_id) {
            return Err(LineageError::OwnParent(dog_id));
        }
        if let (Some(sire), Some(dam)) = (sire, dam)
            && sire == dam
        {
            return Err(LineageError::SameSireAndDam(sire));
        }
        if let Some(sire) = sire
            && self.gender_of(sire).is_some_and(|g| g != Gender::Male)
        {
            return Err(LineageError::SireNotMale(sire));
        }
        if let Some(dam) = dam
            && self.gender_of(dam).is_some_and(|g| g != Gender::Female)
        {
            return Err(LineageError::DamNotFemale(dam));
        }

        for parent in [sire, dam].into_iter().flatten() {
            if self.is_ancestor_or_self(dog_id, parent) {
                return Err(LineageError::Cycle {
                    dog: dog_id,
                    via: parent,
                });
            }
        }
        Ok(())
    }

    /// Whether `target` is `start` or one of its ancestors.
    ///
    /// Cycles already present in the data are tolerated: each dog is visited
    /// once.
    #[must_use]
    pub fn is_ancestor_or_self(&self, target: DogId, start: DogId) -> bool {
        let mut stack = vec![start];
        let mut seen = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(dog) = self.dogs.get(&current) {
                stack.extend(dog.sire_id);
                stack.extend(dog.dam_id);
            }
        }
        false
    }

    fn gender_of(&self, id: DogId) -> Option<Gender> {
        self.dogs.get(&id).map(|dog| dog.gender)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::types::DogStatus;

    fn dog(gender: Gender, sire: Option<DogId>, dam: Option<DogId>) -> Dog {
        Dog {
            id: DogId::generate(),
            name: "dog".to_string(),
            breed: "Border Collie".to_string(),
            gender,
            birth_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            color: "black".to_string(),
            weight: None,
            microchip_id: None,
            registration_number: None,
            owner_contact: None,
            status: DogStatus::Owned,
            photos: vec![],
            sire_id: sire,
            dam_id: dam,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_accepts_valid_parents() {
        let sire = dog(Gender::Male, None, None);
        let dam = dog(Gender::Female, None, None);
        let pup = dog(Gender::Male, None, None);
        let roster = vec![sire.clone(), dam.clone(), pup.clone()];

        let pedigree = Pedigree::new(&roster);
        assert!(
            pedigree
                .check_parents(pup.id, Some(sire.id), Some(dam.id))
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_own_parent() {
        let pup = dog(Gender::Male, None, None);
        let roster = vec![pup.clone()];
        let result = Pedigree::new(&roster).check_parents(pup.id, Some(pup.id), None);
        assert_eq!(result, Err(LineageError::OwnParent(pup.id)));
    }

    #[test]
    fn test_rejects_wrong_sex() {
        let female = dog(Gender::Female, None, None);
        let male = dog(Gender::Male, None, None);
        let pup = dog(Gender::Female, None, None);
        let roster = vec![female.clone(), male.clone(), pup.clone()];
        let pedigree = Pedigree::new(&roster);

        assert_eq!(
            pedigree.check_parents(pup.id, Some(female.id), None),
            Err(LineageError::SireNotMale(female.id))
        );
        assert_eq!(
            pedigree.check_parents(pup.id, None, Some(male.id)),
            Err(LineageError::DamNotFemale(male.id))
        );
    }

    #[test]
    fn test_rejects_descendant_as_parent() {
        let grandsire = dog(Gender::Male, None, None);
        let sire = dog(Gender::Male, Some(grandsire.id), None);
        let pup = dog(Gender::Male, Some(sire.id), None);
        let roster = vec![grandsire.clone(), sire.clone(), pup.clone()];

        let result = Pedigree::new(&roster).check_parents(grandsire.id, Some(pup.id), None);
        assert_eq!(
            result,
            Err(LineageError::Cycle {
                dog: grandsire.id,
                via: pup.id
            })
        );
    }

    #[test]
    fn test_unknown_parents_are_allowed() {
        let pup = dog(Gender::Female, None, None);
        let roster = vec![pup.clone()];
        assert!(
            Pedigree::new(&roster)
                .check_parents(pup.id, Some(DogId::generate()), Some(DogId::generate()))
                .is_ok()
        );
    }
}

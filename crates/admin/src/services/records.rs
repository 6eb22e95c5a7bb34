//! CRUD for the per-dog tables that are not cached in the store.

use chrono::NaiveDate;
use kennel_core::{DogId, Litter, NewLitter, Pedigree, Validate};
use tracing::instrument;

use super::{ServiceError, flag};
use crate::db::{DataClient, ListQuery, Record, Repository};
use crate::store::StoreHandle;

/// Generic service over one record table.
pub struct RecordService<'a, R> {
    repo: Repository<'a, R>,
    store: &'a StoreHandle,
}

impl<'a, R> RecordService<'a, R>
where
    R: Record,
    R::New: Validate,
{
    #[must_use]
    pub const fn new(data: &'a DataClient, store: &'a StoreHandle) -> Self {
        Self {
            repo: Repository::new(data),
            store,
        }
    }

    /// # Errors
    ///
    /// Returns the data store error; it is also recorded as `last_error`.
    #[instrument(skip(self), fields(table = %R::TABLE))]
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R>, ServiceError> {
        flag(self.store, self.repo.list(query).await)
    }

    /// # Errors
    ///
    /// Returns a validation error before anything is sent, or the data
    /// store error.
    #[instrument(skip(self, input), fields(table = %R::TABLE))]
    pub async fn create(&self, input: &R::New, today: NaiveDate) -> Result<R, ServiceError> {
        input.validate(today)?;
        let record = flag(self.store, self.repo.create(input).await)?;
        tracing::info!(id = %record.id(), "Record created");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns [`crate::db::RepositoryError::NotFound`] or the data store
    /// error.
    #[instrument(skip(self), fields(table = %R::TABLE, %id))]
    pub async fn delete(&self, id: R::Id) -> Result<(), ServiceError> {
        flag(self.store, self.repo.delete(id).await)
    }
}

impl RecordService<'_, Litter> {
    /// Like [`RecordService::create`], but also checks the parents' sexes
    /// against the roster.
    ///
    /// # Errors
    ///
    /// Returns a validation or lineage error before anything is sent, or
    /// the data store error.
    pub async fn create_litter(
        &self,
        input: &NewLitter,
        today: NaiveDate,
    ) -> Result<Litter, ServiceError> {
        input.validate(today)?;
        let roster = self.store.dogs();
        Pedigree::new(&roster).check_parents(
            DogId::generate(),
            Some(input.sire_id),
            Some(input.dam_id),
        )?;
        self.create(input, today).await
    }
}

//! The application state store.
//!
//! One [`AppStore`] is created at startup and shared through a
//! [`StoreHandle`]. It holds the signed-in user, the dog roster, the
//! selected dog and two UI flags (loading, last error). Mutations are
//! synchronous and never touch the network; services call the hosted data
//! store first and then record the outcome here.
//!
//! Only the user and the selected dog are persisted (see [`persist`]).

pub mod persist;

use std::sync::{Arc, PoisonError, RwLock};

use kennel_core::{Dog, DogId, DogPatch, User};
use serde::Serialize;

pub use persist::{
    DurableState, JsonFilePersistence, MemoryPersistence, PersistError, STATE_RECORD_NAME,
    StatePersistence,
};

/// What the store does when `update_dog`/`delete_dog` name a dog it does
/// not hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingDogPolicy {
    /// Leave everything as is.
    #[default]
    Ignore,
    /// Leave the roster as is but set `last_error`.
    Report,
}

impl std::str::FromStr for MissingDogPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "report" => Ok(Self::Report),
            other => Err(format!("expected 'ignore' or 'report', got '{other}'")),
        }
    }
}

/// Result of [`AppStore::add_dog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The dog was appended to the roster.
    Inserted,
    /// A dog with the same id was already present and has been replaced in
    /// place.
    Replaced,
}

/// Identifies one roster refresh. Only the most recently issued ticket may
/// write its result into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RefreshTicket(u64);

/// Read-only copy of the store for handlers and UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub current_user: Option<User>,
    pub dogs: Vec<Dog>,
    pub selected_dog: Option<Dog>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

pub struct AppStore {
    current_user: Option<User>,
    dogs: Vec<Dog>,
    selected_dog: Option<Dog>,
    is_loading: bool,
    last_error: Option<String>,
    missing_dog_policy: MissingDogPolicy,
    latest_refresh: u64,
    persistence: Box<dyn StatePersistence>,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("current_user", &self.current_user.as_ref().map(|u| u.id))
            .field("dogs", &self.dogs.len())
            .field("selected_dog", &self.selected_dog.as_ref().map(|d| d.id))
            .field("is_loading", &self.is_loading)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl AppStore {
    /// Open the store, restoring the user and selected dog from
    /// `persistence`. The roster starts empty, not loading, without error.
    #[must_use]
    pub fn open(persistence: impl StatePersistence + 'static, policy: MissingDogPolicy) -> Self {
        let DurableState { user, selected_dog } = persistence.load();
        Self {
            current_user: user,
            dogs: Vec::new(),
            selected_dog,
            is_loading: false,
            last_error: None,
            missing_dog_policy: policy,
            latest_refresh: 0,
            persistence: Box::new(persistence),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// The roster in insertion order.
    #[must_use]
    pub fn dogs(&self) -> &[Dog] {
        &self.dogs
    }

    #[must_use]
    pub fn dog(&self, id: DogId) -> Option<&Dog> {
        self.dogs.iter().find(|dog| dog.id == id)
    }

    #[must_use]
    pub const fn selected_dog(&self) -> Option<&Dog> {
        self.selected_dog.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            current_user: self.current_user.clone(),
            dogs: self.dogs.clone(),
            selected_dog: self.selected_dog.clone(),
            is_loading: self.is_loading,
            last_error: self.last_error.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    pub fn set_user(&mut self, user: Option<User>) {
        self.current_user = user;
        self.persist();
    }

    /// Replace the whole roster. A selected dog that is in the new roster is
    /// refreshed from it.
    pub fn set_dogs(&mut self, dogs: Vec<Dog>) {
        self.dogs = dogs;
        self.sync_selection_from_roster();
    }

    /// Add a dog, or replace the entry with the same id in place.
    pub fn add_dog(&mut self, dog: Dog) -> AddOutcome {
        let id = dog.id;
        let outcome = match self.dogs.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => {
                *existing = dog;
                AddOutcome::Replaced
            }
            None => {
                self.dogs.push(dog);
                AddOutcome::Inserted
            }
        };
        if outcome == AddOutcome::Replaced && self.is_selected(id) {
            self.sync_selection_from_roster();
        }
        outcome
    }

    /// Merge `patch` into the roster entry for `id`, and into the selected
    /// dog if it is the same one. Returns `false` if `id` is not in the
    /// roster.
    pub fn update_dog(&mut self, id: DogId, patch: &DogPatch) -> bool {
        let Some(dog) = self.dogs.iter_mut().find(|dog| dog.id == id) else {
            self.missing_dog("update", id);
            return false;
        };

        patch.apply_to(dog);
        let merged = dog.clone();
        if self.is_selected(id) {
            self.selected_dog = Some(merged);
            self.persist();
        }
        true
    }

    /// Remove `id` from the roster, clearing the selection if it pointed at
    /// that dog. Returns `false` if `id` is not in the roster.
    pub fn delete_dog(&mut self, id: DogId) -> bool {
        let Some(index) = self.position(id) else {
            self.missing_dog("delete", id);
            return false;
        };

        self.dogs.remove(index);
        if self.is_selected(id) {
            self.selected_dog = None;
            self.persist();
        }
        true
    }

    /// Swap in a fresher copy of the selected dog, whether or not it is in
    /// the roster. Returns `false` if `dog` is not the selected one.
    pub fn replace_selected(&mut self, dog: &Dog) -> bool {
        if !self.is_selected(dog.id) {
            return false;
        }
        if self.selected_dog.as_ref() != Some(dog) {
            self.selected_dog = Some(dog.clone());
            self.persist();
        }
        true
    }

    /// Clear the selection if it points at `id`, whether or not that dog is
    /// in the roster. Returns `false` if another dog (or none) is selected.
    pub fn forget_selected(&mut self, id: DogId) -> bool {
        if !self.is_selected(id) {
            return false;
        }
        self.selected_dog = None;
        self.persist();
        true
    }

    /// Select any dog, in the roster or not.
    pub fn set_selected_dog(&mut self, dog: Option<Dog>) {
        self.selected_dog = dog;
        self.persist();
    }

    pub const fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // -------------------------------------------------------------------------
    // Roster refreshes
    // -------------------------------------------------------------------------

    /// Start a roster refresh: marks the store as loading and issues a
    /// ticket that supersedes every earlier one.
    pub const fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest_refresh += 1;
        self.is_loading = true;
        RefreshTicket(self.latest_refresh)
    }

    /// Record the outcome of a refresh. Results of superseded tickets are
    /// dropped and `false` is returned.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Dog>, String>,
    ) -> bool {
        if ticket.0 != self.latest_refresh {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest_refresh,
                "Dropping stale roster refresh"
            );
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(dogs) => self.set_dogs(dogs),
            Err(message) => self.last_error = Some(message),
        }
        true
    }

    /// Give up on a refresh that will never report back. Loading ends unless
    /// a later refresh is still running.
    pub const fn abandon_refresh(&mut self, ticket: RefreshTicket) {
        if ticket.0 == self.latest_refresh {
            self.is_loading = false;
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn position(&self, id: DogId) -> Option<usize> {
        self.dogs.iter().position(|dog| dog.id == id)
    }

    fn is_selected(&self, id: DogId) -> bool {
        self.selected_dog.as_ref().is_some_and(|dog| dog.id == id)
    }

    fn sync_selection_from_roster(&mut self) {
        let Some(selected_id) = self.selected_dog.as_ref().map(|dog| dog.id) else {
            return;
        };
        let fresher = self
            .dog(selected_id)
            .filter(|current| self.selected_dog.as_ref() != Some(*current))
            .cloned();
        if let Some(fresher) = fresher {
            self.selected_dog = Some(fresher);
            self.persist();
        }
    }

    fn missing_dog(&mut self, action: &str, id: DogId) {
        tracing::debug!(%id, action, "Dog not in roster");
        if self.missing_dog_policy == MissingDogPolicy::Report {
            self.last_error = Some(format!("Cannot {action} dog {id}: not in roster"));
        }
    }

    /// Write the durable subset. Failures are logged; the in-memory state
    /// stays authoritative.
    ///
    /// Runs under the store's write lock, so saves land in mutation order and
    /// readers wait for the disk write. The file is two small records.
    fn persist(&self) {
        let state = DurableState {
            user: self.current_user.clone(),
            selected_dog: self.selected_dog.clone(),
        };
        if let Err(e) = self.persistence.save(&state) {
            tracing::warn!(error = %e, "Failed to persist application state");
        }
    }
}

/// Shared handle to the one [`AppStore`].
///
/// Access goes through closures so the lock is never held across an
/// `.await`.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<RwLock<AppStore>>,
}

impl StoreHandle {
    #[must_use]
    pub fn new(store: AppStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read<T>(&self, f: impl FnOnce(&AppStore) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn write<T>(&self, f: impl FnOnce(&mut AppStore) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.read(AppStore::snapshot)
    }

    /// Copy of the roster.
    #[must_use]
    pub fn dogs(&self) -> Vec<Dog> {
        self.read(|store| store.dogs().to_vec())
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.write(|store| store.set_error(Some(message)));
    }

    /// Start a roster refresh. See [`PendingRefresh`].
    pub fn begin_refresh(&self) -> PendingRefresh<'_> {
        let ticket = self.write(AppStore::begin_refresh);
        PendingRefresh {
            store: self,
            ticket: Some(ticket),
        }
    }

    /// Mark the store as loading until the returned guard is dropped.
    pub fn loading(&self) -> Loading<'_> {
        self.write(|store| store.set_loading(true));
        Loading { store: self }
    }
}

/// A roster refresh in flight.
///
/// If the future awaiting the data store is dropped (the client went away),
/// the guard abandons its ticket so the store does not stay loading.
#[must_use]
pub struct PendingRefresh<'a> {
    store: &'a StoreHandle,
    ticket: Option<RefreshTicket>,
}

impl PendingRefresh<'_> {
    /// Record the outcome. Returns `false` if a later refresh superseded
    /// this one.
    pub fn finish(mut self, result: Result<Vec<Dog>, String>) -> bool {
        self.ticket
            .take()
            .is_some_and(|ticket| self.store.write(|s| s.finish_refresh(ticket, result)))
    }
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            tracing::debug!(ticket = ticket.0, "Roster refresh cancelled");
            self.store.write(|s| s.abandon_refresh(ticket));
        }
    }
}

/// Clears the loading flag on drop.
#[must_use]
pub struct Loading<'a> {
    store: &'a StoreHandle,
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.store.write(|s| s.set_loading(false));
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.read(|store| store.fmt(f))
    }
}

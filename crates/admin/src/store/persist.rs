//! Durable storage for the part of the application state that survives a
//! restart: the signed-in user and the selected dog.
//!
//! Everything else in the store (roster, loading flag, last error) is
//! rebuilt from the hosted data store on every run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use kennel_core::{Dog, User};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the single record the durable state is saved under.
pub const STATE_RECORD_NAME: &str = "kennel-desk-state";

/// The persisted subset of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurableState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub selected_dog: Option<Dog>,
}

/// On-disk envelope around [`DurableState`].
#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    name: String,
    state: DurableState,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the durable state lives.
///
/// `load` never fails: anything unreadable counts as "nothing saved".
pub trait StatePersistence: Send + Sync {
    fn load(&self) -> DurableState;

    /// # Errors
    ///
    /// Returns [`PersistError`] if the state could not be written.
    fn save(&self, state: &DurableState) -> Result<(), PersistError>;
}

/// Saves the durable state as a JSON file, replacing it atomically.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StatePersistence for JsonFilePersistence {
    fn load(&self) -> DurableState {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return DurableState::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read saved state");
                return DurableState::default();
            }
        };

        match serde_json::from_str::<StateRecord>(&raw) {
            Ok(record) if record.name == STATE_RECORD_NAME => record.state,
            Ok(record) => {
                tracing::warn!(
                    path = %self.path.display(),
                    name = %record.name,
                    "Saved state belongs to another record, ignoring"
                );
                DurableState::default()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Saved state is corrupt, starting fresh");
                DurableState::default()
            }
        }
    }

    fn save(&self, state: &DurableState) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let record = StateRecord {
            name: STATE_RECORD_NAME.to_string(),
            state: state.clone(),
        };
        let json = serde_json::to_vec_pretty(&record)?;

        let tmp = self
            .path
            .with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            self.io_error(e)
        })
    }
}

/// Keeps the durable state in memory. Clones share the same slot, so a test
/// can "restart" by opening a second store over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    slot: Arc<Mutex<Option<DurableState>>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What was last saved, if anything.
    #[must_use]
    pub fn saved(&self) -> Option<DurableState> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatePersistence for MemoryPersistence {
    fn load(&self) -> DurableState {
        self.saved().unwrap_or_default()
    }

    fn save(&self, state: &DurableState) -> Result<(), PersistError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::analysis::{AnalysisClient, AnalysisError};
use crate::config::AdminConfig;
use crate::db::{DataClient, RepositoryError};
use crate::store::{AppStore, JsonFilePersistence, StoreHandle};

/// Error building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("data store client: {0}")]
    DataClient(#[from] RepositoryError),
    #[error("analysis client: {0}")]
    AnalysisClient(#[from] AnalysisError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and gives access to the
/// store and the two collaborator clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: StoreHandle,
    data: DataClient,
    analysis: Option<AnalysisClient>,
}

impl AppState {
    /// Build the state from configuration, opening the store over the
    /// configured state file.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn from_config(config: AdminConfig) -> Result<Self, StateError> {
        let store = AppStore::open(
            JsonFilePersistence::new(&config.state_file),
            config.missing_dog_policy,
        );
        let data = DataClient::new(&config.data_store)?;
        let analysis = config.analysis().map(AnalysisClient::new).transpose()?;
        Ok(Self::new(config, StoreHandle::new(store), data, analysis))
    }

    /// Assemble the state from already-built parts.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        store: StoreHandle,
        data: DataClient,
        analysis: Option<AnalysisClient>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                data,
                analysis,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a handle to the application state store.
    #[must_use]
    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    /// Get a reference to the hosted data store client.
    #[must_use]
    pub fn data(&self) -> &DataClient {
        &self.inner.data
    }

    /// Get the analysis client, if analysis is configured.
    #[must_use]
    pub fn analysis(&self) -> Option<&AnalysisClient> {
        self.inner.analysis.as_ref()
    }
}

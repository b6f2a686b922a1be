//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{AdminConfig, StorageBackend};
use crate::storage::azure::AzureStorage;
use crate::storage::memory::MemoryStorage;
use crate::storage::{RetailStorage, StorageError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Handlers only see the storage
/// through [`RetailStorage`], so the Azure and in-memory backends are
/// interchangeable.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    storage: Arc<dyn RetailStorage>,
}

impl AppState {
    /// Create the application state, building the configured storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage clients cannot be built (invalid
    /// account key, TLS backend failure).
    pub fn new(config: AdminConfig) -> Result<Self, StorageError> {
        let storage: Arc<dyn RetailStorage> = match &config.storage {
            StorageBackend::Azure(account) => Arc::new(AzureStorage::new(account)?),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Ok(Self::with_storage(config, storage))
    }

    /// Create the application state around an existing storage implementation.
    #[must_use]
    pub fn with_storage(config: AdminConfig, storage: Arc<dyn RetailStorage>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, storage }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get the storage implementation.
    #[must_use]
    pub fn storage(&self) -> &dyn RetailStorage {
        self.inner.storage.as_ref()
    }
}

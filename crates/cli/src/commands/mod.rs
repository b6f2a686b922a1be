//! CLI command implementations.

pub mod proofs;
pub mod provision;
pub mod queue;

use std::sync::Arc;

use abc_retailers_admin::config::{AdminConfig, ConfigError, StorageBackend};
use abc_retailers_admin::storage::azure::AzureStorage;
use abc_retailers_admin::storage::memory::MemoryStorage;
use abc_retailers_admin::storage::{RetailStorage, StorageError};
use thiserror::Error;

/// Errors that can occur before a command runs.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage clients could not be built.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Build the configured storage backend.
///
/// # Errors
///
/// Returns an error if the environment is incomplete or the account key is
/// unusable.
pub fn connect() -> Result<Arc<dyn RetailStorage>, ConnectError> {
    let config = AdminConfig::from_env()?;
    let storage: Arc<dyn RetailStorage> = match &config.storage {
        StorageBackend::Azure(account) => {
            tracing::info!(account = %account.name, "Using Azure storage account");
            Arc::new(AzureStorage::new(account)?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory backend; nothing is persisted");
            Arc::new(MemoryStorage::new())
        }
    };
    Ok(storage)
}

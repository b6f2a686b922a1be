//! Payment proof listing.

use abc_retailers_admin::storage::{RetailStorage, StorageError};

/// Print the name of every stored payment proof.
///
/// # Errors
///
/// Returns an error if the share cannot be listed.
#[allow(clippy::print_stdout)]
pub async fn list(storage: &dyn RetailStorage) -> Result<(), StorageError> {
    let names = storage.list_payment_proofs().await?;
    tracing::info!(count = names.len(), "Listed payment proofs");

    for name in names {
        println!("{name}");
    }
    Ok(())
}

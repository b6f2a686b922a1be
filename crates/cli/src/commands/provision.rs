//! Storage provisioning.

use abc_retailers_admin::storage::{
    CUSTOMERS_TABLE, ORDER_QUEUE, ORDERS_TABLE, PAYMENT_PROOFS_SHARE, PRODUCT_IMAGES_CONTAINER,
    PRODUCTS_TABLE, RetailStorage, StorageError,
};

/// Create every storage resource the back office uses. Existing resources
/// are left alone.
///
/// # Errors
///
/// Returns the first storage error.
pub async fn run(storage: &dyn RetailStorage) -> Result<(), StorageError> {
    tracing::info!(
        tables = ?[CUSTOMERS_TABLE, PRODUCTS_TABLE, ORDERS_TABLE],
        container = PRODUCT_IMAGES_CONTAINER,
        queue = ORDER_QUEUE,
        share = PAYMENT_PROOFS_SHARE,
        "Provisioning storage resources..."
    );
    storage.initialize().await?;
    storage.ping().await?;
    tracing::info!("Storage resources ready");
    Ok(())
}

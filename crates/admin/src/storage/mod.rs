//! Storage access for the back office.
//!
//! Handlers only see [`RetailStorage`]. Two implementations exist:
//!
//! - [`azure::AzureStorage`] talks to the Table, Blob, Queue and File REST
//!   APIs of one storage account, authenticated with the account key.
//! - [`memory::MemoryStorage`] keeps everything in process with the same
//!   observable behaviour. Used for local development and tests.
//!
//! # Resources
//!
//! ```text
//! table      customers        partition "Customer"
//! table      products         partition "Product"
//! table      orders           partition "Order"
//! container  productimages    product images
//! queue      orderprocessing  order messages (JSON)
//! share      paymentproofs    payment proofs (root directory)
//! ```

pub mod azure;
pub mod error;
pub mod memory;
pub mod message;
pub mod naming;

use async_trait::async_trait;

use abc_retailers_core::{
    Customer, CustomerId, FileUpload, Order, OrderId, Product, ProductId, StoredFile,
};

pub use error::StorageError;
pub use message::OrderMessage;

pub const CUSTOMERS_TABLE: &str = "customers";
pub const PRODUCTS_TABLE: &str = "products";
pub const ORDERS_TABLE: &str = "orders";
pub const PRODUCT_IMAGES_CONTAINER: &str = "productimages";
pub const ORDER_QUEUE: &str = "orderprocessing";
pub const PAYMENT_PROOFS_SHARE: &str = "paymentproofs";

pub const CUSTOMER_PARTITION: &str = "Customer";
pub const PRODUCT_PARTITION: &str = "Product";
pub const ORDER_PARTITION: &str = "Order";

/// Largest batch the queue service hands out per receive call.
pub const MAX_RECEIVE_COUNT: u8 = 32;

/// Storage operations used by the back office.
///
/// Every method is a single call against the storage service. Writes that
/// replace a record are guarded by the record's `etag`; a record without one
/// overwrites unconditionally.
#[async_trait]
pub trait RetailStorage: Send + Sync {
    /// Create the tables, container, queue and share if they are missing.
    async fn initialize(&self) -> Result<(), StorageError>;

    /// Cheap reachability check used by the readiness probe.
    async fn ping(&self) -> Result<(), StorageError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, StorageError>;
    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>, StorageError>;
    /// Insert a customer. Fails with [`StorageError::AlreadyExists`] on a
    /// duplicate ID.
    async fn create_customer(&self, customer: &Customer) -> Result<Customer, StorageError>;
    /// Replace a customer. Fails with [`StorageError::PreconditionFailed`]
    /// when the etag is stale.
    async fn update_customer(&self, customer: &Customer) -> Result<Customer, StorageError>;
    async fn delete_customer(&self, id: &CustomerId) -> Result<(), StorageError>;

    async fn list_products(&self) -> Result<Vec<Product>, StorageError>;
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StorageError>;
    async fn create_product(&self, product: &Product) -> Result<Product, StorageError>;
    async fn update_product(&self, product: &Product) -> Result<Product, StorageError>;
    async fn delete_product(&self, id: &ProductId) -> Result<(), StorageError>;

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError>;
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError>;
    /// Insert an order, then put its message on the processing queue.
    async fn create_order(&self, order: &Order) -> Result<Order, StorageError>;
    async fn update_order(&self, order: &Order) -> Result<Order, StorageError>;
    async fn delete_order(&self, id: &OrderId) -> Result<(), StorageError>;

    /// Store a product image and return its URL.
    async fn upload_product_image(
        &self,
        file: &FileUpload,
        product_id: &ProductId,
    ) -> Result<String, StorageError>;
    async fn get_product_image(&self, name: &str) -> Result<Option<StoredFile>, StorageError>;
    /// Delete an image. Deleting a missing image succeeds.
    async fn delete_product_image(&self, name: &str) -> Result<(), StorageError>;

    /// Store a payment proof in the share root and return its generated name.
    async fn upload_payment_proof(
        &self,
        file: &FileUpload,
        order_id: Option<&str>,
        customer_name: Option<&str>,
    ) -> Result<String, StorageError>;
    /// Names of the files in the share root.
    async fn list_payment_proofs(&self) -> Result<Vec<String>, StorageError>;
    async fn download_payment_proof(&self, name: &str)
    -> Result<Option<StoredFile>, StorageError>;
    /// Delete a payment proof. Deleting a missing file succeeds.
    async fn delete_payment_proof(&self, name: &str) -> Result<(), StorageError>;

    async fn send_order_message(&self, order: &Order) -> Result<(), StorageError>;
    /// Receive up to `count` order messages, clamped to 1..=32.
    ///
    /// Messages whose text is not a valid order payload are skipped.
    async fn receive_order_messages(&self, count: u8) -> Result<Vec<OrderMessage>, StorageError>;
}

/// Clamp a requested receive batch to what the queue service accepts.
#[must_use]
pub fn clamp_receive_count(count: u8) -> u8 {
    count.clamp(1, MAX_RECEIVE_COUNT)
}

/// Parse received message texts, skipping any that are not order payloads.
pub(crate) fn parse_order_messages<I, S>(texts: I) -> Vec<OrderMessage>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .filter_map(|text| match serde_json::from_str(text.as_ref()) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed order message");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_count_is_clamped() {
        assert_eq!(clamp_receive_count(0), 1);
        assert_eq!(clamp_receive_count(10), 10);
        assert_eq!(clamp_receive_count(200), 32);
    }

    #[test]
    fn malformed_messages_are_skipped() {
        let good = r#"{"OrderId":"o1","CustomerId":"C1","Username":"u","ProductId":"7",
            "ProductName":"Tea","OrderDate":"2025-01-02T03:04:05Z","Quantity":2,
            "UnitPrice":10.5,"TotalPrice":21.0,"Status":"Pending"}"#;
        let parsed = parse_order_messages(["not json", good, "{}"]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].order_id, "o1");
    }
}

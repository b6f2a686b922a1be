//! Storage wrapper that fails chosen operations on demand.
//!
//! Every call goes to the wrapped [`MemoryStorage`] unless its operation name
//! has been switched off with [`FaultyStorage::fail`], in which case it
//! returns [`StorageError::Request`] without touching the data.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use abc_retailers_admin::storage::memory::MemoryStorage;
use abc_retailers_admin::storage::{OrderMessage, RetailStorage, StorageError};
use abc_retailers_core::{
    Customer, CustomerId, FileUpload, Order, OrderId, Product, ProductId, StoredFile,
};

pub struct FaultyStorage {
    inner: Arc<MemoryStorage>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FaultyStorage {
    #[must_use]
    pub fn new(inner: Arc<MemoryStorage>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every later call of `operation` (a `RetailStorage` method name) fail.
    pub fn fail(&self, operation: &'static str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation);
    }

    /// Let `operation` reach the storage again.
    pub fn restore(&self, operation: &'static str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(operation);
    }

    fn check(&self, operation: &'static str) -> Result<(), StorageError> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(operation) {
            return Err(StorageError::Request(format!("{operation} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl RetailStorage for FaultyStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        self.check("initialize")?;
        self.inner.initialize().await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check("ping")?;
        self.inner.ping().await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StorageError> {
        self.check("list_customers")?;
        self.inner.list_customers().await
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>, StorageError> {
        self.check("get_customer")?;
        self.inner.get_customer(id).await
    }

    async fn create_customer(&self, customer: &Customer) -> Result<Customer, StorageError> {
        self.check("create_customer")?;
        self.inner.create_customer(customer).await
    }

    async fn update_customer(&self, customer: &Customer) -> Result<Customer, StorageError> {
        self.check("update_customer")?;
        self.inner.update_customer(customer).await
    }

    async fn delete_customer(&self, id: &CustomerId) -> Result<(), StorageError> {
        self.check("delete_customer")?;
        self.inner.delete_customer(id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        self.check("list_products")?;
        self.inner.list_products().await
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StorageError> {
        self.check("get_product")?;
        self.inner.get_product(id).await
    }

    async fn create_product(&self, product: &Product) -> Result<Product, StorageError> {
        self.check("create_product")?;
        self.inner.create_product(product).await
    }

    async fn update_product(&self, product: &Product) -> Result<Product, StorageError> {
        self.check("update_product")?;
        self.inner.update_product(product).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StorageError> {
        self.check("delete_product")?;
        self.inner.delete_product(id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        self.check("list_orders")?;
        self.inner.list_orders().await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
        self.check("get_order")?;
        self.inner.get_order(id).await
    }

    async fn create_order(&self, order: &Order) -> Result<Order, StorageError> {
        self.check("create_order")?;
        self.inner.create_order(order).await
    }

    async fn update_order(&self, order: &Order) -> Result<Order, StorageError> {
        self.check("update_order")?;
        self.inner.update_order(order).await
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), StorageError> {
        self.check("delete_order")?;
        self.inner.delete_order(id).await
    }

    async fn upload_product_image(
        &self,
        file: &FileUpload,
        product_id: &ProductId,
    ) -> Result<String, StorageError> {
        self.check("upload_product_image")?;
        self.inner.upload_product_image(file, product_id).await
    }

    async fn get_product_image(&self, name: &str) -> Result<Option<StoredFile>, StorageError> {
        self.check("get_product_image")?;
        self.inner.get_product_image(name).await
    }

    async fn delete_product_image(&self, name: &str) -> Result<(), StorageError> {
        self.check("delete_product_image")?;
        self.inner.delete_product_image(name).await
    }

    async fn upload_payment_proof(
        &self,
        file: &FileUpload,
        order_id: Option<&str>,
        customer_name: Option<&str>,
    ) -> Result<String, StorageError> {
        self.check("upload_payment_proof")?;
        self.inner
            .upload_payment_proof(file, order_id, customer_name)
            .await
    }

    async fn list_payment_proofs(&self) -> Result<Vec<String>, StorageError> {
        self.check("list_payment_proofs")?;
        self.inner.list_payment_proofs().await
    }

    async fn download_payment_proof(
        &self,
        name: &str,
    ) -> Result<Option<StoredFile>, StorageError> {
        self.check("download_payment_proof")?;
        self.inner.download_payment_proof(name).await
    }

    async fn delete_payment_proof(&self, name: &str) -> Result<(), StorageError> {
        self.check("delete_payment_proof")?;
        self.inner.delete_payment_proof(name).await
    }

    async fn send_order_message(&self, order: &Order) -> Result<(), StorageError> {
        self.check("send_order_message")?;
        self.inner.send_order_message(order).await
    }

    async fn receive_order_messages(&self, count: u8) -> Result<Vec<OrderMessage>, StorageError> {
        self.check("receive_order_messages")?;
        self.inner.receive_order_messages(count).await
    }
}

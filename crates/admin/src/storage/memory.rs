//! In-process storage with the same observable behaviour as the Azure
//! backend: unique row keys, etag checks on replace, not-found on delete,
//! FIFO queue.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use abc_retailers_core::{
    Customer, CustomerId, FileUpload, Order, OrderId, Product, ProductId, StoredFile,
};

use super::naming::{self, content_type_for};
use super::{
    OrderMessage, PRODUCT_IMAGES_CONTAINER, RetailStorage, StorageError, clamp_receive_count,
    parse_order_messages,
};

/// Record kinds kept in a table.
trait Record: Clone {
    const KIND: &'static str;
    fn key(&self) -> &str;
    fn etag(&self) -> Option<&str>;
    fn stamp(&mut self, etag: String, at: DateTime<Utc>);
}

macro_rules! impl_record {
    ($ty:ty, $kind:literal) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;

            fn key(&self) -> &str {
                self.id.as_str()
            }

            fn etag(&self) -> Option<&str> {
                self.etag.as_deref()
            }

            fn stamp(&mut self, etag: String, at: DateTime<Utc>) {
                self.etag = Some(etag);
                self.timestamp = Some(at);
            }
        }
    };
}

impl_record!(Customer, "Customer");
impl_record!(Product, "Product");
impl_record!(Order, "Order");

/// One table: row key to record, ordered like the table service lists them.
struct Table<T> {
    rows: RwLock<BTreeMap<String, T>>,
}

impl<T: Record> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    async fn list(&self) -> Vec<T> {
        self.rows.read().await.values().cloned().collect()
    }

    async fn get(&self, key: &str) -> Option<T> {
        self.rows.read().await.get(key).cloned()
    }

    async fn insert(&self, record: &T, etag: String) -> Result<T, StorageError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(record.key()) {
            return Err(StorageError::AlreadyExists(format!(
                "{} {}",
                T::KIND,
                record.key()
            )));
        }
        let mut stored = record.clone();
        stored.stamp(etag, Utc::now());
        rows.insert(stored.key().to_owned(), stored.clone());
        Ok(stored)
    }

    async fn replace(&self, record: &T, etag: String) -> Result<T, StorageError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get(record.key())
            .ok_or_else(|| StorageError::NotFound(format!("{} {}", T::KIND, record.key())))?;
        match record.etag() {
            Some("*") | None => {}
            Some(tag) if Some(tag) == current.etag() => {}
            Some(_) => {
                return Err(StorageError::PreconditionFailed(format!(
                    "{} {}",
                    T::KIND,
                    record.key()
                )));
            }
        }
        let mut stored = record.clone();
        stored.stamp(etag, Utc::now());
        rows.insert(stored.key().to_owned(), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.rows
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("{} {key}", T::KIND)))
    }
}

/// Storage kept entirely in memory. Contents are lost on restart.
pub struct MemoryStorage {
    customers: Table<Customer>,
    products: Table<Product>,
    orders: Table<Order>,
    images: RwLock<BTreeMap<String, StoredFile>>,
    proofs: RwLock<BTreeMap<String, Bytes>>,
    queue: Mutex<VecDeque<String>>,
    version: AtomicU64,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage").finish_non_exhaustive()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            customers: Table::new(),
            products: Table::new(),
            orders: Table::new(),
            images: RwLock::new(BTreeMap::new()),
            proofs: RwLock::new(BTreeMap::new()),
            queue: Mutex::new(VecDeque::new()),
            version: AtomicU64::new(0),
        }
    }

    /// Put raw text on the order queue, bypassing serialization.
    pub async fn enqueue_raw(&self, text: impl Into<String>) {
        self.queue.lock().await.push_back(text.into());
    }

    /// Number of messages waiting on the order queue.
    pub async fn queued_messages(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Names of the stored product images.
    pub async fn image_names(&self) -> Vec<String> {
        self.images.read().await.keys().cloned().collect()
    }

    fn next_etag(&self) -> String {
        let n = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        format!("W/\"{n}\"")
    }
}

#[async_trait]
impl RetailStorage for MemoryStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StorageError> {
        Ok(self.customers.list().await)
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>, StorageError> {
        Ok(self.customers.get(id.as_str()).await)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn create_customer(&self, customer: &Customer) -> Result<Customer, StorageError> {
        self.customers.insert(customer, self.next_etag()).await
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn update_customer(&self, customer: &Customer) -> Result<Customer, StorageError> {
        self.customers.replace(customer, self.next_etag()).await
    }

    async fn delete_customer(&self, id: &CustomerId) -> Result<(), StorageError> {
        self.customers.delete(id.as_str()).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        Ok(self.products.list().await)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StorageError> {
        Ok(self.products.get(id.as_str()).await)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create_product(&self, product: &Product) -> Result<Product, StorageError> {
        self.products.insert(product, self.next_etag()).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update_product(&self, product: &Product) -> Result<Product, StorageError> {
        self.products.replace(product, self.next_etag()).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StorageError> {
        self.products.delete(id.as_str()).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self.orders.list().await)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
        Ok(self.orders.get(id.as_str()).await)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_order(&self, order: &Order) -> Result<Order, StorageError> {
        let stored = self.orders.insert(order, self.next_etag()).await?;
        self.send_order_message(&stored).await?;
        Ok(stored)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn update_order(&self, order: &Order) -> Result<Order, StorageError> {
        self.orders.replace(order, self.next_etag()).await
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), StorageError> {
        self.orders.delete(id.as_str()).await
    }

    #[instrument(skip(self, file), fields(product_id = %product_id, size = file.len()))]
    async fn upload_product_image(
        &self,
        file: &FileUpload,
        product_id: &ProductId,
    ) -> Result<String, StorageError> {
        let name = naming::product_image_name(product_id, &file.file_name, Utc::now());
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| content_type_for(&name).to_owned());
        self.images.write().await.insert(
            name.clone(),
            StoredFile {
                content_type,
                bytes: file.bytes.clone(),
            },
        );
        Ok(format!(
            "memory://{PRODUCT_IMAGES_CONTAINER}/{}",
            urlencoding::encode(&name)
        ))
    }

    async fn get_product_image(&self, name: &str) -> Result<Option<StoredFile>, StorageError> {
        Ok(self.images.read().await.get(name).cloned())
    }

    async fn delete_product_image(&self, name: &str) -> Result<(), StorageError> {
        self.images.write().await.remove(name);
        Ok(())
    }

    #[instrument(skip(self, file), fields(size = file.len()))]
    async fn upload_payment_proof(
        &self,
        file: &FileUpload,
        order_id: Option<&str>,
        customer_name: Option<&str>,
    ) -> Result<String, StorageError> {
        let name =
            naming::payment_proof_name(order_id, customer_name, &file.file_name, Utc::now());
        self.proofs
            .write()
            .await
            .insert(name.clone(), file.bytes.clone());
        Ok(name)
    }

    async fn list_payment_proofs(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.proofs.read().await.keys().cloned().collect())
    }

    async fn download_payment_proof(
        &self,
        name: &str,
    ) -> Result<Option<StoredFile>, StorageError> {
        Ok(self.proofs.read().await.get(name).map(|bytes| StoredFile {
            content_type: content_type_for(name).to_owned(),
            bytes: bytes.clone(),
        }))
    }

    async fn delete_payment_proof(&self, name: &str) -> Result<(), StorageError> {
        self.proofs.write().await.remove(name);
        Ok(())
    }

    async fn send_order_message(&self, order: &Order) -> Result<(), StorageError> {
        let text = OrderMessage::try_from(order)?.to_json()?;
        self.queue.lock().await.push_back(text);
        Ok(())
    }

    async fn receive_order_messages(&self, count: u8) -> Result<Vec<OrderMessage>, StorageError> {
        let count = usize::from(clamp_receive_count(count));
        let texts: Vec<String> = {
            let mut queue = self.queue.lock().await;
            let take = count.min(queue.len());
            queue.drain(..take).collect()
        };
        Ok(parse_order_messages(texts))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use abc_retailers_core::{Email, OrderStatus, Price};

    fn customer(id: &str) -> Customer {
        Customer {
            id: CustomerId::parse(id).unwrap(),
            name: "Ayanda".to_string(),
            surname: "Nkosi".to_string(),
            username: "ayanda".to_string(),
            email: Email::parse("ayanda@example.com").unwrap(),
            shipping_address: "4 Beach Rd".to_string(),
            etag: None,
            timestamp: None,
        }
    }

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            name: "Kettle".to_string(),
            description: "2L".to_string(),
            price: Price::parse("399.99").unwrap(),
            stock_available: 3,
            image_url: None,
            etag: None,
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_etag_and_rejects_duplicates() {
        let storage = MemoryStorage::new();
        let stored = storage.create_customer(&customer("C1")).await.unwrap();
        assert!(stored.etag.is_some());
        assert!(stored.timestamp.is_some());

        let err = storage.create_customer(&customer("C1")).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn stale_etag_is_rejected() {
        let storage = MemoryStorage::new();
        let first = storage.create_customer(&customer("C1")).await.unwrap();

        let mut edit = first.clone();
        edit.name = "Updated".to_string();
        let second = storage.update_customer(&edit).await.unwrap();
        assert_ne!(first.etag, second.etag);

        let mut stale = first;
        stale.name = "Stale".to_string();
        let err = storage.update_customer(&stale).await.unwrap_err();
        assert!(matches!(err, StorageError::PreconditionFailed(_)));

        let current = storage
            .get_customer(&CustomerId::parse("C1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.name, "Updated");
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_record_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.update_product(&product("9")).await.unwrap_err();
        assert!(err.is_not_found());
        let err = storage
            .delete_product(&ProductId::parse("9").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_order_enqueues_message() {
        let storage = MemoryStorage::new();
        let order = Order::place(
            &customer("C1"),
            &product("1"),
            2,
            Utc::now(),
            OrderStatus::default(),
        )
        .unwrap();
        storage.create_order(&order).await.unwrap();
        assert_eq!(storage.queued_messages().await, 1);

        let messages = storage.receive_order_messages(10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].order_id, order.id.as_str());
        assert_eq!(storage.queued_messages().await, 0);
    }

    #[tokio::test]
    async fn receive_skips_malformed_messages_in_fifo_order() {
        let storage = MemoryStorage::new();
        storage.enqueue_raw("garbage").await;
        let order = Order::place(
            &customer("C1"),
            &product("1"),
            1,
            Utc::now(),
            OrderStatus::default(),
        )
        .unwrap();
        storage.send_order_message(&order).await.unwrap();

        let messages = storage.receive_order_messages(5).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].quantity, 1);
    }

    #[tokio::test]
    async fn image_url_resolves_back_to_blob() {
        let storage = MemoryStorage::new();
        let upload = FileUpload::new("kettle.png", None, Bytes::from_static(b"png"));
        let url = storage
            .upload_product_image(&upload, &ProductId::parse("1").unwrap())
            .await
            .unwrap();
        let name = naming::image_name_from_url(&url).unwrap();
        let image = storage.get_product_image(&name).await.unwrap().unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, Bytes::from_static(b"png"));

        storage.delete_product_image(&name).await.unwrap();
        storage.delete_product_image(&name).await.unwrap();
        assert!(storage.get_product_image(&name).await.unwrap().is_none());
    }
}

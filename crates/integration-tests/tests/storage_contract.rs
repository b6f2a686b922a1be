//! Behaviour shared by every storage backend.
//!
//! The same checks run against the in-memory backend on every test run and
//! against a real storage account when one is configured:
//!
//! ```bash
//! AZURE_STORAGE_CONNECTION_STRING=... cargo test -p abc-retailers-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use bytes::Bytes;
use chrono::Utc;
use secrecy::SecretString;

use abc_retailers_admin::config::parse_storage_account;
use abc_retailers_admin::storage::azure::AzureStorage;
use abc_retailers_admin::storage::memory::MemoryStorage;
use abc_retailers_admin::storage::naming::image_name_from_url;
use abc_retailers_admin::storage::{RetailStorage, StorageError};
use abc_retailers_core::{CustomerId, FileUpload, Order, OrderStatus, ProductId};
use abc_retailers_integration_tests::{customer, product};

/// Unique suffix so runs against a shared account do not collide.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

fn unique_product_id() -> String {
    (Utc::now().timestamp_micros().unsigned_abs() % 1_000_000_000).to_string()
}

async fn customers_round_trip(storage: &dyn RetailStorage) {
    let id = unique("C");
    let created = storage.create_customer(&customer(&id)).await.unwrap();
    assert!(created.etag.is_some());

    let duplicate = storage.create_customer(&customer(&id)).await.unwrap_err();
    assert!(matches!(duplicate, StorageError::AlreadyExists(_)));

    let key = CustomerId::parse(&id).unwrap();
    let mut fetched = storage.get_customer(&key).await.unwrap().unwrap();
    assert_eq!(fetched.username, "thandim");
    assert!(storage.list_customers().await.unwrap().iter().any(|c| c.id == key));

    let stale = fetched.clone();
    fetched.shipping_address = "1 Main Road, Durban".to_string();
    let updated = storage.update_customer(&fetched).await.unwrap();
    assert_ne!(updated.etag, stale.etag);

    let conflict = storage.update_customer(&stale).await.unwrap_err();
    assert!(matches!(conflict, StorageError::PreconditionFailed(_)));

    storage.delete_customer(&key).await.unwrap();
    assert!(storage.get_customer(&key).await.unwrap().is_none());
    assert!(storage.delete_customer(&key).await.unwrap_err().is_not_found());
}

async fn orders_are_queued(storage: &dyn RetailStorage) {
    let order = Order::place(
        &customer(&unique("C")),
        &product(&unique_product_id()),
        2,
        Utc::now(),
        OrderStatus::default(),
    )
    .unwrap();
    let created = storage.create_order(&order).await.unwrap();
    assert_eq!(created.total_price.to_string(), "91.00");

    let messages = storage.receive_order_messages(32).await.unwrap();
    assert!(messages.iter().any(|m| m.order_id == order.id.as_str()));

    let mut stored = storage.get_order(&order.id).await.unwrap().unwrap();
    stored.status = OrderStatus::parse("Shipped").unwrap();
    let updated = storage.update_order(&stored).await.unwrap();
    assert_eq!(updated.status.as_str(), "Shipped");
    assert_eq!(updated.unit_price, order.unit_price);

    storage.delete_order(&order.id).await.unwrap();
}

async fn product_images(storage: &dyn RetailStorage) {
    let id = ProductId::parse(&unique_product_id()).unwrap();
    let upload = FileUpload::new(
        "tea.png",
        Some("image/png".to_string()),
        Bytes::from_static(b"\x89PNG test"),
    );
    let url = storage.upload_product_image(&upload, &id).await.unwrap();
    let name = image_name_from_url(&url).unwrap();
    assert!(name.starts_with(id.as_str()));
    assert!(name.ends_with(".png"));

    let image = storage.get_product_image(&name).await.unwrap().unwrap();
    assert_eq!(image.content_type, "image/png");
    assert_eq!(image.bytes, upload.bytes);

    storage.delete_product_image(&name).await.unwrap();
    storage.delete_product_image(&name).await.unwrap();
    assert!(storage.get_product_image(&name).await.unwrap().is_none());
}

async fn payment_proofs(storage: &dyn RetailStorage) {
    let order_ref = unique("ORD");
    let upload = FileUpload::new(
        "proof.pdf",
        Some("application/pdf".to_string()),
        Bytes::from_static(b"%PDF-1.4 test"),
    );
    let name = storage
        .upload_payment_proof(&upload, Some(&order_ref), Some("Thandi Mokoena"))
        .await
        .unwrap();
    assert!(name.starts_with(&format!("{order_ref}_Thandi_Mokoena_")));
    assert!(name.ends_with(".pdf"));
    assert!(storage.list_payment_proofs().await.unwrap().contains(&name));

    let file = storage.download_payment_proof(&name).await.unwrap().unwrap();
    assert_eq!(file.bytes, upload.bytes);
    assert_eq!(file.content_type, "application/pdf");

    storage.delete_payment_proof(&name).await.unwrap();
    assert!(storage.download_payment_proof(&name).await.unwrap().is_none());
}

// ============================================================================
// In-memory backend
// ============================================================================

#[tokio::test]
async fn memory_customers_round_trip() {
    customers_round_trip(&MemoryStorage::new()).await;
}

#[tokio::test]
async fn memory_orders_are_queued() {
    orders_are_queued(&MemoryStorage::new()).await;
}

#[tokio::test]
async fn memory_product_images() {
    product_images(&MemoryStorage::new()).await;
}

#[tokio::test]
async fn memory_payment_proofs() {
    payment_proofs(&MemoryStorage::new()).await;
}

#[tokio::test]
async fn memory_proofs_use_default_name_parts() {
    let storage = MemoryStorage::new();
    let upload = FileUpload::new("scan.JPG", None, Bytes::from_static(b"jpg"));
    let name = storage
        .upload_payment_proof(&upload, None, Some("   "))
        .await
        .unwrap();
    assert!(name.starts_with("GENERAL_UNKNOWN_"));
    assert!(name.ends_with(".JPG"));
}

// ============================================================================
// Azure backend
// ============================================================================

async fn azure() -> AzureStorage {
    let connection_string = std::env::var("AZURE_STORAGE_CONNECTION_STRING")
        .expect("AZURE_STORAGE_CONNECTION_STRING must be set");
    let account = parse_storage_account(&SecretString::from(connection_string)).unwrap();
    let storage = AzureStorage::new(&account).unwrap();
    storage.initialize().await.unwrap();
    storage
}

#[tokio::test]
#[ignore = "Requires AZURE_STORAGE_CONNECTION_STRING"]
async fn azure_customers_round_trip() {
    customers_round_trip(&azure().await).await;
}

#[tokio::test]
#[ignore = "Requires AZURE_STORAGE_CONNECTION_STRING"]
async fn azure_orders_are_queued() {
    orders_are_queued(&azure().await).await;
}

#[tokio::test]
#[ignore = "Requires AZURE_STORAGE_CONNECTION_STRING"]
async fn azure_product_images() {
    product_images(&azure().await).await;
}

#[tokio::test]
#[ignore = "Requires AZURE_STORAGE_CONNECTION_STRING with a file endpoint"]
async fn azure_payment_proofs() {
    payment_proofs(&azure().await).await;
}

//! Product pages and image handling.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use abc_retailers_admin::storage::RetailStorage;
use abc_retailers_admin::storage::naming::image_name_from_url;
use abc_retailers_core::ProductId;
use abc_retailers_integration_tests::{MultipartForm, TestApp, product};

fn product_form(id: &str) -> MultipartForm {
    MultipartForm::new()
        .text("product_id", id)
        .text("product_name", "Enamel Mug")
        .text("description", "Speckled blue")
        .text("price", "89.90")
        .text("stock_available", "25")
}

#[tokio::test]
async fn create_uploads_image_and_serves_it() {
    let mut app = TestApp::new();

    let form = product_form("42").file("product_image", "mug.png", "image/png", b"png-bytes");
    let response = app.post_multipart("/products", form).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());
    assert!(app.follow(&response).await.text().contains("Product created successfully!"));

    let stored = app
        .storage
        .get_product(&ProductId::parse("42").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.price.to_string(), "89.90");
    assert_eq!(stored.stock_available, 25);
    assert!(stored.has_image());

    let name = image_name_from_url(stored.image_url.as_deref().unwrap()).unwrap();
    let image = app.get(&format!("/products/images/{name}")).await;
    assert_eq!(image.status, StatusCode::OK);
    assert_eq!(image.header("content-type"), Some("image/png"));
    assert_eq!(image.header("cache-control"), Some("private, max-age=300"));
    assert_eq!(&image.body[..], b"png-bytes");
}

#[tokio::test]
async fn create_requires_an_image() {
    let mut app = TestApp::new();
    let response = app.post_multipart("/products", product_form("42")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Please upload a product image."));
}

#[tokio::test]
async fn create_rejects_bad_values() {
    let mut app = TestApp::new();
    let form = MultipartForm::new()
        .text("product_id", "abc")
        .text("product_name", "Enamel Mug")
        .text("price", "0")
        .text("stock_available", "-3")
        .file("product_image", "mug.exe", "application/octet-stream", b"MZ");
    let response = app.post_multipart("/products", form).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Product ID must be a whole number of 0 or more."));
    assert!(body.contains("Price must be greater than R0.00."));
    assert!(body.contains("Stock cannot be negative."));
    assert!(body.contains("Only image files (JPG, JPEG, PNG, GIF, WEBP) are allowed."));
    assert!(app.storage.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_rejects_price_above_ceiling() {
    let mut app = TestApp::new();
    let form = MultipartForm::new()
        .text("product_id", "42")
        .text("product_name", "Enamel Mug")
        .text("price", "79228162514264337593543950335")
        .text("stock_available", "1")
        .file("product_image", "mug.png", "image/png", b"png-bytes");
    let response = app.post_multipart("/products", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Price must not exceed R1000000000.00."));
    assert!(app.storage.list_products().await.unwrap().is_empty());
    assert!(app.storage.image_names().await.is_empty());
}

#[tokio::test]
async fn duplicate_product_keeps_existing_image() {
    let mut app = TestApp::new();
    let form = product_form("7").file("product_image", "a.png", "image/png", b"first");
    app.post_multipart("/products", form).await;

    let form = product_form("7").file("product_image", "b.png", "image/png", b"second");
    let response = app.post_multipart("/products", form).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("A product with this ID already exists."));

    let stored = app
        .storage
        .get_product(&ProductId::parse("7").unwrap())
        .await
        .unwrap()
        .unwrap();
    let name = image_name_from_url(stored.image_url.as_deref().unwrap()).unwrap();
    let image = app.storage.get_product_image(&name).await.unwrap().unwrap();
    assert_eq!(&image.bytes[..], b"first");
}

#[tokio::test]
async fn edit_without_new_image_keeps_the_old_one() {
    let mut app = TestApp::new();
    let form = product_form("5").file("product_image", "a.png", "image/png", b"img");
    app.post_multipart("/products", form).await;
    let before = app
        .storage
        .get_product(&ProductId::parse("5").unwrap())
        .await
        .unwrap()
        .unwrap();

    let form = MultipartForm::new()
        .text("product_name", "Enamel Mug XL")
        .text("description", "Speckled blue")
        .text("price", "99.90")
        .text("stock_available", "0");
    let response = app.post_multipart("/products/5/edit", form).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());

    let after = app
        .storage
        .get_product(&ProductId::parse("5").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.name, "Enamel Mug XL");
    assert_eq!(after.stock_available, 0);
    assert_eq!(after.image_url, before.image_url);
}

#[tokio::test]
async fn edit_with_new_image_replaces_the_old_one() {
    let mut app = TestApp::new();
    let form = product_form("5").file("product_image", "a.png", "image/png", b"old");
    app.post_multipart("/products", form).await;
    let id = ProductId::parse("5").unwrap();
    let before = app.storage.get_product(&id).await.unwrap().unwrap();
    let old_name = image_name_from_url(before.image_url.as_deref().unwrap()).unwrap();

    let form = product_form("5").file("product_image", "b.jpg", "image/jpeg", b"new");
    let response = app.post_multipart("/products/5/edit", form).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());

    let after = app.storage.get_product(&id).await.unwrap().unwrap();
    assert_ne!(after.image_url, before.image_url);
    let new_name = image_name_from_url(after.image_url.as_deref().unwrap()).unwrap();
    let image = app.storage.get_product_image(&new_name).await.unwrap().unwrap();
    assert_eq!(&image.bytes[..], b"new");
    assert!(app.storage.get_product_image(&old_name).await.unwrap().is_none());
    assert_eq!(app.storage.image_names().await, vec![new_name]);
}

#[tokio::test]
async fn failed_edit_discards_the_new_image() {
    let mut app = TestApp::new();
    let form = product_form("5").file("product_image", "a.png", "image/png", b"old");
    app.post_multipart("/products", form).await;
    let id = ProductId::parse("5").unwrap();
    let before = app.storage.get_product(&id).await.unwrap().unwrap();
    let old_name = image_name_from_url(before.image_url.as_deref().unwrap()).unwrap();

    app.faults.fail("update_product");
    let form = product_form("5").file("product_image", "b.jpg", "image/jpeg", b"new");
    let response = app.post_multipart("/products/5/edit", form).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Error updating product:"));

    let after = app.storage.get_product(&id).await.unwrap().unwrap();
    assert_eq!(after.image_url, before.image_url);
    assert_eq!(app.storage.image_names().await, vec![old_name]);
}

#[tokio::test]
async fn edit_reports_storage_failure_on_the_form() {
    let mut app = TestApp::new();
    app.storage.create_product(&product("7")).await.unwrap();

    app.faults.fail("get_product");
    let response = app.post_multipart("/products/7/edit", product_form("7")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Error updating product:"));

    let stored = app
        .storage
        .get_product(&ProductId::parse("7").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Rooibos Tea 80s");
}

#[tokio::test]
async fn delete_removes_record_and_image() {
    let mut app = TestApp::new();
    let form = product_form("9").file("product_image", "a.png", "image/png", b"img");
    app.post_multipart("/products", form).await;
    let stored = app
        .storage
        .get_product(&ProductId::parse("9").unwrap())
        .await
        .unwrap()
        .unwrap();
    let name = image_name_from_url(stored.image_url.as_deref().unwrap()).unwrap();

    let response = app.post_form("/products/9/delete", &[]).await;
    assert!(app.follow(&response).await.text().contains("Product deleted successfully!"));
    assert!(app.storage.get_product_image(&name).await.unwrap().is_none());

    let missing = app.get(&format!("/products/images/{name}")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_shows_prices() {
    let mut app = TestApp::new();
    app.storage.create_product(&product("3")).await.unwrap();

    let response = app.get("/products").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Rooibos Tea 80s"));
    assert!(body.contains("R 45.50"));
}

//! Order pages and the price lookup.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use abc_retailers_admin::storage::RetailStorage;
use abc_retailers_core::{Order, OrderStatus, Price, Product};
use abc_retailers_integration_tests::{TestApp, customer, product};

async fn seeded() -> TestApp {
    let app = TestApp::new();
    app.storage.create_customer(&customer("C1")).await.unwrap();
    app.storage.create_product(&product("7")).await.unwrap();
    app
}

async fn placed_order(app: &TestApp) -> Order {
    let order = Order::place(
        &customer("C1"),
        &product("7"),
        1,
        chrono::Utc::now(),
        OrderStatus::default(),
    )
    .unwrap();
    app.storage.create_order(&order).await.unwrap()
}

#[tokio::test]
async fn create_order_snapshots_price_and_queues_message() {
    let mut app = seeded().await;

    let response = app
        .post_form(
            "/orders",
            &[
                ("customer_id", "C1"),
                ("product_id", "7"),
                ("quantity", "3"),
                ("order_date", "2025-03-01T09:30"),
                ("status", "Pending"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());
    assert!(app.follow(&response).await.text().contains("Order created successfully!"));

    let orders = app.storage.list_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.username, "thandim");
    assert_eq!(order.product_name, "Rooibos Tea 80s");
    assert_eq!(order.total_price.to_string(), "136.50");
    assert_eq!(order.order_date.to_rfc3339(), "2025-03-01T09:30:00+00:00");

    let messages = app.storage.receive_order_messages(10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].order_id, order.id.as_str());
    assert!((messages[0].total_price - 136.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn unknown_customer_or_product_is_rejected() {
    let mut app = seeded().await;
    let response = app
        .post_form(
            "/orders",
            &[
                ("customer_id", "C404"),
                ("product_id", "7"),
                ("quantity", "1"),
                ("order_date", "2025-03-01T09:30"),
                ("status", "Pending"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Invalid customer or product selected."));
    assert!(app.storage.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_quantity_re_renders_with_dropdowns() {
    let mut app = seeded().await;
    let response = app
        .post_form(
            "/orders",
            &[
                ("customer_id", "C1"),
                ("product_id", "7"),
                ("quantity", "0"),
                ("order_date", "2025-03-01T09:30"),
                ("status", "Pending"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Quantity must be at least 1"));
    assert!(body.contains("Rooibos Tea 80s"));
}

#[tokio::test]
async fn new_order_form_lists_customers_and_products() {
    let mut app = seeded().await;
    let response = app.get("/orders/new").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Thandi Mokoena"));
    assert!(body.contains("Rooibos Tea 80s"));
    assert!(body.contains("Processing"));
}

#[tokio::test]
async fn product_price_lookup() {
    let mut app = seeded().await;

    let response = app.get("/orders/product-price?product_id=7").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({"success": true, "price": 45.5, "stock": 10, "name": "Rooibos Tea 80s"})
    );

    let response = app.get("/orders/product-price?product_id=99").await;
    assert_eq!(
        response.json(),
        json!({"success": false, "message": "Product not found"})
    );
}

#[tokio::test]
async fn status_update_keeps_other_fields() {
    let mut app = seeded().await;
    let order = placed_order(&app).await;
    let id = order.id.to_string();

    let response = app
        .post_form(
            &format!("/orders/{id}/edit"),
            &[("order_id", id.as_str()), ("status", "Shipped")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());
    assert!(app.follow(&response).await.text().contains("Order status updated successfully!"));

    let updated = app.storage.get_order(&order.id).await.unwrap().unwrap();
    assert_eq!(updated.status.as_str(), "Shipped");
    assert_eq!(updated.total_price, order.total_price);
    assert_eq!(updated.order_date, order.order_date);
}

#[tokio::test]
async fn status_update_for_another_order_is_not_found() {
    let mut app = seeded().await;
    let order = placed_order(&app).await;

    let response = app
        .post_form(
            &format!("/orders/{}/edit", order.id),
            &[("order_id", "someone-else"), ("status", "Shipped")],
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_form_offers_custom_status() {
    let mut app = seeded().await;
    let mut order = placed_order(&app).await;
    order.status = OrderStatus::parse("On hold").unwrap();
    app.storage.update_order(&order).await.unwrap();

    let response = app.get(&format!("/orders/{}/edit", order.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("On hold"));
}

#[tokio::test]
async fn detail_and_delete() {
    let mut app = seeded().await;
    let order = placed_order(&app).await;

    let response = app.get(&format!("/orders/{}", order.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("R 45.50"));

    let response = app
        .post_form(&format!("/orders/{}/delete", order.id), &[])
        .await;
    assert!(app.follow(&response).await.text().contains("Order deleted successfully!"));

    let response = app.get(&format!("/orders/{}", order.id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .post_form(&format!("/orders/{}/delete", order.id), &[])
        .await;
    assert!(app.follow(&response).await.text().contains("Order not found."));
}

#[tokio::test]
async fn most_expensive_order_is_placed_with_exact_total() {
    let mut app = TestApp::new();
    app.storage.create_customer(&customer("C1")).await.unwrap();
    let pricey = Product {
        price: Price::parse("1000000000.00").unwrap(),
        ..product("7")
    };
    app.storage.create_product(&pricey).await.unwrap();

    let response = app
        .post_form(
            "/orders",
            &[
                ("customer_id", "C1"),
                ("product_id", "7"),
                ("quantity", "2147483647"),
                ("order_date", "2025-03-01T09:30"),
                ("status", "Pending"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());

    let orders = app.storage.list_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total_price.to_string(), "2147483647000000000.00");
    assert_eq!(app.storage.queued_messages().await, 1);
}

#[tokio::test]
async fn quantity_beyond_column_range_is_rejected() {
    let mut app = seeded().await;

    let response = app
        .post_form(
            "/orders",
            &[
                ("customer_id", "C1"),
                ("product_id", "7"),
                ("quantity", "2147483648"),
                ("order_date", "2025-03-01T09:30"),
                ("status", "Pending"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Quantity cannot exceed 2147483647."));
    assert!(app.storage.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn status_update_reports_storage_failure() {
    let mut app = seeded().await;
    let order = placed_order(&app).await;

    app.faults.fail("get_order");
    let response = app
        .post_form(
            &format!("/orders/{}/edit", order.id),
            &[("order_id", order.id.as_str()), ("status", "Shipped")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/orders"));

    app.faults.restore("get_order");
    assert!(app.follow(&response).await.text().contains("Error updating order:"));
    let stored = app.storage.get_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, order.status);
}

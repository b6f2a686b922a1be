//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (storage ping)
//!
//! GET  /                              - Dashboard
//! GET  /privacy                       - Privacy page
//!
//! GET  /customers                     - Customer listing
//! GET  /customers/new                 - New customer form
//! POST /customers                     - Create customer
//! GET  /customers/{id}                - Customer detail
//! GET  /customers/{id}/edit           - Edit form
//! POST /customers/{id}/edit           - Update customer
//! POST /customers/{id}/delete         - Delete customer
//!
//! GET  /products                      - Product listing
//! GET  /products/new                  - New product form
//! POST /products                      - Create product (multipart)
//! GET  /products/{id}/edit            - Edit form
//! POST /products/{id}/edit            - Update product (multipart)
//! POST /products/{id}/delete          - Delete product and image
//! GET  /products/images/{name}        - Product image
//!
//! GET  /orders                        - Order listing
//! GET  /orders/new                    - New order form
//! POST /orders                        - Create order
//! GET  /orders/product-price          - Price lookup (JSON)
//! GET  /orders/{id}                   - Order detail
//! GET  /orders/{id}/edit              - Status form
//! POST /orders/{id}/edit              - Update status
//! POST /orders/{id}/delete            - Delete order
//!
//! GET  /uploads                       - Payment proofs and upload form
//! POST /uploads                       - Upload payment proof (multipart)
//! GET  /uploads/download/{file_name}  - Download payment proof
//! POST /uploads/delete                - Delete payment proof
//! ```

pub mod customers;
pub mod health;
pub mod home;
pub mod orders;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::error::error_page;
use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Largest request body accepted.
///
/// Above the 5 MiB upload cap so oversized files reach the handlers and get
/// a validation message instead of a bare 413.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Directory holding CSS and JavaScript.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// All page and API routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(home::router())
        .merge(customers::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(uploads::router())
}

/// Build the application with its middleware stack.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(not_found)
        .layer(session_layer)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// 404 page for unknown routes.
async fn not_found() -> Response {
    error_page(
        StatusCode::NOT_FOUND,
        "The page you are looking for does not exist.".to_string(),
    )
}

/// Redirect after a successful form post.
fn see_other(path: &str) -> Response {
    Redirect::to(path).into_response()
}

//! Integration tests for the ABC Retailers back office.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP and storage tests against the in-memory backend
//! cargo test -p abc-retailers-integration-tests
//!
//! # Storage tests against a real account (or Azurite for tables, blobs and queues)
//! AZURE_STORAGE_CONNECTION_STRING=... cargo test -p abc-retailers-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storage_contract` - Behaviour every `RetailStorage` backend must share
//! - `http_*` - Requests through the full router and middleware stack
//!
//! The HTTP tests drive the router in process with `tower::ServiceExt::oneshot`
//! and carry the session cookie between requests so flash messages can be
//! followed across redirects.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

mod faults;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use bytes::Bytes;
use tower::ServiceExt;

use abc_retailers_admin::config::AdminConfig;
use abc_retailers_admin::routes;
use abc_retailers_admin::state::AppState;
use abc_retailers_admin::storage::memory::MemoryStorage;
use abc_retailers_admin::storage::RetailStorage;
use abc_retailers_core::{Customer, CustomerId, Email, Price, Product, ProductId};

pub use faults::FaultyStorage;

/// The full application over in-memory storage, with a cookie jar of one.
///
/// Handlers reach the data through `faults`, so a test can make single
/// storage operations fail while `storage` stays readable.
pub struct TestApp {
    router: Router,
    pub storage: Arc<MemoryStorage>,
    pub faults: Arc<FaultyStorage>,
    cookie: Option<String>,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body as text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body as JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Value of a header as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Target of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let faults = Arc::new(FaultyStorage::new(storage.clone()));
        let shared: Arc<dyn RetailStorage> = faults.clone();
        let state = AppState::with_storage(AdminConfig::in_memory(), shared);
        Self {
            router: routes::app(state),
            storage,
            faults,
            cookie: None,
        }
    }

    /// Send a request, keeping any session cookie the response sets.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(pair) = set_cookie.split(';').next() {
                self.cookie = Some(pair.trim().to_owned());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST an urlencoded form.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart form.
    pub async fn post_multipart(&mut self, uri: &str, form: MultipartForm) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Follow a redirect response with a GET.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.text());
        let location = response.location().unwrap().to_owned();
        self.get(&location).await
    }
}

/// Builder for `multipart/form-data` bodies.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: "----abc-retailers-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

/// A customer record ready to insert.
#[must_use]
pub fn customer(id: &str) -> Customer {
    Customer {
        id: CustomerId::parse(id).unwrap(),
        name: "Thandi".to_string(),
        surname: "Mokoena".to_string(),
        username: "thandim".to_string(),
        email: Email::parse("thandi@example.co.za").unwrap(),
        shipping_address: "12 Long Street, Cape Town".to_string(),
        etag: None,
        timestamp: None,
    }
}

/// A product record ready to insert, priced at R45.50 with 10 in stock.
#[must_use]
pub fn product(id: &str) -> Product {
    Product {
        id: ProductId::parse(id).unwrap(),
        name: "Rooibos Tea 80s".to_string(),
        description: "Caffeine free".to_string(),
        price: Price::parse("45.50").unwrap(),
        stock_available: 10,
        image_url: None,
        etag: None,
        timestamp: None,
    }
}

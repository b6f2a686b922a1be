//! HTTP middleware stack for the back office.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Body limit (uploads up to 16 MiB reach the handlers)
//! 6. Session layer (tower-sessions memory store, flash messages only)

pub mod flash;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use flash::{Flash, flash_error, flash_success, take_flash};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;

//! Back-office records.
//!
//! Each record carries the optimistic concurrency token (`etag`) and the
//! service timestamp of the version it was read from. Both are `None` for a
//! record that has not been stored yet.

pub mod customer;
pub mod order;
pub mod product;
pub mod upload;

pub use customer::Customer;
pub use order::Order;
pub use product::Product;
pub use upload::{FileUpload, StoredFile};

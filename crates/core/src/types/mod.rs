//! Core value types for the back office.
//!
//! This module provides type-safe wrappers for the validated fields of the
//! customer, product and order records.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{CustomerId, IdError, OrderId, ProductId};
pub use price::{Price, PriceError};
pub use status::{OrderStatus, StatusError};

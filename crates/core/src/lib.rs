//! ABC Retailers Core - Shared record and value types.
//!
//! This crate provides the types used across the back office components:
//! - `admin` - The back-office web application
//! - `cli` - Operator commands for provisioning and inspecting storage
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage clients, no HTTP.
//! Validation that belongs to a single field lives on the value type; form
//! level validation lives with the forms in the admin crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, email addresses, prices and statuses
//! - [`entities`] - The customer, product and order records plus uploaded files

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entities;
pub mod types;

pub use entities::*;
pub use types::*;

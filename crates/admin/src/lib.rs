//! ABC Retailers back office library.
//!
//! Server-rendered pages for managing customers, products, orders and
//! payment proofs kept in one Azure Storage account. The binary in
//! `main.rs` adds tracing, Sentry and the listener; everything else lives
//! here so it can be exercised by the integration tests.
//!
//! # Security
//!
//! The back office has no sign-in of its own. Deploy it behind a network
//! boundary or an authenticating reverse proxy.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;

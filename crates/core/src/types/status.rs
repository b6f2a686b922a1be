//! Order status.
//!
//! The status is free text so staff can record whatever state an order is
//! in. The edit form offers [`OrderStatus::SUGGESTED`] as a dropdown.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderStatus`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// The status is empty.
    #[error("status is required")]
    Empty,
    /// The status is too long.
    #[error("status must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Free-text order status, defaulting to `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Maximum status length.
    pub const MAX_LENGTH: usize = 20;

    /// Status given to new orders.
    pub const PENDING: &'static str = "Pending";

    /// Values offered by the status dropdown.
    pub const SUGGESTED: &'static [&'static str] = &[
        "Pending",
        "Processing",
        "Shipped",
        "Delivered",
        "Cancelled",
    ];

    /// Parse a status, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the status is empty or longer than 20 characters.
    pub fn parse(value: &str) -> Result<Self, StatusError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(StatusError::Empty);
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(StatusError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self(Self::PENDING.to_owned())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = StatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.0
    }
}

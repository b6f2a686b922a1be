//! Customer record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, Email};

/// A customer of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Row key, chosen by the admin who creates the customer.
    pub id: CustomerId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: Email,
    pub shipping_address: String,
    /// Concurrency token of the stored version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Last-modified time reported by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Customer {
    /// Name and surname, for listings and dropdowns.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

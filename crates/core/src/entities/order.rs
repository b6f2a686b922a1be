//! Order record.
//!
//! Orders copy the customer's username and the product's name and price at
//! the moment they are placed. Later edits to the customer or product are not
//! reflected in existing orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{Customer, Product};
use crate::types::{CustomerId, OrderId, OrderStatus, Price, PriceError, ProductId};

/// A customer order for a single product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Customer username at the time of ordering.
    pub username: String,
    pub product_id: ProductId,
    /// Product name at the time of ordering.
    pub product_name: String,
    /// Always UTC; the store rejects timestamps without an offset.
    pub order_date: DateTime<Utc>,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Decimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Order {
    /// Build a new, unsaved order for `quantity` units of `product`.
    ///
    /// Generates a fresh order ID and computes the total from the product's
    /// current price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TotalOverflow`] if the total cannot be computed.
    pub fn place(
        customer: &Customer,
        product: &Product,
        quantity: u32,
        order_date: DateTime<Utc>,
        status: OrderStatus,
    ) -> Result<Self, PriceError> {
        let total_price = product.price.line_total(quantity)?;
        Ok(Self {
            id: OrderId::generate(),
            customer_id: customer.id.clone(),
            username: customer.username.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            order_date,
            quantity,
            unit_price: product.price,
            total_price,
            status,
            etag: None,
            timestamp: None,
        })
    }
}

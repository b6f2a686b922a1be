//! Order message placed on the processing queue.

use abc_retailers_core::Order;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::StorageError;

/// JSON payload sent to the `orderprocessing` queue when an order is created.
///
/// Field names are PascalCase and amounts are plain numbers so consumers on
/// other stacks can read the message without a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderMessage {
    pub order_id: String,
    pub customer_id: String,
    pub username: String,
    pub product_id: String,
    pub product_name: String,
    pub order_date: DateTime<Utc>,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
    pub status: String,
}

/// Order total as the `f64` the table and queue carry.
///
/// # Errors
///
/// Returns [`StorageError::Encode`] if the amount has no `f64` value.
pub fn total_to_f64(order: &Order) -> Result<f64, StorageError> {
    amount_to_f64(order.total_price)
        .ok_or_else(|| StorageError::Encode(format!("order {} total is out of range", order.id)))
}

fn amount_to_f64(amount: Decimal) -> Option<f64> {
    amount.to_f64().filter(|v| v.is_finite())
}

impl TryFrom<&Order> for OrderMessage {
    type Error = StorageError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: order.id.to_string(),
            customer_id: order.customer_id.to_string(),
            username: order.username.clone(),
            product_id: order.product_id.to_string(),
            product_name: order.product_name.clone(),
            order_date: order.order_date,
            quantity: order.quantity,
            unit_price: order.unit_price.to_f64(),
            total_price: total_to_f64(order)?,
            status: order.status.to_string(),
        })
    }
}

impl OrderMessage {
    /// Serialize to the queue payload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Encode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use abc_retailers_core::{Customer, CustomerId, Email, OrderStatus, Price, Product, ProductId};
    use chrono::TimeZone;

    #[test]
    fn payload_uses_pascal_case_fields() {
        let customer = Customer {
            id: CustomerId::parse("C1").unwrap(),
            name: "Lerato".to_string(),
            surname: "Dlamini".to_string(),
            username: "lerato".to_string(),
            email: Email::parse("lerato@example.com").unwrap(),
            shipping_address: "1 Main Rd".to_string(),
            etag: None,
            timestamp: None,
        };
        let product = Product {
            id: ProductId::parse("3").unwrap(),
            name: "Mug".to_string(),
            description: String::new(),
            price: Price::parse("12.25").unwrap(),
            stock_available: 1,
            image_url: None,
            etag: None,
            timestamp: None,
        };
        let date = Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap();
        let order = Order::place(&customer, &product, 2, date, OrderStatus::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&OrderMessage::try_from(&order).unwrap().to_json().unwrap())
                .unwrap();
        assert_eq!(json["OrderId"], order.id.as_str());
        assert_eq!(json["CustomerId"], "C1");
        assert_eq!(json["ProductName"], "Mug");
        assert_eq!(json["Quantity"], 2);
        assert_eq!(json["UnitPrice"], 12.25);
        assert_eq!(json["TotalPrice"], 24.5);
        assert_eq!(json["Status"], "Pending");
        assert_eq!(json["OrderDate"], "2025-05-06T07:08:09Z");
    }
}

//! Table entity rows.
//!
//! Each row maps one-to-one to the JSON entity stored in its table. Property
//! names are PascalCase, the row key doubles as the record ID and prices are
//! stored as `Edm.Double`. Conversions into core records re-validate every
//! field, so a hand-edited entity surfaces as an error instead of bad data.

use abc_retailers_core::{
    Customer, CustomerId, Email, Order, OrderId, OrderStatus, Price, Product, ProductId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::{
    CUSTOMER_PARTITION, CUSTOMERS_TABLE, ORDER_PARTITION, ORDERS_TABLE, PRODUCT_PARTITION,
    PRODUCTS_TABLE, StorageError, message::total_to_f64,
};

/// A row type stored in one partition of one table.
pub trait TableEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Table name.
    const TABLE: &'static str;
    /// Partition all rows of this type live in.
    const PARTITION: &'static str;
    /// Properties that need an explicit `@odata.type` annotation.
    const TYPED_PROPERTIES: &'static [(&'static str, &'static str)] = &[];

    /// Row key.
    fn row_key(&self) -> &str;
}

fn invalid(entity: &str, key: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::Response(format!("stored {entity} {key} is invalid: {err}"))
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerRow {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default, skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "odata.etag", default, skip_serializing)]
    pub etag: Option<String>,
    pub customer_id: String,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub shipping_address: String,
}

impl TableEntity for CustomerRow {
    const TABLE: &'static str = CUSTOMERS_TABLE;
    const PARTITION: &'static str = CUSTOMER_PARTITION;

    fn row_key(&self) -> &str {
        &self.row_key
    }
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            partition_key: CUSTOMER_PARTITION.to_owned(),
            row_key: c.id.to_string(),
            timestamp: None,
            etag: None,
            customer_id: c.id.to_string(),
            name: c.name.clone(),
            surname: c.surname.clone(),
            username: c.username.clone(),
            email: c.email.to_string(),
            shipping_address: c.shipping_address.clone(),
        }
    }
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StorageError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let id =
            CustomerId::parse(&row.row_key).map_err(|e| invalid("customer", &row.row_key, e))?;
        let email = Email::parse(&row.email).map_err(|e| invalid("customer", &row.row_key, e))?;
        Ok(Self {
            id,
            name: row.name,
            surname: row.surname,
            username: row.username,
            email,
            shipping_address: row.shipping_address,
            etag: row.etag,
            timestamp: row.timestamp,
        })
    }
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductRow {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default, skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "odata.etag", default, skip_serializing)]
    pub etag: Option<String>,
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub stock_available: i32,
    #[serde(default)]
    pub image_url: String,
}

impl TableEntity for ProductRow {
    const TABLE: &'static str = PRODUCTS_TABLE;
    const PARTITION: &'static str = PRODUCT_PARTITION;
    const TYPED_PROPERTIES: &'static [(&'static str, &'static str)] = &[("Price", "Edm.Double")];

    fn row_key(&self) -> &str {
        &self.row_key
    }
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            partition_key: PRODUCT_PARTITION.to_owned(),
            row_key: p.id.to_string(),
            timestamp: None,
            etag: None,
            product_id: p.id.to_string(),
            product_name: p.name.clone(),
            description: p.description.clone(),
            price: p.price.to_f64(),
            stock_available: to_i32(p.stock_available),
            image_url: p.image_url.clone().unwrap_or_default(),
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StorageError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let key = row.row_key.clone();
        Ok(Self {
            id: ProductId::parse(&key).map_err(|e| invalid("product", &key, e))?,
            name: row.product_name,
            description: row.description,
            price: Price::from_f64(row.price).map_err(|e| invalid("product", &key, e))?,
            stock_available: u32::try_from(row.stock_available)
                .map_err(|e| invalid("product", &key, e))?,
            image_url: Some(row.image_url).filter(|url| !url.is_empty()),
            etag: row.etag,
            timestamp: row.timestamp,
        })
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderRow {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default, skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "odata.etag", default, skip_serializing)]
    pub etag: Option<String>,
    pub order_id: String,
    pub customer_id: String,
    pub username: String,
    pub product_id: String,
    pub product_name: String,
    pub order_date: DateTime<Utc>,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
    pub status: String,
}

impl TableEntity for OrderRow {
    const TABLE: &'static str = ORDERS_TABLE;
    const PARTITION: &'static str = ORDER_PARTITION;
    const TYPED_PROPERTIES: &'static [(&'static str, &'static str)] = &[
        ("OrderDate", "Edm.DateTime"),
        ("UnitPrice", "Edm.Double"),
        ("TotalPrice", "Edm.Double"),
    ];

    fn row_key(&self) -> &str {
        &self.row_key
    }
}

impl TryFrom<&Order> for OrderRow {
    type Error = StorageError;

    fn try_from(o: &Order) -> Result<Self, Self::Error> {
        Ok(Self {
            partition_key: ORDER_PARTITION.to_owned(),
            row_key: o.id.to_string(),
            timestamp: None,
            etag: None,
            order_id: o.id.to_string(),
            customer_id: o.customer_id.to_string(),
            username: o.username.clone(),
            product_id: o.product_id.to_string(),
            product_name: o.product_name.clone(),
            order_date: o.order_date,
            quantity: to_i32(o.quantity),
            unit_price: o.unit_price.to_f64(),
            total_price: total_to_f64(o)?,
            status: o.status.to_string(),
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = StorageError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let key = row.row_key.clone();
        let bad = |e: &dyn std::fmt::Display| invalid("order", &key, e);
        let total_price = Decimal::try_from(row.total_price)
            .map(|d| d.round_dp(2))
            .map_err(|e| bad(&e))?;
        Ok(Self {
            id: OrderId::parse(&key).map_err(|e| bad(&e))?,
            customer_id: CustomerId::parse(&row.customer_id).map_err(|e| bad(&e))?,
            username: row.username,
            product_id: ProductId::parse(&row.product_id).map_err(|e| bad(&e))?,
            product_name: row.product_name,
            order_date: row.order_date,
            quantity: u32::try_from(row.quantity).map_err(|e| bad(&e))?,
            unit_price: Price::from_f64(row.unit_price).map_err(|e| bad(&e))?,
            total_price,
            status: OrderStatus::parse(&row.status).map_err(|e| bad(&e))?,
            etag: row.etag,
            timestamp: row.timestamp,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_entity_round_trip() {
        let stored = json!({
            "odata.etag": "W/\"datetime'2025-01-01T00%3A00%3A00Z'\"",
            "PartitionKey": "Customer",
            "RowKey": "C1",
            "Timestamp": "2025-01-01T00:00:00.1234567Z",
            "CustomerId": "C1",
            "Name": "Naledi",
            "Surname": "Khumalo",
            "Username": "naledi",
            "Email": "naledi@example.com",
            "ShippingAddress": "9 Oak Ave"
        });
        let row: CustomerRow = serde_json::from_value(stored).unwrap();
        let customer = Customer::try_from(row).unwrap();
        assert_eq!(customer.id.as_str(), "C1");
        assert!(customer.etag.as_deref().unwrap().starts_with("W/"));
        assert!(customer.timestamp.is_some());

        let written = serde_json::to_value(CustomerRow::from(&customer)).unwrap();
        assert_eq!(written["PartitionKey"], "Customer");
        assert!(written.get("odata.etag").is_none());
        assert!(written.get("Timestamp").is_none());
    }

    #[test]
    fn product_without_image_maps_to_none() {
        let row: ProductRow = serde_json::from_value(json!({
            "PartitionKey": "Product", "RowKey": "5", "ProductId": "5",
            "ProductName": "Towel", "Description": "", "Price": 89.9,
            "StockAvailable": 0, "ImageUrl": ""
        }))
        .unwrap();
        let product = Product::try_from(row).unwrap();
        assert!(product.image_url.is_none());
        assert_eq!(product.price.to_string(), "89.90");
    }

    #[test]
    fn invalid_stored_values_are_errors() {
        let row: ProductRow = serde_json::from_value(json!({
            "PartitionKey": "Product", "RowKey": "5", "ProductId": "5",
            "ProductName": "Towel", "Price": 10.0, "StockAvailable": -1
        }))
        .unwrap();
        assert!(matches!(Product::try_from(row), Err(StorageError::Response(_))));
    }

    #[test]
    fn order_date_is_utc() {
        let row: OrderRow = serde_json::from_value(json!({
            "PartitionKey": "Order", "RowKey": "o-1", "OrderId": "o-1",
            "CustomerId": "C1", "Username": "u", "ProductId": "5", "ProductName": "Towel",
            "OrderDate@odata.type": "Edm.DateTime", "OrderDate": "2025-03-04T05:06:07Z",
            "Quantity": 3, "UnitPrice": 19.99, "TotalPrice": 59.97, "Status": "Shipped"
        }))
        .unwrap();
        let order = Order::try_from(row).unwrap();
        assert_eq!(order.order_date.to_rfc3339(), "2025-03-04T05:06:07+00:00");
        assert_eq!(order.total_price, Decimal::new(5997, 2));
        assert_eq!(order.status.as_str(), "Shipped");
    }
}

//! Form input types.
//!
//! Browser forms arrive as strings. Each form type checks its fields and
//! either produces validated values for the storage layer or a set of
//! [`FormErrors`] to show next to the fields when the page is re-rendered.

use std::collections::BTreeMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use abc_retailers_core::entities::upload::extension_of;
use abc_retailers_core::types::id::validate_id;
use abc_retailers_core::{
    Customer, CustomerId, Email, FileUpload, Order, OrderId, OrderStatus, Price, PriceError,
    Product, ProductId,
};

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Extensions accepted for payment proofs (lowercase, with dot).
pub const PROOF_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".doc", ".docx"];

/// Extensions accepted for product images (lowercase, with dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Format used by `<input type="datetime-local">`.
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Key for errors that belong to the whole form rather than one field.
pub const GENERAL: &str = "";

/// Errors reading a multipart body.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),
}

/// Validation messages keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single form-level message.
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(GENERAL, message);
        errors
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    /// Message for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Form-level message, if any.
    #[must_use]
    pub fn general_message(&self) -> Option<&str> {
        self.get(GENERAL)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, field_errors) in errors.field_errors() {
            if let Some(message) = field_errors
                .iter()
                .find_map(|e| e.message.as_ref().map(ToString::to_string))
            {
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

fn row_key(value: &str) -> Result<(), ValidationError> {
    validate_id(value)
        .map_err(|e| ValidationError::new("row_key").with_message(e.to_string().into()))
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("This field is required.".into()));
    }
    Ok(())
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Customers
// =============================================================================

/// Customer create/edit form.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CustomerForm {
    #[serde(default)]
    #[validate(custom(function = "row_key"))]
    pub customer_id: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 50, message = "Name must be at most 50 characters.")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 50, message = "Surname must be at most 50 characters.")
    )]
    pub surname: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 50, message = "Username must be at most 50 characters.")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 200, message = "Shipping address must be at most 200 characters.")
    )]
    pub shipping_address: String,
    /// Concurrency token of the version the edit form was rendered from.
    #[serde(default)]
    pub etag: Option<String>,
}

impl CustomerForm {
    /// Validate the form and build the customer record.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn into_customer(mut self) -> Result<Customer, FormErrors> {
        for field in [
            &mut self.customer_id,
            &mut self.name,
            &mut self.surname,
            &mut self.username,
            &mut self.email,
            &mut self.shipping_address,
        ] {
            trim_in_place(field);
        }
        self.validate()?;

        let id = CustomerId::parse(&self.customer_id)
            .map_err(|e| field_error("customer_id", e))?;
        let email = Email::parse(&self.email).map_err(|e| field_error("email", e))?;

        Ok(Customer {
            id,
            name: self.name,
            surname: self.surname,
            username: self.username,
            email,
            shipping_address: self.shipping_address,
            etag: non_empty(self.etag.as_deref()).map(str::to_owned),
            timestamp: None,
        })
    }
}

impl From<&Customer> for CustomerForm {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_id: customer.id.to_string(),
            name: customer.name.clone(),
            surname: customer.surname.clone(),
            username: customer.username.clone(),
            email: customer.email.to_string(),
            shipping_address: customer.shipping_address.clone(),
            etag: customer.etag.clone(),
        }
    }
}

fn field_error(field: &str, error: impl ToString) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.add(field, error.to_string());
    errors
}

// =============================================================================
// Multipart
// =============================================================================

/// Text fields and file fields of a multipart body.
#[derive(Debug, Default)]
struct MultipartFields {
    text: BTreeMap<String, String>,
    files: BTreeMap<String, FileUpload>,
}

impl MultipartFields {
    async fn read(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut fields = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes: Bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if !file_name.is_empty() && !bytes.is_empty() {
                        fields
                            .files
                            .insert(name, FileUpload::new(&file_name, content_type, bytes));
                    }
                }
                None => {
                    fields.text.insert(name, field.text().await?);
                }
            }
        }
        Ok(fields)
    }

    fn take_text(&mut self, name: &str) -> String {
        self.text
            .remove(name)
            .map(|v| v.trim().to_owned())
            .unwrap_or_default()
    }
}

/// Check an uploaded file against an extension allow-list and the size cap.
fn check_upload(
    file: &FileUpload,
    allowed: &[&str],
    type_message: &str,
    size_message: &str,
) -> Result<(), String> {
    let extension = extension_of(&file.file_name).to_ascii_lowercase();
    if !allowed.contains(&extension.as_str()) {
        return Err(type_message.to_owned());
    }
    if file.len() > MAX_UPLOAD_BYTES {
        return Err(size_message.to_owned());
    }
    Ok(())
}

// =============================================================================
// Products
// =============================================================================

/// Whether a product form must carry an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRule {
    Required,
    Optional,
}

/// Product create/edit form, read from a multipart body.
#[derive(Debug, Default, Clone, Validate)]
pub struct ProductForm {
    pub product_id: String,
    #[validate(
        custom(function = "non_blank"),
        length(max = 100, message = "Product name must be at most 100 characters.")
    )]
    pub product_name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters."))]
    pub description: String,
    pub price: String,
    pub stock_available: String,
    pub image: Option<FileUpload>,
}

/// Validated product fields.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock_available: u32,
    pub image: Option<FileUpload>,
}

impl ProductForm {
    /// Read the form from a multipart body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart data.
    pub async fn from_multipart(multipart: Multipart) -> Result<Self, FormError> {
        let mut fields = MultipartFields::read(multipart).await?;
        Ok(Self {
            product_id: fields.take_text("product_id"),
            product_name: fields.take_text("product_name"),
            description: fields.take_text("description"),
            price: fields.take_text("price"),
            stock_available: fields.take_text("stock_available"),
            image: fields.files.remove("product_image"),
        })
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validated(&self, image_rule: ImageRule) -> Result<ProductInput, FormErrors> {
        let mut errors = self.validate().map_or_else(FormErrors::from, |()| FormErrors::new());

        // The form only offers whole, non-negative product numbers.
        let id = match self.product_id.parse::<u64>() {
            Ok(number) => ProductId::parse(&number.to_string()).ok(),
            Err(_) => None,
        };
        if id.is_none() {
            errors.add("product_id", "Product ID must be a whole number of 0 or more.");
        }

        let price = match Price::parse(&self.price) {
            Ok(price) => Some(price),
            Err(PriceError::NotPositive) => {
                errors.add("price", "Price must be greater than R0.00.");
                None
            }
            Err(PriceError::TooLarge) => {
                errors.add("price", "Price must not exceed R1000000000.00.");
                None
            }
            Err(PriceError::NotANumber | PriceError::TotalOverflow) => {
                errors.add("price", "Price must be a number.");
                None
            }
        };

        let stock = match self.stock_available.parse::<i64>() {
            Ok(n) if n < 0 => {
                errors.add("stock_available", "Stock cannot be negative.");
                None
            }
            Ok(n) => u32::try_from(n).ok().or_else(|| {
                errors.add("stock_available", "Stock is too large.");
                None
            }),
            Err(_) => {
                errors.add("stock_available", "Stock must be a whole number.");
                None
            }
        };

        match (&self.image, image_rule) {
            (None, ImageRule::Required) => {
                errors.add("product_image", "Please upload a product image.");
            }
            (Some(image), _) => {
                if let Err(message) = check_upload(
                    image,
                    IMAGE_EXTENSIONS,
                    "Only image files (JPG, JPEG, PNG, GIF, WEBP) are allowed.",
                    "Image size cannot exceed 5MB.",
                ) {
                    errors.add("product_image", message);
                }
            }
            (None, ImageRule::Optional) => {}
        }

        match (id, price, stock) {
            (Some(id), Some(price), Some(stock_available)) if errors.is_empty() => {
                Ok(ProductInput {
                    id,
                    name: self.product_name.clone(),
                    description: self.description.clone(),
                    price,
                    stock_available,
                    image: self.image.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.to_string(),
            product_name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock_available: product.stock_available.to_string(),
            image: None,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// New order form.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub status: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            customer_id: String::new(),
            product_id: String::new(),
            quantity: "1".to_owned(),
            order_date: Utc::now().format(DATETIME_LOCAL_FORMAT).to_string(),
            status: OrderStatus::PENDING.to_owned(),
        }
    }
}

/// Validated new-order fields.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl OrderForm {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validated(&self) -> Result<OrderInput, FormErrors> {
        let mut errors = FormErrors::new();

        let customer_id = CustomerId::parse(self.customer_id.trim()).ok();
        if customer_id.is_none() {
            errors.add("customer_id", "Please select a customer.");
        }
        let product_id = ProductId::parse(self.product_id.trim()).ok();
        if product_id.is_none() {
            errors.add("product_id", "Please select a product.");
        }
        // Capped at the range of the table's `Edm.Int32` column.
        let quantity = match self.quantity.trim().parse::<i64>() {
            Ok(q) if q > i64::from(i32::MAX) => {
                errors.add("quantity", "Quantity cannot exceed 2147483647.");
                None
            }
            Ok(q) if q >= 1 => u32::try_from(q).ok(),
            _ => {
                errors.add("quantity", "Quantity must be at least 1");
                None
            }
        };
        let order_date = parse_order_date(&self.order_date);
        if order_date.is_none() {
            errors.add("order_date", "Please enter a valid order date.");
        }
        let status = OrderStatus::parse(&self.status)
            .map_err(|e| errors.add("status", e.to_string()))
            .ok();

        match (customer_id, product_id, quantity, order_date, status) {
            (
                Some(customer_id),
                Some(product_id),
                Some(quantity),
                Some(order_date),
                Some(status),
            ) => Ok(OrderInput {
                customer_id,
                product_id,
                quantity,
                order_date,
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// Parse a `datetime-local` value. The wall-clock time is taken as UTC.
#[must_use]
pub fn parse_order_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    [DATETIME_LOCAL_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Order status edit form.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusForm {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
}

impl OrderStatusForm {
    /// Whether the form refers to the order in the URL.
    #[must_use]
    pub fn matches(&self, id: &OrderId) -> bool {
        self.order_id.trim() == id.as_str()
    }

    /// Validate the new status.
    ///
    /// # Errors
    ///
    /// Returns the field message when the status is empty or too long.
    pub fn status(&self) -> Result<OrderStatus, FormErrors> {
        OrderStatus::parse(&self.status).map_err(|e| field_error("status", e))
    }
}

impl From<&Order> for OrderStatusForm {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            status: order.status.to_string(),
        }
    }
}

// =============================================================================
// Payment proofs
// =============================================================================

/// Payment proof upload form, read from a multipart body.
#[derive(Debug, Default, Clone)]
pub struct ProofUploadForm {
    pub proof_of_payment: Option<FileUpload>,
    pub order_id: String,
    pub customer_name: String,
}

impl ProofUploadForm {
    /// Read the form from a multipart body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart data.
    pub async fn from_multipart(multipart: Multipart) -> Result<Self, FormError> {
        let mut fields = MultipartFields::read(multipart).await?;
        Ok(Self {
            proof_of_payment: fields.files.remove("proof_of_payment"),
            order_id: fields.take_text("order_id"),
            customer_name: fields.take_text("customer_name"),
        })
    }

    /// Check the uploaded file and return it.
    ///
    /// # Errors
    ///
    /// Returns the field message for a missing, disallowed or oversized file.
    pub fn validated_file(&self) -> Result<&FileUpload, FormErrors> {
        let file = self
            .proof_of_payment
            .as_ref()
            .ok_or_else(|| field_error("proof_of_payment", "Please select a file to upload."))?;
        check_upload(
            file,
            PROOF_EXTENSIONS,
            "Only PDF, Image (JPG, JPEG, PNG), and Document (DOC, DOCX) files are allowed.",
            "File size cannot exceed 5MB.",
        )
        .map_err(|message| field_error("proof_of_payment", message))?;
        Ok(file)
    }

    /// Order reference, if one was typed.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        non_empty(Some(&self.order_id))
    }

    /// Customer name, if one was typed.
    #[must_use]
    pub fn customer_name(&self) -> Option<&str> {
        non_empty(Some(&self.customer_name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn customer_form() -> CustomerForm {
        CustomerForm {
            customer_id: "CUST-001".to_string(),
            name: " Thandi ".to_string(),
            surname: "Mokoena".to_string(),
            username: "thandim".to_string(),
            email: "thandi@example.co.za".to_string(),
            shipping_address: "12 Long Street, Cape Town".to_string(),
            etag: Some(String::new()),
        }
    }

    #[test]
    fn customer_form_builds_record() {
        let customer = customer_form().into_customer().unwrap();
        assert_eq!(customer.id.as_str(), "CUST-001");
        assert_eq!(customer.name, "Thandi");
        assert!(customer.etag.is_none());
    }

    #[test]
    fn customer_form_reports_each_field() {
        let form = CustomerForm {
            customer_id: "bad id".to_string(),
            name: String::new(),
            email: "not-an-email".to_string(),
            shipping_address: "x".repeat(201),
            ..customer_form()
        };
        let errors = form.into_customer().unwrap_err();
        assert!(errors.get("customer_id").is_some());
        assert_eq!(errors.get("name"), Some("This field is required."));
        assert_eq!(errors.get("email"), Some("Please enter a valid email address."));
        assert!(errors.get("shipping_address").is_some());
        assert!(errors.get("surname").is_none());
    }

    fn product_form() -> ProductForm {
        ProductForm {
            product_id: "7".to_string(),
            product_name: "Rooibos Tea 80s".to_string(),
            description: "Caffeine free".to_string(),
            price: "45.50".to_string(),
            stock_available: "12".to_string(),
            image: Some(FileUpload::new(
                "tea.PNG",
                Some("image/png".to_string()),
                Bytes::from_static(b"png"),
            )),
        }
    }

    #[test]
    fn product_form_accepts_valid_input() {
        let input = product_form().validated(ImageRule::Required).unwrap();
        assert_eq!(input.id.as_str(), "7");
        assert_eq!(input.price.to_string(), "45.50");
        assert_eq!(input.stock_available, 12);
        assert!(input.image.is_some());
    }

    #[test]
    fn product_form_messages() {
        let form = ProductForm {
            product_id: "-1".to_string(),
            price: "0".to_string(),
            stock_available: "-3".to_string(),
            image: None,
            ..product_form()
        };
        let errors = form.validated(ImageRule::Required).unwrap_err();
        assert!(errors.get("product_id").is_some());
        assert_eq!(errors.get("price"), Some("Price must be greater than R0.00."));
        assert_eq!(errors.get("stock_available"), Some("Stock cannot be negative."));
        assert_eq!(errors.get("product_image"), Some("Please upload a product image."));
    }

    #[test]
    fn product_price_has_a_ceiling() {
        let form = ProductForm {
            price: "79228162514264337593543950335".to_string(),
            ..product_form()
        };
        let errors = form.validated(ImageRule::Required).unwrap_err();
        assert_eq!(errors.get("price"), Some("Price must not exceed R1000000000.00."));
    }

    #[test]
    fn product_edit_does_not_need_an_image() {
        let form = ProductForm {
            image: None,
            ..product_form()
        };
        assert!(form.validated(ImageRule::Optional).is_ok());
    }

    #[test]
    fn product_image_type_and_size_are_checked() {
        let form = ProductForm {
            image: Some(FileUpload::new("notes.txt", None, Bytes::from_static(b"x"))),
            ..product_form()
        };
        let errors = form.validated(ImageRule::Optional).unwrap_err();
        assert!(errors.get("product_image").unwrap().starts_with("Only image files"));

        let form = ProductForm {
            image: Some(FileUpload::new(
                "huge.jpg",
                None,
                Bytes::from(vec![0_u8; MAX_UPLOAD_BYTES + 1]),
            )),
            ..product_form()
        };
        let errors = form.validated(ImageRule::Optional).unwrap_err();
        assert_eq!(errors.get("product_image"), Some("Image size cannot exceed 5MB."));
    }

    #[test]
    fn order_form_takes_wall_clock_time_as_utc() {
        let form = OrderForm {
            customer_id: "C1".to_string(),
            product_id: "7".to_string(),
            quantity: "3".to_string(),
            order_date: "2025-03-01T09:30".to_string(),
            status: "Pending".to_string(),
        };
        let input = form.validated().unwrap();
        assert_eq!(input.order_date, Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
        assert_eq!(input.quantity, 3);
    }

    #[test]
    fn order_form_rejects_zero_quantity_and_missing_selection() {
        let form = OrderForm {
            quantity: "0".to_string(),
            ..OrderForm::default()
        };
        let errors = form.validated().unwrap_err();
        assert_eq!(errors.get("quantity"), Some("Quantity must be at least 1"));
        assert!(errors.get("customer_id").is_some());
        assert!(errors.get("product_id").is_some());
        assert!(errors.get("order_date").is_none());
    }

    #[test]
    fn order_quantity_fits_the_table_column() {
        let form = |quantity: &str| OrderForm {
            customer_id: "C1".to_string(),
            product_id: "7".to_string(),
            quantity: quantity.to_string(),
            order_date: "2025-03-01T09:30".to_string(),
            status: "Pending".to_string(),
        };
        assert_eq!(form("2147483647").validated().unwrap().quantity, 2_147_483_647);
        let errors = form("2147483648").validated().unwrap_err();
        assert_eq!(errors.get("quantity"), Some("Quantity cannot exceed 2147483647."));
    }

    #[test]
    fn status_form_checks_length_and_id() {
        let id = OrderId::parse("abc").unwrap();
        let form = OrderStatusForm {
            order_id: "abc".to_string(),
            status: "x".repeat(21),
        };
        assert!(form.matches(&id));
        assert!(form.status().is_err());
        assert!(!OrderStatusForm {
            order_id: "other".to_string(),
            status: "Shipped".to_string()
        }
        .matches(&id));
    }

    #[test]
    fn proof_validation_messages() {
        let empty = ProofUploadForm::default();
        assert_eq!(
            empty.validated_file().unwrap_err().get("proof_of_payment"),
            Some("Please select a file to upload.")
        );

        let wrong_type = ProofUploadForm {
            proof_of_payment: Some(FileUpload::new("run.exe", None, Bytes::from_static(b"x"))),
            ..ProofUploadForm::default()
        };
        assert_eq!(
            wrong_type.validated_file().unwrap_err().get("proof_of_payment"),
            Some("Only PDF, Image (JPG, JPEG, PNG), and Document (DOC, DOCX) files are allowed.")
        );

        let too_big = ProofUploadForm {
            proof_of_payment: Some(FileUpload::new(
                "scan.PDF",
                None,
                Bytes::from(vec![0_u8; MAX_UPLOAD_BYTES + 1]),
            )),
            ..ProofUploadForm::default()
        };
        assert_eq!(
            too_big.validated_file().unwrap_err().get("proof_of_payment"),
            Some("File size cannot exceed 5MB.")
        );

        let exactly_max = ProofUploadForm {
            proof_of_payment: Some(FileUpload::new(
                "scan.pdf",
                None,
                Bytes::from(vec![0_u8; MAX_UPLOAD_BYTES]),
            )),
            order_id: "  ".to_string(),
            customer_name: "Jane".to_string(),
        };
        assert!(exactly_max.validated_file().is_ok());
        assert_eq!(exactly_max.order_id(), None);
        assert_eq!(exactly_max.customer_name(), Some("Jane"));
    }
}

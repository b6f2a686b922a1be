//! Order route handlers.
//!
//! An order copies the customer's username and the product's name and price
//! when it is placed. After that only the status can be edited.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use abc_retailers_core::{Customer, Order, OrderId, OrderStatus, Product, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, OrderForm, OrderInput, OrderStatusForm};
use crate::middleware::{Flash, flash_error, flash_success, take_flash};
use crate::state::AppState;
use crate::storage::{RetailStorage, StorageError};

use super::see_other;

/// Order view for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub customer_id: String,
    pub username: String,
    pub product_id: String,
    pub product_name: String,
    pub order_date: String,
    pub quantity: u32,
    /// Amounts formatted as currency.
    pub unit_price: String,
    pub total_price: String,
    pub status: String,
}

/// Customer entry in the new-order dropdown.
#[derive(Debug, Clone)]
pub struct CustomerOption {
    pub id: String,
    pub label: String,
}

/// Product entry in the new-order dropdown.
#[derive(Debug, Clone)]
pub struct ProductOption {
    pub id: String,
    pub label: String,
    pub price: String,
    pub stock_available: u32,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            customer_id: order.customer_id.to_string(),
            username: order.username.clone(),
            product_id: order.product_id.to_string(),
            product_name: order.product_name.clone(),
            order_date: order.order_date.format("%Y-%m-%d %H:%M").to_string(),
            quantity: order.quantity,
            unit_price: filters::format_money(&order.unit_price.to_string()),
            total_price: filters::format_money(&order.total_price.to_string()),
            status: order.status.to_string(),
        }
    }
}

impl From<&Customer> for CustomerOption {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            label: format!("{} ({})", customer.full_name(), customer.username),
        }
    }
}

impl From<&Product> for ProductOption {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            label: product.name.clone(),
            price: product.price.to_string(),
            stock_available: product.stock_available,
        }
    }
}

/// Status dropdown values, keeping a custom current status selectable.
fn status_options(current: &str) -> Vec<String> {
    let mut options: Vec<String> = OrderStatus::SUGGESTED
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
    let current = current.trim();
    if !current.is_empty() && !options.iter().any(|s| s == current) {
        options.push(current.to_owned());
    }
    options
}

// =============================================================================
// Templates
// =============================================================================

/// Order listing template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub orders: Vec<OrderView>,
}

/// New order form template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/form.html")]
pub struct OrderFormTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub form: OrderForm,
    pub errors: FormErrors,
    pub customers: Vec<CustomerOption>,
    pub products: Vec<ProductOption>,
    pub statuses: Vec<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub order: OrderView,
}

/// Order status form template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/edit.html")]
pub struct OrderEditTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub order: OrderView,
    pub form: OrderStatusForm,
    pub errors: FormErrors,
    pub statuses: Vec<String>,
}

impl OrderEditTemplate {
    fn new(order: &Order, form: OrderStatusForm, errors: FormErrors) -> Self {
        Self {
            current_path: format!("/orders/{}/edit", order.id),
            flash: Flash::default(),
            order: OrderView::from(order),
            statuses: status_options(&form.status),
            form,
            errors,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index).post(create))
        .route("/orders/new", get(new))
        .route("/orders/product-price", get(product_price))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/edit", get(edit).post(update))
        .route("/orders/{id}/delete", post(delete))
}

fn parse_id(id: &str) -> Result<OrderId, AppError> {
    OrderId::parse(id).map_err(|_| AppError::NotFound(format!("Order {id}")))
}

/// Build the new-order form with its dropdowns filled in.
async fn order_form(
    storage: &dyn RetailStorage,
    form: OrderForm,
    errors: FormErrors,
) -> Result<OrderFormTemplate, StorageError> {
    let (customers, products) = tokio::join!(storage.list_customers(), storage.list_products());
    let (customers, products) = (customers?, products?);

    Ok(OrderFormTemplate {
        current_path: "/orders/new".to_string(),
        flash: Flash::default(),
        statuses: status_options(&form.status),
        form,
        errors,
        customers: customers.iter().map(CustomerOption::from).collect(),
        products: products.iter().map(ProductOption::from).collect(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Order listing, newest first.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut flash = take_flash(&session).await;

    let orders = match state.storage().list_orders().await {
        Ok(mut orders) => {
            orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
            orders.iter().map(OrderView::from).collect()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list orders");
            flash.error = Some(format!("Error loading orders: {e}"));
            Vec::new()
        }
    };

    OrdersIndexTemplate {
        current_path: "/orders".to_string(),
        flash,
        orders,
    }
}

/// New order form.
#[instrument(skip(state, session))]
pub async fn new(State(state): State<AppState>, session: Session) -> Response {
    match order_form(state.storage(), OrderForm::default(), FormErrors::new()).await {
        Ok(template) => template.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load order form");
            flash_error(&session, format!("Error loading create form: {e}")).await;
            see_other("/orders")
        }
    }
}

/// Place an order and queue it for processing.
#[instrument(skip(state, session, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OrderForm>,
) -> Result<Response, AppError> {
    let storage = state.storage();

    let errors = match form.validated() {
        Ok(input) => match place_order(storage, input).await {
            Ok(created) => {
                tracing::info!(
                    order_id = %created.id,
                    customer_id = %created.customer_id,
                    product_id = %created.product_id,
                    "Order created"
                );
                flash_success(&session, "Order created successfully!").await;
                return Ok(see_other("/orders"));
            }
            Err(errors) => errors,
        },
        Err(errors) => errors,
    };

    Ok(order_form(storage, form, errors).await?.into_response())
}

/// Snapshot the selected customer and product into a new order and store it.
/// Failures come back as the errors to show on the form.
async fn place_order(storage: &dyn RetailStorage, input: OrderInput) -> Result<Order, FormErrors> {
    let (customer, product) = tokio::join!(
        storage.get_customer(&input.customer_id),
        storage.get_product(&input.product_id),
    );
    let (customer, product) = match (customer, product) {
        (Ok(Some(customer)), Ok(Some(product))) => (customer, product),
        (Ok(_), Ok(_)) => {
            return Err(FormErrors::general("Invalid customer or product selected."));
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Failed to look up order parties");
            return Err(FormErrors::general(format!("Error creating order: {e}")));
        }
    };

    let quantity = input.quantity;
    let order = Order::place(&customer, &product, quantity, input.order_date, input.status)
        .map_err(|e| {
            tracing::warn!(error = %e, quantity, "Order total out of range");
            let mut errors = FormErrors::new();
            errors.add("quantity", "Order total is too large. Reduce the quantity.");
            errors
        })?;

    storage.create_order(&order).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to create order");
        FormErrors::general(format!("Error creating order: {e}"))
    })
}

/// Order detail.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    let order = match state.storage().get_order(&id).await {
        Ok(Some(order)) => order,
        Ok(None) => return Err(AppError::NotFound(format!("Order {id}"))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load order");
            flash_error(&session, format!("Error loading order details: {e}")).await;
            return Ok(see_other("/orders"));
        }
    };

    Ok(OrderShowTemplate {
        current_path: format!("/orders/{id}"),
        flash: take_flash(&session).await,
        order: OrderView::from(&order),
    }
    .into_response())
}

/// Status form.
#[instrument(skip(state, session))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    let order = match state.storage().get_order(&id).await {
        Ok(Some(order)) => order,
        Ok(None) => return Err(AppError::NotFound(format!("Order {id}"))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load order");
            flash_error(&session, format!("Error loading order: {e}")).await;
            return Ok(see_other("/orders"));
        }
    };

    let mut template =
        OrderEditTemplate::new(&order, OrderStatusForm::from(&order), FormErrors::new());
    template.flash = take_flash(&session).await;
    Ok(template.into_response())
}

/// Update the status of an order. Every other field keeps its stored value.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderStatusForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    if !form.matches(&id) {
        return Err(AppError::NotFound(format!("Order {id}")));
    }

    let storage = state.storage();
    let mut order = match storage.get_order(&id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            flash_error(
                &session,
                "Order not found or may have been modified by another user.",
            )
            .await;
            return Ok(see_other("/orders"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load order for update");
            flash_error(&session, format!("Error updating order: {e}")).await;
            return Ok(see_other("/orders"));
        }
    };

    let status = match form.status() {
        Ok(status) => status,
        Err(errors) => return Ok(OrderEditTemplate::new(&order, form, errors).into_response()),
    };
    order.status = status;

    match storage.update_order(&order).await {
        Ok(updated) => {
            tracing::info!(order_id = %id, status = %updated.status, "Order status updated");
            flash_success(&session, "Order status updated successfully!").await;
            Ok(see_other("/orders"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update order");
            let errors = FormErrors::general(format!("Error updating order: {e}"));
            match storage.get_order(&id).await {
                Ok(Some(reloaded)) => {
                    Ok(OrderEditTemplate::new(&reloaded, form, errors).into_response())
                }
                _ => {
                    flash_error(&session, format!("Error updating order: {e}")).await;
                    Ok(see_other("/orders"))
                }
            }
        }
    }
}

/// Delete an order.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    match state.storage().delete_order(&id).await {
        Ok(()) => {
            tracing::info!(order_id = %id, "Order deleted");
            flash_success(&session, "Order deleted successfully!").await;
        }
        Err(StorageError::NotFound(_)) => flash_error(&session, "Order not found.").await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete order");
            flash_error(&session, format!("Error deleting order: {e}")).await;
        }
    }
    Ok(see_other("/orders"))
}

// =============================================================================
// Price lookup
// =============================================================================

/// Query for [`product_price`].
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    #[serde(default)]
    pub product_id: String,
}

/// Response of [`product_price`].
#[derive(Debug, Serialize, PartialEq)]
pub struct PriceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PriceResponse {
    fn found(product: &Product) -> Self {
        Self {
            success: true,
            price: Some(product.price.to_f64()),
            stock: Some(product.stock_available),
            name: Some(product.name.clone()),
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            price: None,
            stock: None,
            name: None,
            message: Some(message.into()),
        }
    }
}

/// Price, stock and name of a product, for the new-order page script.
#[instrument(skip(state))]
pub async fn product_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Json<PriceResponse> {
    let Ok(id) = ProductId::parse(query.product_id.trim()) else {
        return Json(PriceResponse::failed("Product not found"));
    };

    Json(match state.storage().get_product(&id).await {
        Ok(Some(product)) => PriceResponse::found(&product),
        Ok(None) => PriceResponse::failed("Product not found"),
        Err(e) => {
            tracing::warn!(error = %e, "Price lookup failed");
            PriceResponse::failed(e.to_string())
        }
    })
}

//! Customer route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use abc_retailers_core::{Customer, CustomerId};

use crate::error::AppError;
use crate::filters;
use crate::forms::{CustomerForm, FormErrors};
use crate::middleware::{Flash, flash_error, flash_success, take_flash};
use crate::state::AppState;
use crate::storage::StorageError;

use super::see_other;

/// Customer view for templates.
#[derive(Debug, Clone)]
pub struct CustomerView {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub shipping_address: String,
    pub updated_at: Option<String>,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            full_name: customer.full_name(),
            username: customer.username.clone(),
            email: customer.email.to_string(),
            shipping_address: customer.shipping_address.clone(),
            updated_at: customer
                .timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Customer listing template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub customers: Vec<CustomerView>,
}

/// Customer detail template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub customer: CustomerView,
}

/// Customer create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/form.html")]
pub struct CustomerFormTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub form: CustomerForm,
    pub errors: FormErrors,
    pub is_edit: bool,
    pub action: String,
}

impl CustomerFormTemplate {
    fn create(form: CustomerForm, errors: FormErrors) -> Self {
        Self {
            current_path: "/customers/new".to_string(),
            flash: Flash::default(),
            form,
            errors,
            is_edit: false,
            action: "/customers".to_string(),
        }
    }

    fn edit(id: &CustomerId, form: CustomerForm, errors: FormErrors) -> Self {
        Self {
            current_path: format!("/customers/{id}/edit"),
            flash: Flash::default(),
            form,
            errors,
            is_edit: true,
            action: format!("/customers/{id}/edit"),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index).post(create))
        .route("/customers/new", get(new))
        .route("/customers/{id}", get(show))
        .route("/customers/{id}/edit", get(edit).post(update))
        .route("/customers/{id}/delete", post(delete))
}

fn parse_id(id: &str) -> Result<CustomerId, AppError> {
    CustomerId::parse(id).map_err(|_| AppError::NotFound(format!("Customer {id}")))
}

async fn load(state: &AppState, id: &CustomerId) -> Result<Customer, AppError> {
    state
        .storage()
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer {id}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Customer listing.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut flash = take_flash(&session).await;

    let customers = match state.storage().list_customers().await {
        Ok(customers) => customers.iter().map(CustomerView::from).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list customers");
            flash.error = Some(format!("Error loading customers: {e}"));
            Vec::new()
        }
    };

    CustomersIndexTemplate {
        current_path: "/customers".to_string(),
        flash,
        customers,
    }
}

/// New customer form.
pub async fn new() -> impl IntoResponse {
    CustomerFormTemplate::create(CustomerForm::default(), FormErrors::new())
}

/// Create a customer.
#[instrument(skip(state, session, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CustomerForm>,
) -> Response {
    let customer = match form.clone().into_customer() {
        Ok(customer) => customer,
        Err(errors) => return CustomerFormTemplate::create(form, errors).into_response(),
    };

    match state.storage().create_customer(&customer).await {
        Ok(created) => {
            tracing::info!(customer_id = %created.id, "Customer created");
            flash_success(&session, "Customer created successfully!").await;
            see_other("/customers")
        }
        Err(StorageError::AlreadyExists(_)) => {
            let mut errors = FormErrors::new();
            errors.add("customer_id", "A customer with this ID already exists.");
            CustomerFormTemplate::create(form, errors).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create customer");
            let errors = FormErrors::general(format!("Error creating customer: {e}"));
            CustomerFormTemplate::create(form, errors).into_response()
        }
    }
}

/// Customer detail.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let customer = load(&state, &id).await?;

    Ok(CustomerShowTemplate {
        current_path: format!("/customers/{id}"),
        flash: take_flash(&session).await,
        customer: CustomerView::from(&customer),
    }
    .into_response())
}

/// Edit form.
#[instrument(skip(state, session))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let customer = load(&state, &id).await?;

    let mut template =
        CustomerFormTemplate::edit(&id, CustomerForm::from(&customer), FormErrors::new());
    template.flash = take_flash(&session).await;
    Ok(template.into_response())
}

/// Update a customer. The write is rejected if someone else saved the
/// record after the form was rendered.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CustomerForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    // The row key cannot change; the URL decides which record is written.
    let form = CustomerForm {
        customer_id: id.to_string(),
        ..form
    };

    let customer = match form.clone().into_customer() {
        Ok(customer) => customer,
        Err(errors) => return Ok(CustomerFormTemplate::edit(&id, form, errors).into_response()),
    };

    match state.storage().update_customer(&customer).await {
        Ok(_) => {
            tracing::info!(customer_id = %id, "Customer updated");
            flash_success(&session, "Customer updated successfully!").await;
            Ok(see_other("/customers"))
        }
        Err(StorageError::NotFound(_)) => {
            flash_error(&session, "Customer not found.").await;
            Ok(see_other("/customers"))
        }
        Err(StorageError::PreconditionFailed(_)) => {
            tracing::warn!(customer_id = %id, "Customer edit conflict");
            let errors = FormErrors::general(
                "This customer was modified by another user. Reload the page and try again.",
            );
            Ok(CustomerFormTemplate::edit(&id, form, errors).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update customer");
            let errors = FormErrors::general(format!("Error updating customer: {e}"));
            Ok(CustomerFormTemplate::edit(&id, form, errors).into_response())
        }
    }
}

/// Delete a customer. Existing orders keep their copy of the username.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    match state.storage().delete_customer(&id).await {
        Ok(()) => {
            tracing::info!(customer_id = %id, "Customer deleted");
            flash_success(&session, "Customer deleted successfully!").await;
        }
        Err(StorageError::NotFound(_)) => flash_error(&session, "Customer not found.").await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete customer");
            flash_error(&session, format!("Error deleting customer: {e}")).await;
        }
    }
    Ok(see_other("/customers"))
}

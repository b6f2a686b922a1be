//! Product route handlers.
//!
//! Product images live in the blob container; the record only keeps the blob
//! URL. Pages show images through `/products/images/{name}` so the container
//! can stay private.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    body::Body,
    extract::{Multipart, Path, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use abc_retailers_core::{Product, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, ImageRule, ProductForm, ProductInput};
use crate::middleware::{Flash, flash_error, flash_success, take_flash};
use crate::state::AppState;
use crate::storage::StorageError;
use crate::storage::naming::image_name_from_url;

use super::see_other;

/// Product view for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Decimal amount; the template adds the currency.
    pub price: String,
    pub stock_available: u32,
    /// Same-origin path of the image, if the product has one.
    pub image_src: Option<String>,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Same-origin path serving the image referenced by `image_url`.
#[must_use]
pub fn image_src(image_url: Option<&str>) -> Option<String> {
    let name = image_name_from_url(image_url?)?;
    Some(format!("/products/images/{}", urlencoding::encode(&name)))
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock_available: product.stock_available,
            image_src: image_src(product.image_url.as_deref()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub products: Vec<ProductView>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub form: ProductForm,
    pub errors: FormErrors,
    pub is_edit: bool,
    pub action: String,
    pub image_src: Option<String>,
}

impl ProductFormTemplate {
    fn create(form: ProductForm, errors: FormErrors) -> Self {
        Self {
            current_path: "/products/new".to_string(),
            flash: Flash::default(),
            form,
            errors,
            is_edit: false,
            action: "/products".to_string(),
            image_src: None,
        }
    }

    fn edit(
        id: &ProductId,
        form: ProductForm,
        errors: FormErrors,
        image_src: Option<String>,
    ) -> Self {
        Self {
            current_path: format!("/products/{id}/edit"),
            flash: Flash::default(),
            form,
            errors,
            is_edit: true,
            action: format!("/products/{id}/edit"),
            image_src,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new))
        .route("/products/images/{name}", get(image))
        .route("/products/{id}/edit", get(edit).post(update))
        .route("/products/{id}/delete", post(delete))
}

fn parse_id(id: &str) -> Result<ProductId, AppError> {
    ProductId::parse(id).map_err(|_| AppError::NotFound(format!("Product {id}")))
}

/// Delete an image that is no longer referenced. Failures are only logged.
async fn discard_image(state: &AppState, image_url: Option<&str>) {
    let Some(name) = image_url.and_then(image_name_from_url) else {
        return;
    };
    if let Err(e) = state.storage().delete_product_image(&name).await {
        tracing::warn!(error = %e, image = %name, "Failed to delete product image");
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product listing.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut flash = take_flash(&session).await;

    let products = match state.storage().list_products().await {
        Ok(products) => products.iter().map(ProductView::from).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list products");
            flash.error = Some(format!("Error loading products: {e}"));
            Vec::new()
        }
    };

    ProductsIndexTemplate {
        current_path: "/products".to_string(),
        flash,
        products,
    }
}

/// New product form.
pub async fn new() -> impl IntoResponse {
    ProductFormTemplate::create(ProductForm::default(), FormErrors::new())
}

/// Create a product: upload the image, then insert the record.
#[instrument(skip(state, session, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = ProductForm::from_multipart(multipart)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let input = match form.validated(ImageRule::Required) {
        Ok(input) => input,
        Err(errors) => return Ok(ProductFormTemplate::create(form, errors).into_response()),
    };

    match insert_product(&state, input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            flash_success(&session, "Product created successfully!").await;
            Ok(see_other("/products"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create product");
            let message = match e {
                StorageError::AlreadyExists(_) => {
                    "A product with this ID already exists.".to_string()
                }
                e => format!("Error creating product: {e}"),
            };
            Ok(ProductFormTemplate::create(form, FormErrors::general(message)).into_response())
        }
    }
}

async fn insert_product(state: &AppState, input: ProductInput) -> Result<Product, StorageError> {
    let storage = state.storage();
    // Checked up front so a duplicate never leaves an uploaded image behind.
    if storage.get_product(&input.id).await?.is_some() {
        return Err(StorageError::AlreadyExists(input.id.to_string()));
    }
    let image_url = match &input.image {
        Some(image) => Some(storage.upload_product_image(image, &input.id).await?),
        None => None,
    };

    let product = Product {
        id: input.id,
        name: input.name,
        description: input.description,
        price: input.price,
        stock_available: input.stock_available,
        image_url,
        etag: None,
        timestamp: None,
    };

    match storage.create_product(&product).await {
        Ok(created) => Ok(created),
        Err(e) => {
            discard_image(state, product.image_url.as_deref()).await;
            Err(e)
        }
    }
}

/// Edit form.
#[instrument(skip(state, session))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let product = state
        .storage()
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    let mut template = ProductFormTemplate::edit(
        &id,
        ProductForm::from(&product),
        FormErrors::new(),
        image_src(product.image_url.as_deref()),
    );
    template.flash = take_flash(&session).await;
    Ok(template.into_response())
}

/// Update a product. A new image replaces the old one, which is deleted once
/// the record points at the new image.
#[instrument(skip(state, session, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let mut form = ProductForm::from_multipart(multipart)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    id.as_str().clone_into(&mut form.product_id);

    let storage = state.storage();
    let mut product = match storage.get_product(&id).await {
        Ok(Some(product)) => product,
        Ok(None) => return Err(AppError::NotFound(format!("Product {id}"))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load product for update");
            let errors = FormErrors::general(format!("Error updating product: {e}"));
            return Ok(ProductFormTemplate::edit(&id, form, errors, None).into_response());
        }
    };
    let current_src = image_src(product.image_url.as_deref());

    let input = match form.validated(ImageRule::Optional) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(ProductFormTemplate::edit(&id, form, errors, current_src).into_response());
        }
    };

    product.name = input.name;
    product.description = input.description;
    product.price = input.price;
    product.stock_available = input.stock_available;

    let old_image_url = product.image_url.clone();
    let new_image_url = match &input.image {
        Some(image) => match storage.upload_product_image(image, &id).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(error = %e, "Failed to upload product image");
                let errors = FormErrors::general(format!("Error updating product: {e}"));
                return Ok(
                    ProductFormTemplate::edit(&id, form, errors, current_src).into_response()
                );
            }
        },
        None => None,
    };
    if new_image_url.is_some() {
        product.image_url.clone_from(&new_image_url);
    }

    match storage.update_product(&product).await {
        Ok(_) => {
            if new_image_url.is_some() && new_image_url != old_image_url {
                discard_image(&state, old_image_url.as_deref()).await;
            }
            tracing::info!(product_id = %id, "Product updated");
            flash_success(&session, "Product updated successfully!").await;
            Ok(see_other("/products"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update product");
            if new_image_url != old_image_url {
                discard_image(&state, new_image_url.as_deref()).await;
            }
            let message = match e {
                StorageError::PreconditionFailed(_) => {
                    "This product was modified by another user. Reload the page and try again."
                        .to_string()
                }
                e => format!("Error updating product: {e}"),
            };
            Ok(
                ProductFormTemplate::edit(&id, form, FormErrors::general(message), current_src)
                    .into_response(),
            )
        }
    }
}

/// Delete a product. The image is removed first on a best-effort basis.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    match remove_product(&state, &id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            flash_success(&session, "Product deleted successfully!").await;
        }
        Err(StorageError::NotFound(_)) => flash_error(&session, "Product not found.").await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete product");
            flash_error(&session, format!("Error deleting product: {e}")).await;
        }
    }
    Ok(see_other("/products"))
}

async fn remove_product(state: &AppState, id: &ProductId) -> Result<(), StorageError> {
    let storage = state.storage();
    if let Some(product) = storage.get_product(id).await? {
        discard_image(state, product.image_url.as_deref()).await;
    }
    storage.delete_product(id).await
}

/// Serve a product image from the blob container.
#[instrument(skip(state))]
pub async fn image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let file = state
        .storage()
        .get_product_image(&name)
        .await?
        .ok_or_else(|| AppError::NotFound("Image".to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, file.content_type),
            (CACHE_CONTROL, "private, max-age=300".to_string()),
        ],
        Body::from(file.bytes),
    )
        .into_response())
}

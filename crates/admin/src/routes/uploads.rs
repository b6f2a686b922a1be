//! Payment proof upload, download and delete.
//!
//! Proofs live in the root of the file share under generated names, so the
//! listing is just the names in that directory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    body::Body,
    extract::{Multipart, Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use abc_retailers_core::entities::upload::extension_of;

use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, ProofUploadForm};
use crate::middleware::{Flash, flash_error, flash_success, take_flash};
use crate::state::AppState;
use crate::storage::naming::content_type_for;

use super::see_other;

/// Stored proof as shown in the listing.
#[derive(Debug, Clone)]
pub struct ProofView {
    pub name: String,
    /// Upper-case extension without the dot, e.g. `PDF`.
    pub kind: String,
    /// Percent-encoded name for download links.
    pub encoded_name: String,
}

impl ProofView {
    fn new(name: String) -> Self {
        let kind = extension_of(&name).trim_start_matches('.').to_ascii_uppercase();
        let encoded_name = urlencoding::encode(&name).into_owned();
        Self {
            name,
            kind,
            encoded_name,
        }
    }
}

/// Upload page with the stored proofs.
#[derive(Template, WebTemplate)]
#[template(path = "uploads/index.html")]
pub struct UploadsTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub files: Vec<ProofView>,
    pub order_id: String,
    pub customer_name: String,
    pub errors: FormErrors,
}

/// Body of the delete form.
#[derive(Debug, Deserialize)]
pub struct DeleteProofForm {
    #[serde(default)]
    pub file_name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/uploads", get(index).post(upload))
        .route("/uploads/download/{file_name}", get(download))
        .route("/uploads/delete", post(delete))
}

/// Stored proofs, or an empty list plus the flash message on failure.
async fn list_files(state: &AppState, flash: &mut Flash) -> Vec<ProofView> {
    match state.storage().list_payment_proofs().await {
        Ok(names) => names.into_iter().map(ProofView::new).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list payment proofs");
            flash.error = Some("Error loading payment proof files.".to_string());
            Vec::new()
        }
    }
}

async fn render(
    state: &AppState,
    mut flash: Flash,
    form: &ProofUploadForm,
    errors: FormErrors,
) -> UploadsTemplate {
    let files = list_files(state, &mut flash).await;
    UploadsTemplate {
        current_path: "/uploads".to_string(),
        flash,
        files,
        order_id: form.order_id.clone(),
        customer_name: form.customer_name.clone(),
        errors,
    }
}

/// `attachment` disposition that survives non-ASCII names.
fn attachment(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let value = format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

// =============================================================================
// Handlers
// =============================================================================

/// Upload form and proof listing.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let flash = take_flash(&session).await;
    render(&state, flash, &ProofUploadForm::default(), FormErrors::new()).await
}

/// Store a payment proof under a generated name.
#[instrument(skip(state, session, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = ProofUploadForm::from_multipart(multipart)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let file = match form.validated_file() {
        Ok(file) => file,
        Err(errors) => {
            return Ok(render(&state, Flash::default(), &form, errors)
                .await
                .into_response());
        }
    };

    match state
        .storage()
        .upload_payment_proof(file, form.order_id(), form.customer_name())
        .await
    {
        Ok(name) => {
            tracing::info!(file_name = %name, size = file.len(), "Payment proof uploaded");
            flash_success(
                &session,
                format!("Payment proof uploaded successfully as '{name}'."),
            )
            .await;
            Ok(see_other("/uploads"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to upload payment proof");
            let errors = FormErrors::general(format!("Error uploading file: {e}"));
            Ok(render(&state, Flash::default(), &form, errors)
                .await
                .into_response())
        }
    }
}

/// Send a stored proof as an attachment.
#[instrument(skip(state, session))]
pub async fn download(
    State(state): State<AppState>,
    session: Session,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    if file_name.trim().is_empty() {
        return Err(AppError::NotFound("File".to_string()));
    }

    match state.storage().download_payment_proof(&file_name).await {
        Ok(Some(file)) => Ok((
            StatusCode::OK,
            [
                (
                    CONTENT_TYPE,
                    HeaderValue::from_static(content_type_for(&file_name)),
                ),
                (CONTENT_DISPOSITION, attachment(&file_name)),
            ],
            Body::from(file.bytes),
        )
            .into_response()),
        Ok(None) => Err(AppError::NotFound(format!("File {file_name}"))),
        Err(e) => {
            tracing::error!(error = %e, file_name = %file_name, "Failed to download payment proof");
            flash_error(&session, "Error downloading file.").await;
            Ok(see_other("/uploads"))
        }
    }
}

/// Delete a stored proof.
#[instrument(skip(state, session, form))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DeleteProofForm>,
) -> Result<Response, AppError> {
    let file_name = form.file_name.trim();
    if file_name.is_empty() {
        return Err(AppError::NotFound("File".to_string()));
    }

    match state.storage().delete_payment_proof(file_name).await {
        Ok(()) => {
            tracing::info!(file_name = %file_name, "Payment proof deleted");
            flash_success(&session, "Payment proof deleted successfully.").await;
        }
        Err(e) => {
            tracing::error!(error = %e, file_name = %file_name, "Failed to delete payment proof");
            flash_error(&session, "Error deleting file.").await;
        }
    }
    Ok(see_other("/uploads"))
}

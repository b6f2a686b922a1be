//! Dashboard and privacy pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{Flash, take_flash};
use crate::state::AppState;

use super::products::ProductView;

/// Products shown on the dashboard.
const FEATURED_PRODUCTS: usize = 5;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "home/index.html")]
pub struct HomeTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub featured_products: Vec<ProductView>,
    pub customer_count: usize,
    pub product_count: usize,
    pub order_count: usize,
}

/// Privacy page template.
#[derive(Template, WebTemplate)]
#[template(path = "home/privacy.html")]
pub struct PrivacyTemplate {
    pub current_path: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/privacy", get(privacy))
}

/// Dashboard with record counts and the first few products.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut flash = take_flash(&session).await;
    let storage = state.storage();

    let (products, customers, orders) = tokio::join!(
        storage.list_products(),
        storage.list_customers(),
        storage.list_orders(),
    );

    let (products, customers, orders) = match (products, customers, orders) {
        (Ok(products), Ok(customers), Ok(orders)) => (products, customers.len(), orders.len()),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            tracing::error!(error = %e, "Failed to load dashboard");
            flash.error = Some(format!("Error loading dashboard: {e}"));
            (Vec::new(), 0, 0)
        }
    };

    HomeTemplate {
        current_path: "/".to_string(),
        flash,
        product_count: products.len(),
        featured_products: products
            .iter()
            .take(FEATURED_PRODUCTS)
            .map(ProductView::from)
            .collect(),
        customer_count: customers,
        order_count: orders,
    }
}

/// Static privacy page.
pub async fn privacy() -> impl IntoResponse {
    PrivacyTemplate {
        current_path: "/privacy".to_string(),
    }
}

//! Static content routes.
//!
//! GET /api/services     - Service catalog with turnaround ranges
//! GET /api/testimonials - Customer testimonials loaded at startup

use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::catalog::services_catalog;
use crate::models::{ServiceCatalogEntry, Testimonial};
use crate::state::AppState;

/// Build the catalog router.
pub fn router() -> Router {
    Router::new()
        .route("/api/services", get(list_services))
        .route("/api/testimonials", get(list_testimonials))
}

async fn list_services() -> Json<Vec<ServiceCatalogEntry>> {
    Json(services_catalog())
}

async fn list_testimonials(Extension(state): Extension<AppState>) -> Json<Vec<Testimonial>> {
    Json(state.testimonials.as_ref().clone())
}

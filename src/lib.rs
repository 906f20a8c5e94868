//! # Tailoring Enquiry Intake
//!
//! Enquiry intake for a tailoring service. The server side validates and
//! records submitted enquiries; the client side (`intake`) owns the form
//! draft, its persistence and submission.
//!
//! The router is exposed here so integration tests can drive an in-process
//! server without a listening socket.

pub mod catalog;
pub mod config;
pub mod details;
pub mod error;
pub mod estimator;
pub mod ingest;
pub mod intake;
pub mod models;
pub mod routes;
pub mod state;
pub mod validation;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all route modules and middleware.
///
/// The caller is responsible for wiring the sink and content feeds into
/// `state`. This function does NOT bind a listener.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(routes::enquiry::router())
        .merge(routes::catalog::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

//! # Tailoring Enquiry Service
//!
//! Serves the enquiry intake endpoint and the read-only content feeds.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and the request/response lifecycle
//! - Accepted enquiries are appended to a Google Sheet when credentials are set
//! - Without credentials the service still accepts enquiries and logs them

use tracing::info;

use tailor_enquiry::config::AppConfig;
use tailor_enquiry::create_app;
use tailor_enquiry::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tailor_enquiry=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting tailoring enquiry service");

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config)?;
    info!(
        sink = state.sink.as_ref().map(|sink| sink.name()).unwrap_or("none"),
        testimonials = state.testimonials.len(),
        "Application state ready"
    );

    let app = create_app(state);

    // Bind and serve
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

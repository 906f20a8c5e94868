//! Shared application state handed to route handlers.
//!
//! Built once in `main` and injected with `Extension`, so handlers pull it
//! out the same way:
//! ```ignore
//! async fn my_handler(Extension(state): Extension<AppState>) -> impl IntoResponse {
//!     // state.sink, state.testimonials, ...
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::catalog::load_testimonials;
use crate::config::{AppConfig, SinkConfig};
use crate::ingest::sink::{RowSink, SheetsSink, SinkError};
use crate::models::Testimonial;

#[derive(Clone)]
pub struct AppState {
    /// `None` when credentials are missing; enquiries are then logged only.
    pub sink: Option<Arc<dyn RowSink>>,
    pub testimonials: Arc<Vec<Testimonial>>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(sink: Option<Arc<dyn RowSink>>, testimonials: Vec<Testimonial>, max_body_bytes: usize) -> Self {
        Self {
            sink,
            testimonials: Arc::new(testimonials),
            max_body_bytes,
        }
    }

    /// Wire the production sink and content feeds from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, SinkError> {
        let sink: Option<Arc<dyn RowSink>> = match &config.sink {
            SinkConfig::Configured(sheets) => {
                info!("Row sink enabled for spreadsheet {}", sheets.spreadsheet_id);
                Some(Arc::new(SheetsSink::new(sheets.clone())?))
            }
            SinkConfig::Unconfigured { .. } => None,
        };
        let testimonials = load_testimonials(&config.testimonials_path);
        Ok(Self::new(sink, testimonials, config.max_body_bytes))
    }
}

//! HTTP error boundary.
//!
//! Validation failures go back to the caller verbatim. Everything else is
//! logged in full and answered with a generic message plus the request's
//! correlation id.

use std::future::Future;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::ingest::payload::PayloadError;
use crate::ingest::sink::SinkError;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// A fresh correlation id, e.g. `req_3f2c9a1b7d4e`.
pub fn new_request_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("req_{}", &id[..12])
}

/// Run `fut` with `request_id` available to [`current_request_id`].
pub async fn with_request_id<Fut, T>(request_id: String, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    REQUEST_ID.scope(request_id, fut).await
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("could not parse request: {0}")]
    Payload(#[from] PayloadError),
    #[error("sink append failed: {0}")]
    Sink(#[from] SinkError),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    detail: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Payload(_) | ApiError::Sink(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Sink(_) => "sink-append",
            ApiError::Payload(_) | ApiError::Internal(_) => "unhandled",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(message) => message.clone(),
            ApiError::Sink(_) => "Could not record your enquiry, please try again".to_string(),
            ApiError::Payload(_) | ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = current_request_id();

        if status.is_server_error() {
            error!(
                status = %status,
                request_id = request_id.as_deref().unwrap_or(""),
                error = %self,
                "enquiry request failed"
            );
        } else {
            warn!(
                status = %status,
                request_id = request_id.as_deref().unwrap_or(""),
                error = %self,
                "enquiry rejected"
            );
        }

        let body = ErrorResponse {
            error: self.public_message(),
            detail: self.detail(),
            request_id: if status.is_server_error() { request_id } else { None },
        };
        (status, Json(body)).into_response()
    }
}

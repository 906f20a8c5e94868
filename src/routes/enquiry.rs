//! Enquiry intake routes.
//!
//! POST /api/enquiry - Accept an enquiry (JSON or multipart) and record it
//! GET  /api/enquiry - Liveness probe

use std::time::Instant;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::Utc;
use tracing::{debug, info};

use crate::error::{new_request_id, with_request_id, ApiError};
use crate::ingest::payload::{normalize, parse_json, read_multipart, BodyEncoding, PayloadError, RawSubmission};
use crate::ingest::{accepted, forward, validate, SinkOutcome};
use crate::models::{EnquiryAccepted, Liveness};
use crate::state::AppState;

/// Build the enquiry router.
pub fn router() -> Router {
    Router::new().route("/api/enquiry", post(submit_enquiry).get(liveness))
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        ok: true,
        message: "enquiry API up",
    })
}

/// Accept one enquiry.
///
/// 1. Parse the body according to its content type
/// 2. Normalize it into a typed enquiry
/// 3. Validate (first failing rule answers 400)
/// 4. Append a row to the sink, if configured
/// 5. Answer with the enquiry id and delivery estimate
async fn submit_enquiry(Extension(state): Extension<AppState>, req: Request) -> Response {
    let request_id = new_request_id();
    with_request_id(request_id.clone(), async move {
        match process(state, req, &request_id).await {
            Ok(body) => Json(body).into_response(),
            Err(e) => e.into_response(),
        }
    })
    .await
}

async fn process(state: AppState, req: Request, request_id: &str) -> Result<EnquiryAccepted, ApiError> {
    let started = Instant::now();
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    info!(request_id, content_type = %content_type, "PARSE start");

    let encoding = BodyEncoding::detect(&content_type)?;
    let raw = read_body(req, encoding, state.max_body_bytes).await?;
    debug!(
        request_id,
        fields = raw.fields.len(),
        files = raw.files.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "PARSE done"
    );

    let submitted = normalize(raw, encoding);
    debug!(
        request_id,
        service = ?submitted.enquiry.service_type,
        photos = submitted.enquiry.reference_photos.len(),
        "NORMALISE done"
    );

    validate(&submitted).map_err(|e| {
        info!(request_id, field = %e.field.path(), "VALIDATE rejected: {}", e.message);
        ApiError::Validation(e.message)
    })?;
    info!(request_id, "VALIDATE ok");

    let now = Utc::now();
    let outcome = forward(state.sink.as_deref(), &submitted, now).await?;
    info!(
        request_id,
        appended = outcome == SinkOutcome::Appended,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "SINK done"
    );

    let body = accepted(&submitted, request_id, now);
    info!(
        request_id,
        enquiry_id = %body.enquiry_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "DONE"
    );
    Ok(body)
}

async fn read_body(req: Request, encoding: BodyEncoding, limit: usize) -> Result<RawSubmission, PayloadError> {
    match encoding {
        BodyEncoding::Json => {
            let bytes = axum::body::to_bytes(req.into_body(), limit)
                .await
                .map_err(|e| PayloadError::Body(e.to_string()))?;
            parse_json(&bytes)
        }
        BodyEncoding::Multipart => {
            let multipart = Multipart::from_request(req, &())
                .await
                .map_err(|e| PayloadError::Multipart(e.body_text()))?;
            read_multipart(multipart).await
        }
    }
}

//! Request body parsing and normalization.
//!
//! A submission arrives either as a JSON object or as multipart form data
//! whose reference photos are parts named `referencePhoto_<n>`. Both are
//! reduced to the same field map and then normalized into an [`Enquiry`].

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::details::ServiceDetails;
use crate::models::{parse_label, Attachment, Enquiry, ServiceType};

/// Name prefix of the file parts that carry reference photos.
pub const PHOTO_FIELD_PREFIX: &str = "referencePhoto_";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("JSON body is not an object")]
    NotAnObject,
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

/// The two accepted body encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Multipart,
}

impl BodyEncoding {
    /// Pick the encoding from a declared content type.
    pub fn detect(content_type: &str) -> Result<Self, PayloadError> {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("application/json") {
            Ok(BodyEncoding::Json)
        } else if lowered.contains("multipart/form-data") {
            Ok(BodyEncoding::Multipart)
        } else {
            Err(PayloadError::UnsupportedContentType(content_type.to_string()))
        }
    }
}

/// A parsed but not yet normalized body.
#[derive(Debug, Default)]
pub struct RawSubmission {
    pub fields: Map<String, Value>,
    pub files: Vec<Attachment>,
}

/// A normalized submission, ready for validation.
#[derive(Debug, Clone)]
pub struct SubmittedEnquiry {
    pub enquiry: Enquiry,
    pub encoding: BodyEncoding,
}

pub fn parse_json(body: &[u8]) -> Result<RawSubmission, PayloadError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(RawSubmission {
            fields,
            files: Vec::new(),
        }),
        _ => Err(PayloadError::NotAnObject),
    }
}

/// Drain a multipart body into text fields and positionally ordered photos.
pub async fn read_multipart(mut multipart: Multipart) -> Result<RawSubmission, PayloadError> {
    let mut fields = Map::new();
    let mut photos: Vec<(usize, Attachment)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PayloadError::Multipart(e.body_text()))?
    {
        let name = field.name().map(str::to_string).unwrap_or_default();
        let file_name = field.file_name().map(str::to_string);

        // Unnumbered photo parts sort after the numbered ones.
        let position = name
            .strip_prefix(PHOTO_FIELD_PREFIX)
            .map(|suffix| suffix.parse::<usize>().unwrap_or(usize::MAX));

        if let (Some(position), Some(file_name)) = (position, file_name) {
            let content_type = field.content_type().map(str::to_string).unwrap_or_default();
            let data = field
                .bytes()
                .await
                .map_err(|e| PayloadError::Multipart(e.body_text()))?;
            debug!("Received photo {} ({} bytes, {})", file_name, data.len(), content_type);
            photos.push((position, Attachment::new(file_name, content_type, data)));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| PayloadError::Multipart(e.body_text()))?;
            fields.insert(name, Value::String(text));
        }
    }

    photos.sort_by_key(|(position, _)| *position);
    Ok(RawSubmission {
        fields,
        files: photos.into_iter().map(|(_, photo)| photo).collect(),
    })
}

// ============================================================================
// Normalization
// ============================================================================

/// First present, non-null value among `keys`, coerced to text.
fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

fn label_field<T: DeserializeOwned>(fields: &Map<String, Value>, keys: &[&str]) -> Option<T> {
    parse_label(&text_field(fields, keys))
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn date_field(fields: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let raw = text_field(fields, &[key]);
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()))
}

/// Coerce a raw submission into a typed enquiry.
///
/// Missing text fields become empty strings and unknown labels become absent
/// values, so every problem surfaces later as a validation message rather
/// than a parse failure.
pub fn normalize(raw: RawSubmission, encoding: BodyEncoding) -> SubmittedEnquiry {
    let fields = &raw.fields;
    let service_type = label_field::<ServiceType>(fields, &["serviceType"]);
    let service_details =
        service_type.and_then(|service| ServiceDetails::decode(fields.get("serviceDetails"), service));

    let enquiry = Enquiry {
        full_name: text_field(fields, &["fullName", "name"]),
        phone: text_field(fields, &["phone"]),
        whatsapp_same: bool_field(fields, "whatsappSame").unwrap_or(true),
        email: text_field(fields, &["email"]),
        city_area: text_field(fields, &["cityArea"]),
        service_type,
        service_details,
        pickup_method: label_field(fields, &["pickupMethod"]),
        pickup_address: text_field(fields, &["pickupAddress"]),
        preferred_window: label_field(fields, &["preferredWindow", "timeWindow"]),
        urgency: label_field(fields, &["urgency"]),
        pickup_date: date_field(fields, "pickupDate"),
        event_date: date_field(fields, "eventDate"),
        reference_photos: raw.files,
        notes: text_field(fields, &["notes"]),
    };

    SubmittedEnquiry { enquiry, encoding }
}

//! Enquiry ingestion: parse, normalize, validate, forward.
//!
//! The HTTP route in `routes::enquiry` drives these steps; nothing here keeps
//! state between requests.

pub mod payload;
pub mod sink;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::estimator::{estimate, pickup_instant};
use crate::models::{EnquiryAccepted, EnquiryRow, ServiceType, Urgency};
use crate::validation::{validate_submission, FieldError};

use self::payload::SubmittedEnquiry;
use self::sink::{RowSink, SinkError};

pub const ACCEPTED_MESSAGE: &str = "Enquiry submitted successfully";
pub const RESPONSE_EXPECTATION: &str = "We'll contact you within 24 hours to confirm details";

/// What happened to an accepted enquiry's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Appended,
    /// No sink is configured; the enquiry lives only in the logs.
    Skipped,
}

/// Server-side validation of a normalized submission.
pub fn validate(submitted: &SubmittedEnquiry) -> Result<(), FieldError> {
    validate_submission(&submitted.enquiry)
}

/// Append the enquiry to the sink when one is configured.
pub async fn forward(
    sink: Option<&dyn RowSink>,
    submitted: &SubmittedEnquiry,
    submitted_at: DateTime<Utc>,
) -> Result<SinkOutcome, SinkError> {
    let enquiry = &submitted.enquiry;
    let row = EnquiryRow::from_enquiry(enquiry, submitted_at);

    match sink {
        Some(sink) => {
            info!(sink = sink.name(), "Appending enquiry row");
            sink.append(&row).await?;
            Ok(SinkOutcome::Appended)
        }
        None => {
            warn!(
                name = %row.name,
                phone = %row.phone,
                email = %row.email,
                city_area = %row.city_area,
                service = %row.service_type,
                pickup_method = %row.pickup_method,
                pickup_address = %row.pickup_address,
                pickup_date = %row.pickup_date,
                time_window = %row.time_window,
                urgency = %row.urgency,
                details = %row.service_details,
                photos = %row.attachments,
                notes = %row.notes,
                "Row sink not configured, enquiry recorded in logs only"
            );
            Ok(SinkOutcome::Skipped)
        }
    }
}

/// `ENQ-<millis>-<6 hex>`; the random suffix separates enquiries accepted
/// in the same millisecond.
fn new_enquiry_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ENQ-{}-{}", now.timestamp_millis(), &suffix[..6])
}

/// Build the success response for an accepted enquiry.
pub fn accepted(submitted: &SubmittedEnquiry, request_id: &str, now: DateTime<Utc>) -> EnquiryAccepted {
    let enquiry = &submitted.enquiry;
    let urgency = enquiry.urgency.unwrap_or(Urgency::Regular);
    let pickup = pickup_instant(enquiry.pickup_date, now);

    EnquiryAccepted {
        message: ACCEPTED_MESSAGE.to_string(),
        enquiry_id: new_enquiry_id(now),
        service: enquiry.service_type.map(ServiceType::label).unwrap_or_default().to_string(),
        pickup_date: enquiry.pickup_date,
        urgency: urgency.label().to_string(),
        estimated_response: RESPONSE_EXPECTATION.to_string(),
        estimated_delivery: estimate(enquiry.service_type, urgency, pickup),
        request_id: request_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::payload::BodyEncoding;
    use crate::models::Enquiry;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        rows: Mutex<Vec<EnquiryRow>>,
        fail: bool,
    }

    #[async_trait]
    impl RowSink for RecordingSink {
        async fn append(&self, row: &EnquiryRow) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::AppendRejected {
                    status: 403,
                    body: "PERMISSION_DENIED".into(),
                });
            }
            self.rows.lock().unwrap().push(row.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn submitted() -> SubmittedEnquiry {
        SubmittedEnquiry {
            enquiry: Enquiry {
                full_name: "Anil".into(),
                service_type: Some(ServiceType::Alteration),
                urgency: Some(Urgency::Regular),
                pickup_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                ..Default::default()
            },
            encoding: BodyEncoding::Json,
        }
    }

    #[tokio::test]
    async fn configured_sink_receives_the_row() {
        let sink = RecordingSink::default();
        let outcome = forward(Some(&sink as &dyn RowSink), &submitted(), Utc::now()).await.unwrap();
        assert_eq!(outcome, SinkOutcome::Appended);
        assert_eq!(sink.rows.lock().unwrap()[0].name, "Anil");
    }

    #[tokio::test]
    async fn missing_sink_is_skipped_not_failed() {
        let outcome = forward(None, &submitted(), Utc::now()).await.unwrap();
        assert_eq!(outcome, SinkOutcome::Skipped);
    }

    #[tokio::test]
    async fn sink_failure_propagates() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        assert!(forward(Some(&sink as &dyn RowSink), &submitted(), Utc::now()).await.is_err());
    }

    #[test]
    fn accepted_response_echoes_and_estimates() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 8, 0, 0).unwrap();
        let body = accepted(&submitted(), "req_abc", now);
        let prefix = format!("ENQ-{}-", now.timestamp_millis());
        assert!(body.enquiry_id.starts_with(&prefix), "{}", body.enquiry_id);
        assert_eq!(body.enquiry_id.len(), prefix.len() + 6);
        assert_ne!(accepted(&submitted(), "req_abd", now).enquiry_id, body.enquiry_id);
        assert_eq!(body.service, "Alteration");
        assert_eq!(body.pickup_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(body.estimated_delivery, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(body.request_id, "req_abc");
    }
}

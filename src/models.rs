//! Domain models for the enquiry intake pipeline.
//!
//! The same typed [`Enquiry`] record is edited by the form controller on the
//! client and rebuilt by the ingestion service from a submitted payload, so
//! both sides validate exactly the same shape.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::details::ServiceDetails;

/// Parse a wire label into one of the closed enumerations below.
///
/// Labels and aliases are declared once on the serde attributes, so the form,
/// the persisted draft and the ingestion service all agree on the spelling.
pub fn parse_label<T: DeserializeOwned>(label: &str) -> Option<T> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_value(serde_json::Value::String(trimmed.to_string())).ok()
}

// ============================================================================
// Enumerations
// ============================================================================

/// The tailoring services an enquiry can be raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "Custom Stitching", alias = "CustomStitching")]
    CustomStitching,
    #[serde(rename = "Embroidery")]
    Embroidery,
    #[serde(rename = "Alteration")]
    Alteration,
    #[serde(rename = "Repair & Patching", alias = "RepairAndPatching")]
    RepairAndPatching,
    #[serde(rename = "Saree Fall & Edging", alias = "SareeFallAndEdging")]
    SareeFallAndEdging,
    #[serde(rename = "Blouse Design", alias = "BlouseDesign")]
    BlouseDesign,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        ServiceType::CustomStitching,
        ServiceType::Embroidery,
        ServiceType::Alteration,
        ServiceType::RepairAndPatching,
        ServiceType::SareeFallAndEdging,
        ServiceType::BlouseDesign,
    ];

    /// Human label, also the wire value.
    pub fn label(self) -> &'static str {
        match self {
            ServiceType::CustomStitching => "Custom Stitching",
            ServiceType::Embroidery => "Embroidery",
            ServiceType::Alteration => "Alteration",
            ServiceType::RepairAndPatching => "Repair & Patching",
            ServiceType::SareeFallAndEdging => "Saree Fall & Edging",
            ServiceType::BlouseDesign => "Blouse Design",
        }
    }

    /// Key of this service's block inside the `serviceDetails` object.
    pub fn detail_key(self) -> &'static str {
        match self {
            ServiceType::CustomStitching => "customStitching",
            ServiceType::Embroidery => "embroidery",
            ServiceType::Alteration => "alteration",
            ServiceType::RepairAndPatching => "repair",
            ServiceType::SareeFallAndEdging => "saree",
            ServiceType::BlouseDesign => "blouse",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ServiceType::CustomStitching => "custom-stitching",
            ServiceType::Embroidery => "embroidery",
            ServiceType::Alteration => "alteration",
            ServiceType::RepairAndPatching => "repair-and-patching",
            ServiceType::SareeFallAndEdging => "saree-fall-and-edging",
            ServiceType::BlouseDesign => "blouse-design",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How the garment reaches the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupMethod {
    #[serde(rename = "Pickup from home", alias = "PickupFromHome", alias = "pickup-from-home")]
    PickupFromHome,
    #[serde(rename = "Drop-off", alias = "DropOff", alias = "drop-off")]
    DropOff,
    #[serde(rename = "Both", alias = "both")]
    Both,
}

impl PickupMethod {
    pub fn label(self) -> &'static str {
        match self {
            PickupMethod::PickupFromHome => "Pickup from home",
            PickupMethod::DropOff => "Drop-off",
            PickupMethod::Both => "Both",
        }
    }

    /// Whether a rider has to visit the customer's address.
    pub fn requires_address(self) -> bool {
        matches!(self, PickupMethod::PickupFromHome | PickupMethod::Both)
    }
}

/// Preferred pickup time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "Morning (8–11)", alias = "Morning", alias = "morning")]
    Morning,
    #[serde(rename = "Afternoon (12–4)", alias = "Afternoon", alias = "afternoon")]
    Afternoon,
    #[serde(rename = "Evening (5–8)", alias = "Evening", alias = "evening")]
    Evening,
}

impl TimeWindow {
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Morning => "Morning (8–11)",
            TimeWindow::Afternoon => "Afternoon (12–4)",
            TimeWindow::Evening => "Evening (5–8)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(alias = "regular")]
    Regular,
    #[serde(alias = "express")]
    Express,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Regular => "Regular",
            Urgency::Express => "Express",
        }
    }
}

// ============================================================================
// Attachments
// ============================================================================

pub const MAX_ATTACHMENTS: usize = 3;
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// A reference photo attached to an enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn has_allowed_type(&self) -> bool {
        ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str())
    }

    pub fn within_size_limit(&self) -> bool {
        self.size() <= MAX_ATTACHMENT_BYTES
    }

    /// Passes both the type and the size check.
    pub fn is_acceptable(&self) -> bool {
        self.has_allowed_type() && self.within_size_limit()
    }
}

// ============================================================================
// Enquiry record
// ============================================================================

/// A service enquiry: the client's working draft and, after normalization,
/// what the ingestion service validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enquiry {
    // Contact
    pub full_name: String,
    pub phone: String,
    pub whatsapp_same: bool,
    pub email: String,
    pub city_area: String,

    // Service
    pub service_type: Option<ServiceType>,
    pub service_details: Option<ServiceDetails>,

    // Pickup & timing
    pub pickup_method: Option<PickupMethod>,
    pub pickup_address: String,
    pub preferred_window: Option<TimeWindow>,
    pub urgency: Option<Urgency>,
    pub pickup_date: Option<NaiveDate>,
    pub event_date: Option<NaiveDate>,

    // Attachments & notes
    pub reference_photos: Vec<Attachment>,
    pub notes: String,
}

impl Default for Enquiry {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone: String::new(),
            whatsapp_same: true,
            email: String::new(),
            city_area: String::new(),
            service_type: None,
            service_details: None,
            pickup_method: None,
            pickup_address: String::new(),
            preferred_window: None,
            urgency: None,
            pickup_date: None,
            event_date: None,
            reference_photos: Vec::new(),
            notes: String::new(),
        }
    }
}

impl Enquiry {
    /// The detail block for the selected service, if one is present and matches.
    pub fn active_details(&self) -> Option<&ServiceDetails> {
        let service = self.service_type?;
        self.service_details
            .as_ref()
            .filter(|details| details.service_type() == service)
    }
}

/// A flattened enquiry as appended to the row store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnquiryRow {
    pub submitted_at: DateTime<Utc>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub city_area: String,
    pub service_type: String,
    pub pickup_method: String,
    pub pickup_address: String,
    pub pickup_date: String,
    pub time_window: String,
    pub urgency: String,
    pub service_details: String,
    pub attachments: String,
    pub notes: String,
}

impl EnquiryRow {
    pub fn from_enquiry(enquiry: &Enquiry, submitted_at: DateTime<Utc>) -> Self {
        let service_details = enquiry
            .active_details()
            .map(ServiceDetails::fields_json)
            .unwrap_or_else(|| "{}".to_string());

        Self {
            submitted_at,
            name: enquiry.full_name.clone(),
            phone: enquiry.phone.clone(),
            email: enquiry.email.clone(),
            city_area: enquiry.city_area.clone(),
            service_type: enquiry.service_type.map(ServiceType::label).unwrap_or_default().to_string(),
            pickup_method: enquiry.pickup_method.map(PickupMethod::label).unwrap_or_default().to_string(),
            pickup_address: enquiry.pickup_address.clone(),
            pickup_date: enquiry.pickup_date.map(|d| d.to_string()).unwrap_or_default(),
            time_window: enquiry.preferred_window.map(TimeWindow::label).unwrap_or_default().to_string(),
            urgency: enquiry.urgency.map(Urgency::label).unwrap_or_default().to_string(),
            service_details,
            attachments: enquiry
                .reference_photos
                .iter()
                .map(|photo| photo.file_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            notes: enquiry.notes.clone(),
        }
    }

    /// Cell values in column order.
    pub fn to_values(&self) -> Vec<String> {
        vec![
            self.submitted_at.to_rfc3339(),
            self.name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.city_area.clone(),
            self.service_type.clone(),
            self.pickup_method.clone(),
            self.pickup_address.clone(),
            self.pickup_date.clone(),
            self.time_window.clone(),
            self.urgency.clone(),
            self.service_details.clone(),
            self.attachments.clone(),
            self.notes.clone(),
        ]
    }
}

// ============================================================================
// Static content
// ============================================================================

/// A customer testimonial from the read-only feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub name: String,
    pub city: String,
    pub service: String,
    pub rating: u8,
    pub quote: String,
    #[serde(default)]
    pub photo: String,
}

/// Turnaround range in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Turnaround {
    pub min_days: u32,
    pub max_days: u32,
}

/// One entry of the services catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCatalogEntry {
    pub name: &'static str,
    pub slug: &'static str,
    pub detail_key: &'static str,
    pub turnaround: Turnaround,
}

// ============================================================================
// Response Models
// ============================================================================

/// Body of an accepted submission. The client reads the same shape back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryAccepted {
    pub message: String,
    pub enquiry_id: String,
    pub service: String,
    pub pickup_date: Option<NaiveDate>,
    pub urgency: String,
    pub estimated_response: String,
    pub estimated_delivery: NaiveDate,
    #[serde(default)]
    pub request_id: String,
}

/// Body of the liveness probe on the enquiry endpoint.
#[derive(Debug, Serialize)]
pub struct Liveness {
    pub ok: bool,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::AlterationDetails;
    use chrono::TimeZone;

    #[test]
    fn labels_and_aliases_parse() {
        assert_eq!(parse_label::<ServiceType>("Repair & Patching"), Some(ServiceType::RepairAndPatching));
        assert_eq!(parse_label::<ServiceType>("RepairAndPatching"), Some(ServiceType::RepairAndPatching));
        assert_eq!(parse_label::<ServiceType>(" Embroidery "), Some(ServiceType::Embroidery));
        assert_eq!(parse_label::<ServiceType>("Knitting"), None);
        assert_eq!(parse_label::<PickupMethod>("pickup-from-home"), Some(PickupMethod::PickupFromHome));
        assert_eq!(parse_label::<TimeWindow>("Evening"), Some(TimeWindow::Evening));
        assert_eq!(parse_label::<Urgency>(""), None);
    }

    #[test]
    fn only_home_pickup_needs_an_address() {
        assert!(PickupMethod::PickupFromHome.requires_address());
        assert!(PickupMethod::Both.requires_address());
        assert!(!PickupMethod::DropOff.requires_address());
    }

    #[test]
    fn attachment_checks() {
        let ok = Attachment::new("a.png", "image/png", vec![0u8; 10]);
        assert!(ok.is_acceptable());
        let gif = Attachment::new("a.gif", "image/gif", vec![0u8; 10]);
        assert!(!gif.is_acceptable());
        let huge = Attachment::new("a.jpg", "image/jpeg", vec![0u8; MAX_ATTACHMENT_BYTES + 1]);
        assert!(!huge.is_acceptable());
    }

    #[test]
    fn row_flattens_enquiry_in_column_order() {
        let enquiry = Enquiry {
            full_name: "Asha Rao".into(),
            phone: "+91 98765 43210".into(),
            city_area: "Indiranagar".into(),
            service_type: Some(ServiceType::Alteration),
            service_details: Some(ServiceDetails::Alteration(AlterationDetails {
                garment_type: "Jeans".into(),
                required_changes: vec!["Length".into()],
                ..Default::default()
            })),
            pickup_method: Some(PickupMethod::DropOff),
            preferred_window: Some(TimeWindow::Morning),
            urgency: Some(Urgency::Express),
            reference_photos: vec![
                Attachment::new("front.jpg", "image/jpeg", vec![1u8]),
                Attachment::new("back.jpg", "image/jpeg", vec![2u8]),
            ],
            ..Default::default()
        };
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let values = EnquiryRow::from_enquiry(&enquiry, at).to_values();

        assert_eq!(values.len(), 14);
        assert_eq!(values[0], "2025-01-01T10:00:00+00:00");
        assert_eq!(values[5], "Alteration");
        assert_eq!(values[6], "Drop-off");
        assert_eq!(values[9], "Morning (8–11)");
        assert_eq!(values[10], "Express");
        assert!(values[11].contains("\"garmentType\":\"Jeans\""));
        assert_eq!(values[12], "front.jpg, back.jpg");
    }
}

//! Enquiry validation rules.
//!
//! One rule set serves both the form controller and the ingestion service.
//! Rules run in a fixed order and the first violation wins; there is no
//! multi-error aggregation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::details::{
    AlterationDetails, BlouseDetails, CustomStitchingDetails, EmbroideryDetails, RepairDetails,
    SareeDetails, ServiceDetails,
};
use crate::models::{Attachment, Enquiry, ServiceType, MAX_ATTACHMENTS};

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+]?[0-9\s]{10,15}$").expect("phone pattern is valid"));

// ============================================================================
// Fields
// ============================================================================

/// A form field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    FullName,
    Phone,
    WhatsappSame,
    Email,
    CityArea,
    ServiceType,
    PickupMethod,
    PickupAddress,
    PreferredWindow,
    Urgency,
    PickupDate,
    EventDate,
    ReferencePhotos,
    Notes,
    ServiceDetails,
    /// A field of a service-detail block, by its wire name.
    Detail(ServiceType, &'static str),
}

impl Field {
    /// Dot path of the field in the form, e.g. `serviceDetails.repair.location`.
    pub fn path(&self) -> String {
        match self {
            Field::FullName => "fullName".to_string(),
            Field::Phone => "phone".to_string(),
            Field::WhatsappSame => "whatsappSame".to_string(),
            Field::Email => "email".to_string(),
            Field::CityArea => "cityArea".to_string(),
            Field::ServiceType => "serviceType".to_string(),
            Field::PickupMethod => "pickupMethod".to_string(),
            Field::PickupAddress => "pickupAddress".to_string(),
            Field::PreferredWindow => "preferredWindow".to_string(),
            Field::Urgency => "urgency".to_string(),
            Field::PickupDate => "pickupDate".to_string(),
            Field::EventDate => "eventDate".to_string(),
            Field::ReferencePhotos => "referencePhotos".to_string(),
            Field::Notes => "notes".to_string(),
            Field::ServiceDetails => "serviceDetails".to_string(),
            Field::Detail(service, name) => format!("serviceDetails.{}.{}", service.detail_key(), name),
        }
    }
}

/// The first violated rule: which field, and what to tell the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(value: &str, field: Field, message: &str) -> Result<(), FieldError> {
    if is_blank(value) {
        return Err(FieldError::new(field, message));
    }
    Ok(())
}

fn require_set<T>(value: &Option<T>, field: Field, message: &str) -> Result<(), FieldError> {
    if value.is_none() {
        return Err(FieldError::new(field, message));
    }
    Ok(())
}

/// Spaces are ignored, then 10-15 digits with an optional leading `+`.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_PATTERN.is_match(&compact)
}

// ============================================================================
// Base fields
// ============================================================================

fn check_base(enquiry: &Enquiry) -> Result<(), FieldError> {
    require(&enquiry.full_name, Field::FullName, "Full name is required")?;
    require(&enquiry.phone, Field::Phone, "Phone number is required")?;
    if !is_valid_phone(&enquiry.phone) {
        return Err(FieldError::new(
            Field::Phone,
            "Please enter a valid phone number (10-15 digits)",
        ));
    }
    require(&enquiry.city_area, Field::CityArea, "City/Area is required")?;
    require_set(&enquiry.service_type, Field::ServiceType, "Service type is required")?;
    require_set(&enquiry.pickup_method, Field::PickupMethod, "Pickup method is required")?;
    if enquiry.pickup_method.is_some_and(|method| method.requires_address()) {
        require(&enquiry.pickup_address, Field::PickupAddress, "Pickup address is required")?;
    }
    require_set(
        &enquiry.preferred_window,
        Field::PreferredWindow,
        "Preferred pickup window is required",
    )?;
    require_set(&enquiry.urgency, Field::Urgency, "Urgency is required")?;
    Ok(())
}

/// Whether every required base field is filled in; drives the submit button.
pub fn base_fields_complete(enquiry: &Enquiry) -> bool {
    let address_ok = match enquiry.pickup_method {
        Some(method) if method.requires_address() => !is_blank(&enquiry.pickup_address),
        _ => true,
    };
    !is_blank(&enquiry.full_name)
        && !is_blank(&enquiry.phone)
        && !is_blank(&enquiry.city_area)
        && enquiry.service_type.is_some()
        && enquiry.pickup_method.is_some()
        && enquiry.preferred_window.is_some()
        && enquiry.urgency.is_some()
        && address_ok
}

// ============================================================================
// Service-specific fields
// ============================================================================

/// Required-field checks of one detail variant, in table order.
trait RequiredFields {
    const SERVICE: ServiceType;

    fn check(&self) -> Result<(), FieldError>;

    fn require(value: &str, name: &'static str, message: &str) -> Result<(), FieldError> {
        require(value, Field::Detail(Self::SERVICE, name), message)
    }
}

impl RequiredFields for CustomStitchingDetails {
    const SERVICE: ServiceType = ServiceType::CustomStitching;

    fn check(&self) -> Result<(), FieldError> {
        Self::require(&self.garment_type, "garmentType", "Garment type is required")?;
        Self::require(&self.fabric_type, "fabricType", "Fabric type is required")?;
        Self::require(&self.fabric_provided, "fabricProvided", "Please specify if fabric is provided")?;
        Self::require(&self.lining_needed, "liningNeeded", "Please specify if lining is needed")?;
        Self::require(&self.fit_preference, "fitPreference", "Fit preference is required")
    }
}

impl RequiredFields for EmbroideryDetails {
    const SERVICE: ServiceType = ServiceType::Embroidery;

    fn check(&self) -> Result<(), FieldError> {
        Self::require(&self.technique, "technique", "Technique is required")?;
        Self::require(&self.placement, "placement", "Placement is required")?;
        Self::require(&self.coverage, "coverage", "Coverage is required")?;
        Self::require(&self.embellishments, "embellishments", "Embellishments selection is required")?;
        Self::require(&self.fabric_thickness, "fabricThickness", "Fabric thickness is required")
    }
}

impl RequiredFields for AlterationDetails {
    const SERVICE: ServiceType = ServiceType::Alteration;

    fn check(&self) -> Result<(), FieldError> {
        Self::require(&self.garment_type, "garmentType", "Garment type is required")?;
        if self.required_changes.iter().all(|change| is_blank(change)) {
            return Err(FieldError::new(
                Field::Detail(Self::SERVICE, "requiredChanges"),
                "At least one change is required",
            ));
        }
        Ok(())
    }
}

impl RequiredFields for RepairDetails {
    const SERVICE: ServiceType = ServiceType::RepairAndPatching;

    fn check(&self) -> Result<(), FieldError> {
        Self::require(&self.issue, "issue", "Issue type is required")?;
        Self::require(&self.location, "location", "Location is required")?;
        Self::require(&self.opening_size, "openingSize", "Opening size is required")?;
        Self::require(&self.patch_style, "patchStyle", "Patch style is required")?;
        Self::require(
            &self.matching_fabric_available,
            "matchingFabricAvailable",
            "Matching fabric availability is required",
        )?;
        Self::require(
            &self.durability_preference,
            "durabilityPreference",
            "Durability preference is required",
        )
    }
}

impl RequiredFields for SareeDetails {
    const SERVICE: ServiceType = ServiceType::SareeFallAndEdging;

    fn check(&self) -> Result<(), FieldError> {
        Self::require(&self.work_type, "workType", "Work type is required")?;
        Self::require(&self.saree_material, "sareeMaterial", "Saree material is required")?;
        Self::require(&self.thread_match, "threadMatch", "Thread match preference is required")
    }
}

impl RequiredFields for BlouseDetails {
    const SERVICE: ServiceType = ServiceType::BlouseDesign;

    fn check(&self) -> Result<(), FieldError> {
        Self::require(&self.neck_style, "neckStyle", "Neck style is required")?;
        Self::require(&self.back_style, "backStyle", "Back style is required")?;
        Self::require(&self.sleeve, "sleeve", "Sleeve type is required")?;
        Self::require(&self.padding, "padding", "Padding preference is required")?;
        Self::require(&self.opening, "opening", "Opening type is required")?;
        Self::require(&self.embellishments, "embellishments", "Embellishments selection is required")
    }
}

/// Check the required fields of a detail block.
pub fn check_details(details: &ServiceDetails) -> Result<(), FieldError> {
    match details {
        ServiceDetails::CustomStitching(d) => d.check(),
        ServiceDetails::Embroidery(d) => d.check(),
        ServiceDetails::Alteration(d) => d.check(),
        ServiceDetails::RepairAndPatching(d) => d.check(),
        ServiceDetails::SareeFallAndEdging(d) => d.check(),
        ServiceDetails::BlouseDesign(d) => d.check(),
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// Count, type and size rules for an attachment list.
pub fn check_attachments(attachments: &[Attachment]) -> Result<(), FieldError> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(FieldError::new(
            Field::ReferencePhotos,
            format!("You can upload maximum {MAX_ATTACHMENTS} photos"),
        ));
    }
    if let Some(photo) = attachments.iter().find(|photo| !photo.has_allowed_type()) {
        return Err(FieldError::new(
            Field::ReferencePhotos,
            format!("{} is not a JPEG, PNG or WebP image", photo.file_name),
        ));
    }
    if let Some(photo) = attachments.iter().find(|photo| !photo.within_size_limit()) {
        return Err(FieldError::new(
            Field::ReferencePhotos,
            format!("{} is larger than 5 MB", photo.file_name),
        ));
    }
    Ok(())
}

// ============================================================================
// Entry points
// ============================================================================

/// Client-side validation of a draft.
///
/// A draft without a detail block is checked against an empty block, so the
/// error names the first required field of the selected service.
pub fn validate_draft(enquiry: &Enquiry) -> Result<(), FieldError> {
    check_base(enquiry)?;
    if let Some(service) = enquiry.service_type {
        match enquiry.active_details() {
            Some(details) => check_details(details)?,
            None => check_details(&ServiceDetails::empty(service))?,
        }
    }
    Ok(())
}

/// Server-side validation of a normalized submission.
pub fn validate_submission(enquiry: &Enquiry) -> Result<(), FieldError> {
    check_base(enquiry)?;
    let details = enquiry.active_details().ok_or_else(|| {
        FieldError::new(Field::ServiceDetails, "Service-specific details are required")
    })?;
    check_details(details)?;
    check_attachments(&enquiry.reference_photos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::*;
    use crate::models::{PickupMethod, TimeWindow, Urgency};

    fn base(service: ServiceType, details: ServiceDetails) -> Enquiry {
        Enquiry {
            full_name: "Meera Iyer".into(),
            phone: "+91 98765 43210".into(),
            city_area: "Koramangala".into(),
            service_type: Some(service),
            service_details: Some(details),
            pickup_method: Some(PickupMethod::DropOff),
            preferred_window: Some(TimeWindow::Afternoon),
            urgency: Some(Urgency::Regular),
            ..Default::default()
        }
    }

    fn complete(service: ServiceType) -> Enquiry {
        let details = match service {
            ServiceType::CustomStitching => ServiceDetails::CustomStitching(CustomStitchingDetails {
                garment_type: "Kurti".into(),
                fabric_type: "Cotton".into(),
                fabric_provided: "Yes".into(),
                lining_needed: "No".into(),
                fit_preference: "Regular".into(),
                ..Default::default()
            }),
            ServiceType::Embroidery => ServiceDetails::Embroidery(EmbroideryDetails {
                technique: "Aari".into(),
                placement: "Neckline".into(),
                coverage: "Light".into(),
                embellishments: "Beads".into(),
                fabric_thickness: "Medium".into(),
                ..Default::default()
            }),
            ServiceType::Alteration => ServiceDetails::Alteration(AlterationDetails {
                garment_type: "Jeans".into(),
                required_changes: vec!["Length".into()],
                ..Default::default()
            }),
            ServiceType::RepairAndPatching => ServiceDetails::RepairAndPatching(RepairDetails {
                issue: "Tear".into(),
                location: "Left knee".into(),
                opening_size: "Small".into(),
                patch_style: "Invisible blend".into(),
                matching_fabric_available: "Yes".into(),
                durability_preference: "Reinforced".into(),
                ..Default::default()
            }),
            ServiceType::SareeFallAndEdging => ServiceDetails::SareeFallAndEdging(SareeDetails {
                work_type: "Fall + Pico".into(),
                saree_material: "Silk".into(),
                thread_match: "Match for me".into(),
                ..Default::default()
            }),
            ServiceType::BlouseDesign => ServiceDetails::BlouseDesign(BlouseDetails {
                neck_style: "Boat".into(),
                back_style: "Dori".into(),
                sleeve: "Elbow".into(),
                padding: "Yes".into(),
                opening: "Back".into(),
                embellishments: "Piping".into(),
                ..Default::default()
            }),
        };
        base(service, details)
    }

    /// Blank out one required field of the active block by its wire name.
    fn without(mut enquiry: Enquiry, name: &str) -> Enquiry {
        let mut wire = serde_json::to_value(enquiry.service_details.as_ref().unwrap()).unwrap();
        let block = wire.as_object_mut().unwrap().values_mut().next().unwrap();
        block[name] = match block[name] {
            serde_json::Value::Array(_) => serde_json::json!([]),
            _ => serde_json::json!(""),
        };
        enquiry.service_details = Some(serde_json::from_value(wire).unwrap());
        enquiry
    }

    const REQUIRED: [(ServiceType, &[&str]); 6] = [
        (
            ServiceType::CustomStitching,
            &["garmentType", "fabricType", "fabricProvided", "liningNeeded", "fitPreference"],
        ),
        (
            ServiceType::Embroidery,
            &["technique", "placement", "coverage", "embellishments", "fabricThickness"],
        ),
        (ServiceType::Alteration, &["garmentType", "requiredChanges"]),
        (
            ServiceType::RepairAndPatching,
            &[
                "issue",
                "location",
                "openingSize",
                "patchStyle",
                "matchingFabricAvailable",
                "durabilityPreference",
            ],
        ),
        (ServiceType::SareeFallAndEdging, &["workType", "sareeMaterial", "threadMatch"]),
        (
            ServiceType::BlouseDesign,
            &["neckStyle", "backStyle", "sleeve", "padding", "opening", "embellishments"],
        ),
    ];

    #[test]
    fn complete_enquiries_pass_for_every_service() {
        for service in ServiceType::ALL {
            assert_eq!(validate_draft(&complete(service)), Ok(()), "{service}");
            assert_eq!(validate_submission(&complete(service)), Ok(()), "{service}");
        }
    }

    #[test]
    fn each_missing_required_detail_is_named() {
        for (service, names) in REQUIRED {
            for name in names {
                let err = validate_submission(&without(complete(service), name)).unwrap_err();
                assert_eq!(err.field, Field::Detail(service, *name), "{service} {name}");
                assert_eq!(
                    err.field.path(),
                    format!("serviceDetails.{}.{}", service.detail_key(), name)
                );
            }
        }
    }

    #[test]
    fn blank_repair_location_is_rejected() {
        let mut enquiry = complete(ServiceType::RepairAndPatching);
        if let Some(ServiceDetails::RepairAndPatching(d)) = enquiry.service_details.as_mut() {
            d.location = "   ".into();
        }
        let err = validate_draft(&enquiry).unwrap_err();
        assert_eq!(err.field, Field::Detail(ServiceType::RepairAndPatching, "location"));
    }

    #[test]
    fn blocks_for_other_services_are_not_checked() {
        let mut enquiry = complete(ServiceType::Alteration);
        enquiry.service_type = Some(ServiceType::Embroidery);
        // The alteration block no longer matches the selected service.
        let err = validate_submission(&enquiry).unwrap_err();
        assert_eq!(err.field, Field::ServiceDetails);
        let err = validate_draft(&enquiry).unwrap_err();
        assert_eq!(err.field, Field::Detail(ServiceType::Embroidery, "technique"));
    }

    #[test]
    fn address_follows_pickup_method() {
        for method in [PickupMethod::PickupFromHome, PickupMethod::Both] {
            let mut enquiry = complete(ServiceType::Alteration);
            enquiry.pickup_method = Some(method);
            let err = validate_draft(&enquiry).unwrap_err();
            assert_eq!(err.field, Field::PickupAddress);

            enquiry.pickup_address = "12 MG Road".into();
            assert_eq!(validate_draft(&enquiry), Ok(()));
        }

        let mut enquiry = complete(ServiceType::Alteration);
        enquiry.pickup_method = Some(PickupMethod::DropOff);
        enquiry.pickup_address.clear();
        assert_eq!(validate_draft(&enquiry), Ok(()));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("+91 98765 43210"));
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+123456789012345"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765-43210"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("+"));
        // ASCII digits only.
        assert!(!is_valid_phone("९८७६५४३२१०"));
        assert!(!is_valid_phone("+٩١٩٨٧٦٥٤٣٢١٠"));
    }

    #[test]
    fn base_rules_run_before_detail_rules() {
        let mut enquiry = without(complete(ServiceType::Embroidery), "technique");
        enquiry.phone = "12345".into();
        let err = validate_draft(&enquiry).unwrap_err();
        assert_eq!(err.field, Field::Phone);
        assert_eq!(err.message, "Please enter a valid phone number (10-15 digits)");

        enquiry.full_name = " ".into();
        assert_eq!(validate_draft(&enquiry).unwrap_err().field, Field::FullName);
    }

    #[test]
    fn submit_readiness_tracks_required_base_fields() {
        let mut enquiry = complete(ServiceType::Alteration);
        assert!(base_fields_complete(&enquiry));
        enquiry.pickup_method = Some(PickupMethod::Both);
        assert!(!base_fields_complete(&enquiry));
        enquiry.pickup_address = "Flat 4B".into();
        assert!(base_fields_complete(&enquiry));
        enquiry.urgency = None;
        assert!(!base_fields_complete(&enquiry));
    }

    #[test]
    fn attachment_rules() {
        let png = || Attachment::new("a.png", "image/png", vec![0u8; 4]);
        assert!(check_attachments(&[png(), png(), png()]).is_ok());
        assert!(check_attachments(&[png(), png(), png(), png()]).is_err());
        let pdf = Attachment::new("scan.pdf", "application/pdf", vec![0u8; 4]);
        let err = check_attachments(&[png(), pdf]).unwrap_err();
        assert_eq!(err.field, Field::ReferencePhotos);
    }
}

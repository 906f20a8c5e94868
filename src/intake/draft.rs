//! Draft editing operations and the multipart payload built on submit.

use thiserror::Error;

use crate::details::{
    AlterationDetails, BlouseDetails, CustomStitchingDetails, EmbroideryDetails, RepairDetails,
    SareeDetails, ServiceDetails,
};
use crate::ingest::payload::PHOTO_FIELD_PREFIX;
use crate::intake::transport::PayloadPart;
use crate::models::{Attachment, Enquiry, ServiceType, MAX_ATTACHMENTS};
use crate::validation::Field;

/// Multi-select lists in the detail blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    AlterationRequiredChanges,
    AlterationFitAreas,
}

impl ListField {
    pub fn field(self) -> Field {
        match self {
            ListField::AlterationRequiredChanges => Field::Detail(ServiceType::Alteration, "requiredChanges"),
            ListField::AlterationFitAreas => Field::Detail(ServiceType::Alteration, "fitAreas"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("You can upload maximum {max} photos")]
    TooMany { max: usize },
}

impl Enquiry {
    /// Choose the service. Switching to a different service replaces the
    /// detail block with an empty one of the new variant; re-selecting the
    /// current service keeps it.
    pub fn select_service(&mut self, service: Option<ServiceType>) {
        if self.service_type != service {
            self.service_type = service;
            self.service_details = service.map(ServiceDetails::empty);
        }
    }

    /// The detail block for the selected service, created empty on demand.
    pub fn details_mut(&mut self) -> Option<&mut ServiceDetails> {
        let service = self.service_type?;
        let stale = self
            .service_details
            .as_ref()
            .map_or(true, |details| details.service_type() != service);
        if stale {
            self.service_details = Some(ServiceDetails::empty(service));
        }
        self.service_details.as_mut()
    }

    pub fn custom_stitching_mut(&mut self) -> Option<&mut CustomStitchingDetails> {
        match self.details_mut()? {
            ServiceDetails::CustomStitching(details) => Some(details),
            _ => None,
        }
    }

    pub fn embroidery_mut(&mut self) -> Option<&mut EmbroideryDetails> {
        match self.details_mut()? {
            ServiceDetails::Embroidery(details) => Some(details),
            _ => None,
        }
    }

    pub fn alteration_mut(&mut self) -> Option<&mut AlterationDetails> {
        match self.details_mut()? {
            ServiceDetails::Alteration(details) => Some(details),
            _ => None,
        }
    }

    pub fn repair_mut(&mut self) -> Option<&mut RepairDetails> {
        match self.details_mut()? {
            ServiceDetails::RepairAndPatching(details) => Some(details),
            _ => None,
        }
    }

    pub fn saree_mut(&mut self) -> Option<&mut SareeDetails> {
        match self.details_mut()? {
            ServiceDetails::SareeFallAndEdging(details) => Some(details),
            _ => None,
        }
    }

    pub fn blouse_mut(&mut self) -> Option<&mut BlouseDetails> {
        match self.details_mut()? {
            ServiceDetails::BlouseDesign(details) => Some(details),
            _ => None,
        }
    }

    /// Add `item` to `list` (once) or remove its first occurrence. A no-op
    /// unless the list's service is selected.
    pub fn toggle_item(&mut self, list: ListField, item: &str, included: bool) {
        // Nothing to remove from a block that does not exist yet.
        if !included && !matches!(self.active_details(), Some(ServiceDetails::Alteration(_))) {
            return;
        }
        let Some(alteration) = self.alteration_mut() else {
            return;
        };
        let items = match list {
            ListField::AlterationRequiredChanges => &mut alteration.required_changes,
            ListField::AlterationFitAreas => &mut alteration.fit_areas,
        };

        if included {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        } else if let Some(position) = items.iter().position(|existing| existing == item) {
            items.remove(position);
        }
    }

    /// Append the acceptable files in order, returning how many were kept.
    ///
    /// Files of the wrong type or over the size limit are dropped silently.
    /// If the remaining batch would push the total past the limit, nothing is
    /// added.
    pub fn add_attachments(&mut self, files: Vec<Attachment>) -> Result<usize, AttachmentError> {
        let accepted: Vec<Attachment> = files.into_iter().filter(Attachment::is_acceptable).collect();
        if self.reference_photos.len() + accepted.len() > MAX_ATTACHMENTS {
            return Err(AttachmentError::TooMany { max: MAX_ATTACHMENTS });
        }
        let count = accepted.len();
        self.reference_photos.extend(accepted);
        Ok(count)
    }

    /// Remove the attachment at `index`; out of range is a no-op.
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.reference_photos.len()).then(|| self.reference_photos.remove(index))
    }

    /// The multipart form sent on submit: every scalar as text, the detail
    /// block as a JSON string, photos as `referencePhoto_<index>` files.
    pub fn to_payload(&self) -> Vec<PayloadPart> {
        let label = |value: Option<&'static str>| value.unwrap_or_default().to_string();
        let date = |value: Option<chrono::NaiveDate>| value.map(|d| d.to_string()).unwrap_or_default();

        let mut parts = vec![
            PayloadPart::text("fullName", &self.full_name),
            PayloadPart::text("phone", &self.phone),
            PayloadPart::text("whatsappSame", self.whatsapp_same.to_string()),
            PayloadPart::text("email", &self.email),
            PayloadPart::text("cityArea", &self.city_area),
            PayloadPart::text("serviceType", label(self.service_type.map(ServiceType::label))),
            PayloadPart::text(
                "serviceDetails",
                self.active_details()
                    .map(ServiceDetails::to_wire_json)
                    .unwrap_or_else(|| "{}".to_string()),
            ),
            PayloadPart::text("pickupMethod", label(self.pickup_method.map(|m| m.label()))),
            PayloadPart::text("pickupAddress", &self.pickup_address),
            PayloadPart::text("preferredWindow", label(self.preferred_window.map(|w| w.label()))),
            PayloadPart::text("urgency", label(self.urgency.map(|u| u.label()))),
            PayloadPart::text("pickupDate", date(self.pickup_date)),
            PayloadPart::text("eventDate", date(self.event_date)),
            PayloadPart::text("notes", &self.notes),
        ];

        parts.extend(
            self.reference_photos
                .iter()
                .enumerate()
                .map(|(index, photo)| PayloadPart::File {
                    name: format!("{PHOTO_FIELD_PREFIX}{index}"),
                    attachment: photo.clone(),
                }),
        );
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PickupMethod, Urgency};

    fn photo(name: &str, content_type: &str, size: usize) -> Attachment {
        Attachment::new(name, content_type, vec![0u8; size])
    }

    #[test]
    fn detail_accessors_follow_the_selected_service() {
        let mut draft = Enquiry::default();
        assert!(draft.repair_mut().is_none());

        draft.select_service(Some(ServiceType::RepairAndPatching));
        draft.repair_mut().unwrap().location = "Elbow".into();
        assert!(draft.blouse_mut().is_none());
        assert_eq!(
            draft.service_details,
            Some(ServiceDetails::RepairAndPatching(RepairDetails {
                location: "Elbow".into(),
                ..Default::default()
            }))
        );

        draft.select_service(Some(ServiceType::Embroidery));
        draft.embroidery_mut().unwrap().technique = "Zardozi".into();
        assert_eq!(draft.active_details().map(ServiceDetails::service_type), Some(ServiceType::Embroidery));
    }

    #[test]
    fn switching_service_replaces_the_block() {
        let mut draft = Enquiry::default();
        draft.select_service(Some(ServiceType::RepairAndPatching));
        draft.repair_mut().unwrap().issue = "Tear".into();

        draft.select_service(Some(ServiceType::RepairAndPatching));
        assert_eq!(draft.repair_mut().unwrap().issue, "Tear");

        draft.select_service(Some(ServiceType::Embroidery));
        assert_eq!(draft.service_type, Some(ServiceType::Embroidery));
        assert_eq!(
            draft.service_details,
            Some(ServiceDetails::Embroidery(EmbroideryDetails::default()))
        );
        assert!(!serde_json::to_string(&draft).unwrap().contains("\"repair\""));

        draft.select_service(None);
        assert_eq!(draft.service_details, None);
    }

    #[test]
    fn unchecking_without_a_block_changes_nothing() {
        let mut draft = Enquiry {
            service_type: Some(ServiceType::Alteration),
            ..Default::default()
        };
        let before = draft.clone();
        draft.toggle_item(ListField::AlterationFitAreas, "Waist", false);
        assert_eq!(draft, before);

        draft.toggle_item(ListField::AlterationFitAreas, "Waist", true);
        assert_eq!(draft.alteration_mut().unwrap().fit_areas, vec!["Waist"]);
    }

    #[test]
    fn toggle_adds_once_and_removes_first_match() {
        let mut draft = Enquiry::default();
        draft.select_service(Some(ServiceType::Alteration));
        let list = ListField::AlterationRequiredChanges;

        draft.toggle_item(list, "Length", true);
        draft.toggle_item(list, "Fit", true);
        draft.toggle_item(list, "Length", true);
        assert_eq!(draft.alteration_mut().unwrap().required_changes, vec!["Length", "Fit"]);

        draft.toggle_item(list, "Length", false);
        draft.toggle_item(list, "Sleeves", false);
        assert_eq!(draft.alteration_mut().unwrap().required_changes, vec!["Fit"]);
        assert_eq!(list.field().path(), "serviceDetails.alteration.requiredChanges");
    }

    #[test]
    fn invalid_files_are_dropped_and_overflow_rejects_the_batch() {
        let mut draft = Enquiry::default();
        let kept = draft
            .add_attachments(vec![
                photo("a.jpg", "image/jpeg", 10),
                photo("notes.pdf", "application/pdf", 10),
                photo("huge.png", "image/png", 6 * 1024 * 1024),
                photo("b.webp", "image/webp", 10),
            ])
            .unwrap();
        assert_eq!(kept, 2);

        let err = draft
            .add_attachments(vec![photo("c.png", "image/png", 1), photo("d.png", "image/png", 1)])
            .unwrap_err();
        assert_eq!(err.to_string(), "You can upload maximum 3 photos");
        assert_eq!(draft.reference_photos.len(), 2);

        assert_eq!(draft.add_attachments(vec![photo("c.png", "image/png", 1)]), Ok(1));
    }

    #[test]
    fn removing_preserves_order() {
        let mut draft = Enquiry::default();
        draft
            .add_attachments(vec![
                photo("a.jpg", "image/jpeg", 1),
                photo("b.jpg", "image/jpeg", 1),
                photo("c.jpg", "image/jpeg", 1),
            ])
            .unwrap();
        assert!(draft.remove_attachment(7).is_none());
        assert_eq!(draft.remove_attachment(1).unwrap().file_name, "b.jpg");
        let names: Vec<_> = draft.reference_photos.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "c.jpg"]);
    }

    #[test]
    fn payload_carries_labels_details_and_indexed_photos() {
        let mut draft = Enquiry {
            full_name: "Meera".into(),
            pickup_method: Some(PickupMethod::DropOff),
            urgency: Some(Urgency::Express),
            ..Default::default()
        };
        draft.select_service(Some(ServiceType::SareeFallAndEdging));
        draft.saree_mut().unwrap().work_type = "Pico".into();
        draft
            .add_attachments(vec![photo("a.jpg", "image/jpeg", 1), photo("b.png", "image/png", 1)])
            .unwrap();

        let parts = draft.to_payload();
        let text = |name: &str| {
            parts.iter().find_map(|part| match part {
                PayloadPart::Text { name: n, value } if n == name => Some(value.clone()),
                _ => None,
            })
        };
        assert_eq!(text("serviceType").as_deref(), Some("Saree Fall & Edging"));
        assert_eq!(text("pickupMethod").as_deref(), Some("Drop-off"));
        assert_eq!(text("whatsappSame").as_deref(), Some("true"));
        assert_eq!(text("pickupDate").as_deref(), Some(""));
        assert!(text("serviceDetails").unwrap().starts_with(r#"{"saree":{"workType":"Pico""#));

        let files: Vec<_> = parts
            .iter()
            .filter_map(|part| match part {
                PayloadPart::File { name, attachment } => Some((name.as_str(), attachment.file_name.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(files, vec![("referencePhoto_0", "a.jpg"), ("referencePhoto_1", "b.png")]);
    }
}

//! Service-specific detail blocks.
//!
//! Every enquiry carries exactly one block, chosen by its service type. On the
//! wire the block sits under its variant key, e.g.
//! `{"alteration": {"garmentType": "Jeans", "requiredChanges": ["Length"]}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::ServiceType;

/// The tagged union over the six detail variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceDetails {
    CustomStitching(CustomStitchingDetails),
    Embroidery(EmbroideryDetails),
    Alteration(AlterationDetails),
    #[serde(rename = "repair")]
    RepairAndPatching(RepairDetails),
    #[serde(rename = "saree")]
    SareeFallAndEdging(SareeDetails),
    #[serde(rename = "blouse")]
    BlouseDesign(BlouseDetails),
}

impl ServiceDetails {
    /// An empty block of the variant matching `service`.
    pub fn empty(service: ServiceType) -> Self {
        match service {
            ServiceType::CustomStitching => ServiceDetails::CustomStitching(Default::default()),
            ServiceType::Embroidery => ServiceDetails::Embroidery(Default::default()),
            ServiceType::Alteration => ServiceDetails::Alteration(Default::default()),
            ServiceType::RepairAndPatching => ServiceDetails::RepairAndPatching(Default::default()),
            ServiceType::SareeFallAndEdging => ServiceDetails::SareeFallAndEdging(Default::default()),
            ServiceType::BlouseDesign => ServiceDetails::BlouseDesign(Default::default()),
        }
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceDetails::CustomStitching(_) => ServiceType::CustomStitching,
            ServiceDetails::Embroidery(_) => ServiceType::Embroidery,
            ServiceDetails::Alteration(_) => ServiceType::Alteration,
            ServiceDetails::RepairAndPatching(_) => ServiceType::RepairAndPatching,
            ServiceDetails::SareeFallAndEdging(_) => ServiceType::SareeFallAndEdging,
            ServiceDetails::BlouseDesign(_) => ServiceType::BlouseDesign,
        }
    }

    /// Decode the raw `serviceDetails` value of a submission for `service`.
    ///
    /// The raw value is either the keyed object itself or that object encoded
    /// as a JSON string. Anything that does not yield a well-formed block for
    /// `service` decodes to `None`.
    pub fn decode(raw: Option<&Value>, service: ServiceType) -> Option<Self> {
        let parsed;
        let keyed = match raw? {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text).ok()?;
                &parsed
            }
            other => other,
        };

        let block = keyed.get(service.detail_key())?;
        if !block.is_object() {
            return None;
        }
        Self::from_block(service, block.clone()).ok()
    }

    fn from_block(service: ServiceType, block: Value) -> Result<Self, serde_json::Error> {
        Ok(match service {
            ServiceType::CustomStitching => ServiceDetails::CustomStitching(serde_json::from_value(block)?),
            ServiceType::Embroidery => ServiceDetails::Embroidery(serde_json::from_value(block)?),
            ServiceType::Alteration => ServiceDetails::Alteration(serde_json::from_value(block)?),
            ServiceType::RepairAndPatching => ServiceDetails::RepairAndPatching(serde_json::from_value(block)?),
            ServiceType::SareeFallAndEdging => ServiceDetails::SareeFallAndEdging(serde_json::from_value(block)?),
            ServiceType::BlouseDesign => ServiceDetails::BlouseDesign(serde_json::from_value(block)?),
        })
    }

    /// The keyed wire form, as sent in the `serviceDetails` form field.
    pub fn to_wire_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Only the variant's own fields, as stored in the row sink.
    pub fn fields_json(&self) -> String {
        let encoded = match self {
            ServiceDetails::CustomStitching(d) => serde_json::to_string(d),
            ServiceDetails::Embroidery(d) => serde_json::to_string(d),
            ServiceDetails::Alteration(d) => serde_json::to_string(d),
            ServiceDetails::RepairAndPatching(d) => serde_json::to_string(d),
            ServiceDetails::SareeFallAndEdging(d) => serde_json::to_string(d),
            ServiceDetails::BlouseDesign(d) => serde_json::to_string(d),
        };
        encoded.unwrap_or_else(|_| "{}".to_string())
    }
}

/// Field-level coercions for detail blocks.
///
/// Form posts carry everything as text and JSON clients send numbers and
/// booleans, so a field of the wrong JSON type is coerced or defaulted on its
/// own instead of failing the whole block.
mod lenient {
    use std::collections::BTreeMap;

    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_text(value: Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(as_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(flag) => flag,
            Value::String(text) => matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "on" | "yes" | "1"),
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        })
    }

    /// An array of scalars, or a single non-blank string as a one-item list.
    pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(as_text).collect(),
            Value::String(text) if !text.trim().is_empty() => vec![text],
            _ => Vec::new(),
        })
    }

    pub fn text_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(entries) => entries
                .into_iter()
                .filter_map(|(key, value)| as_text(value).map(|text| (key, text)))
                .collect(),
            _ => BTreeMap::new(),
        })
    }

    pub fn block<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
    }
}

// ============================================================================
// Custom stitching
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomStitchingDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub garment_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub fabric_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub fabric_provided: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub need_fabric_sourcing: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub budget_range: String,
    #[serde(deserialize_with = "lenient::text")]
    pub lining_needed: String,
    #[serde(deserialize_with = "lenient::text")]
    pub fit_preference: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub take_measurements_during_pickup: bool,
    #[serde(deserialize_with = "lenient::block")]
    pub measurements: BodyMeasurements,
    #[serde(deserialize_with = "lenient::block")]
    pub design_details: DesignDetails,
    #[serde(deserialize_with = "lenient::text")]
    pub style_reference_link: String,
    #[serde(deserialize_with = "lenient::block")]
    pub finishing: Finishing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyMeasurements {
    #[serde(deserialize_with = "lenient::text")]
    pub bust: String,
    #[serde(deserialize_with = "lenient::text")]
    pub underbust: String,
    #[serde(deserialize_with = "lenient::text")]
    pub waist: String,
    #[serde(deserialize_with = "lenient::text")]
    pub hip: String,
    #[serde(deserialize_with = "lenient::text")]
    pub shoulder_width: String,
    #[serde(deserialize_with = "lenient::text")]
    pub armhole: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sleeve_length: String,
    #[serde(deserialize_with = "lenient::text")]
    pub top_length: String,
    #[serde(deserialize_with = "lenient::text")]
    pub rise: String,
    #[serde(deserialize_with = "lenient::text")]
    pub inseam: String,
    #[serde(deserialize_with = "lenient::text")]
    pub outseam: String,
    #[serde(deserialize_with = "lenient::text")]
    pub hem_opening: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub neckline: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sleeve_style: String,
    #[serde(deserialize_with = "lenient::text")]
    pub opening: String,
    #[serde(deserialize_with = "lenient::text")]
    pub pockets: String,
    #[serde(deserialize_with = "lenient::text")]
    pub slit: String,
    #[serde(deserialize_with = "lenient::text")]
    pub slit_length: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Finishing {
    #[serde(deserialize_with = "lenient::text")]
    pub interfacing: String,
    #[serde(deserialize_with = "lenient::text")]
    pub seam_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub hem_type: String,
}

// ============================================================================
// Embroidery
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbroideryDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub technique: String,
    #[serde(deserialize_with = "lenient::text")]
    pub placement: String,
    #[serde(deserialize_with = "lenient::text")]
    pub coverage: String,
    #[serde(deserialize_with = "lenient::text")]
    pub embellishments: String,
    #[serde(deserialize_with = "lenient::text")]
    pub color_palette: String,
    #[serde(deserialize_with = "lenient::text")]
    pub design_reference_link: String,
    #[serde(deserialize_with = "lenient::text")]
    pub fabric_thickness: String,
    #[serde(deserialize_with = "lenient::text")]
    pub area_width: String,
    #[serde(deserialize_with = "lenient::text")]
    pub area_height: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub backing_cloth: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub lining_add: bool,
}

// ============================================================================
// Alteration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlterationDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub garment_type: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub required_changes: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub length_change: String,
    #[serde(deserialize_with = "lenient::text")]
    pub length_amount: String,
    #[serde(deserialize_with = "lenient::text")]
    pub length_hem_type: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub fit_areas: Vec<String>,
    #[serde(deserialize_with = "lenient::text_map")]
    pub fit_amounts: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient::text")]
    pub sleeve_change: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sleeve_amount: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub waistband_adjust: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub waistband_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub waistband_new_waist: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub zip_repair: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub zip_length: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub button_repair: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub button_count: String,
    #[serde(deserialize_with = "lenient::text")]
    pub current_vs_desired: String,
}

// ============================================================================
// Repair & patching
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepairDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub issue: String,
    #[serde(deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(deserialize_with = "lenient::text")]
    pub opening_size: String,
    #[serde(deserialize_with = "lenient::text")]
    pub patch_style: String,
    #[serde(deserialize_with = "lenient::text")]
    pub matching_fabric_available: String,
    #[serde(deserialize_with = "lenient::text")]
    pub fabric_piece_size: String,
    #[serde(deserialize_with = "lenient::text")]
    pub durability_preference: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub topstitch: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub edge_bind: bool,
}

// ============================================================================
// Saree fall & edging
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SareeDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub work_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub saree_material: String,
    #[serde(deserialize_with = "lenient::text")]
    pub thread_match: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub blouse_work_also: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub blouse_neck_style: String,
    #[serde(deserialize_with = "lenient::text")]
    pub blouse_sleeve_type: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub blouse_padding: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub pallu_finishing: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub preserve_zari: bool,
}

// ============================================================================
// Blouse design
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlouseDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub neck_style: String,
    #[serde(deserialize_with = "lenient::text")]
    pub back_style: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sleeve: String,
    #[serde(deserialize_with = "lenient::text")]
    pub padding: String,
    #[serde(deserialize_with = "lenient::text")]
    pub opening: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub take_measurements_during_pickup: bool,
    #[serde(deserialize_with = "lenient::block")]
    pub measurements: BlouseMeasurements,
    #[serde(deserialize_with = "lenient::text")]
    pub embellishments: String,
    #[serde(deserialize_with = "lenient::text")]
    pub piping_color: String,
    #[serde(deserialize_with = "lenient::text")]
    pub hem_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlouseMeasurements {
    #[serde(deserialize_with = "lenient::text")]
    pub bust: String,
    #[serde(deserialize_with = "lenient::text")]
    pub underbust: String,
    #[serde(deserialize_with = "lenient::text")]
    pub waist: String,
    #[serde(deserialize_with = "lenient::text")]
    pub shoulder: String,
    #[serde(deserialize_with = "lenient::text")]
    pub armhole: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sleeve_length: String,
    #[serde(deserialize_with = "lenient::text")]
    pub blouse_length: String,
}

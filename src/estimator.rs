//! Delivery date estimation.
//!
//! Pure calendar arithmetic: no business days, no holidays, no time of day in
//! the result.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{parse_label, ServiceType, Turnaround, Urgency};

/// Range used when the service type is not known.
pub const FALLBACK_TURNAROUND: Turnaround = Turnaround {
    min_days: 2,
    max_days: 4,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    #[error("invalid pickup date/time: {0}")]
    InvalidPickup(String),
}

/// Working-day range for a service.
pub fn turnaround(service: Option<ServiceType>) -> Turnaround {
    let (min_days, max_days) = match service {
        Some(ServiceType::CustomStitching) => (3, 5),
        Some(ServiceType::Embroidery) => (4, 7),
        Some(ServiceType::Alteration) => (1, 2),
        Some(ServiceType::RepairAndPatching) => (1, 3),
        Some(ServiceType::SareeFallAndEdging) => (1, 2),
        Some(ServiceType::BlouseDesign) => (3, 5),
        None => return FALLBACK_TURNAROUND,
    };
    Turnaround { min_days, max_days }
}

/// Days from pickup to delivery: the rounded-up midpoint of the range, one
/// day less for express work but never under a day.
pub fn estimated_days(service: Option<ServiceType>, urgency: Urgency) -> u32 {
    let range = turnaround(service);
    let base = (range.min_days + range.max_days).div_ceil(2);
    match urgency {
        Urgency::Express => base.saturating_sub(1).max(1),
        Urgency::Regular => base,
    }
}

/// Estimated delivery date for a pickup at `pickup`.
pub fn estimate(service: Option<ServiceType>, urgency: Urgency, pickup: DateTime<Utc>) -> NaiveDate {
    pickup.date_naive() + Duration::days(i64::from(estimated_days(service, urgency)))
}

/// Estimate from wire labels.
///
/// Unknown service labels use [`FALLBACK_TURNAROUND`] and anything other than
/// express counts as regular. `pickup` is an RFC 3339 timestamp or a plain
/// `YYYY-MM-DD` date.
pub fn estimate_from_labels(service: &str, urgency: &str, pickup: &str) -> Result<NaiveDate, EstimateError> {
    let pickup = parse_pickup(pickup)?;
    let urgency = parse_label::<Urgency>(urgency).unwrap_or(Urgency::Regular);
    Ok(estimate(parse_label::<ServiceType>(service), urgency, pickup))
}

fn parse_pickup(raw: &str) -> Result<DateTime<Utc>, EstimateError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| EstimateError::InvalidPickup(raw.to_string()))
}

/// Start of day (UTC) of a pickup date, or this time tomorrow when no date
/// has been chosen yet.
pub fn pickup_instant(pickup_date: Option<NaiveDate>, now: DateTime<Utc>) -> DateTime<Utc> {
    pickup_date
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .unwrap_or_else(|| now + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn alteration_regular_and_express() {
        assert_eq!(
            estimate_from_labels("Alteration", "Regular", "2025-01-01T00:00:00Z"),
            Ok(date(2025, 1, 3))
        );
        assert_eq!(
            estimate_from_labels("Alteration", "Express", "2025-01-01T00:00:00Z"),
            Ok(date(2025, 1, 2))
        );
    }

    #[test]
    fn embroidery_rounds_midpoint_up() {
        assert_eq!(estimated_days(Some(ServiceType::Embroidery), Urgency::Regular), 6);
        assert_eq!(
            estimate_from_labels("Embroidery", "Regular", "2025-01-01T00:00:00Z"),
            Ok(date(2025, 1, 7))
        );
    }

    #[test]
    fn express_never_goes_below_one_day() {
        for service in ServiceType::ALL {
            assert!(estimated_days(Some(service), Urgency::Express) >= 1);
        }
        assert_eq!(estimated_days(Some(ServiceType::SareeFallAndEdging), Urgency::Express), 1);
    }

    #[test]
    fn unknown_service_uses_fallback_range() {
        assert_eq!(turnaround(None), FALLBACK_TURNAROUND);
        // ceil((2 + 4) / 2) = 3
        assert_eq!(
            estimate_from_labels("Smocking", "Regular", "2025-01-01T00:00:00Z"),
            Ok(date(2025, 1, 4))
        );
        assert_eq!(
            estimate_from_labels("Smocking", "whenever", "2025-01-01"),
            Ok(date(2025, 1, 4))
        );
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        assert_eq!(
            estimate_from_labels("Custom Stitching", "Regular", "2024-12-30T18:30:00Z"),
            Ok(date(2025, 1, 3))
        );
        assert_eq!(
            estimate_from_labels("Blouse Design", "Express", "2024-02-27"),
            Ok(date(2024, 3, 1))
        );
    }

    #[test]
    fn rejects_unparsable_pickup() {
        assert!(matches!(
            estimate_from_labels("Alteration", "Regular", "next tuesday"),
            Err(EstimateError::InvalidPickup(_))
        ));
    }

    #[test]
    fn pickup_defaults_to_tomorrow() {
        let now = "2025-03-10T09:15:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(pickup_instant(None, now).date_naive(), date(2025, 3, 11));
        assert_eq!(pickup_instant(Some(date(2025, 4, 1)), now).date_naive(), date(2025, 4, 1));
    }
}

//! Read-only content feeds: the services catalog and customer testimonials.

use std::path::Path;

use tracing::{info, warn};

use crate::estimator::turnaround;
use crate::models::{ServiceCatalogEntry, ServiceType, Testimonial};

/// One catalog entry per service, with its turnaround range.
pub fn services_catalog() -> Vec<ServiceCatalogEntry> {
    ServiceType::ALL
        .into_iter()
        .map(|service| ServiceCatalogEntry {
            name: service.label(),
            slug: service.slug(),
            detail_key: service.detail_key(),
            turnaround: turnaround(Some(service)),
        })
        .collect()
}

/// Load testimonials from a JSON array on disk.
///
/// The feed is decorative; a missing or malformed file logs a warning and
/// yields an empty list instead of failing startup.
pub fn load_testimonials(path: &Path) -> Vec<Testimonial> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Testimonials unavailable at {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<Testimonial>>(&raw) {
        Ok(testimonials) => {
            info!("Loaded {} testimonials from {}", testimonials.len(), path.display());
            testimonials
        }
        Err(e) => {
            warn!("Ignoring malformed testimonials file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

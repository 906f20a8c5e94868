//! HTTP route modules.
//!
//! - `enquiry`: enquiry submission and liveness probe
//! - `catalog`: read-only services and testimonials feeds

pub mod catalog;
pub mod enquiry;

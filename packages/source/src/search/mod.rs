//! Web search backends implementing [`EvidenceSource`](crate::EvidenceSource).
//!
//! Which backend is used is decided by the service registry, not by the
//! caller; every backend returns plain [`EvidenceItem`]s.
//!
//! [`EvidenceItem`]: flood_risk_assessment_models::EvidenceItem

pub mod google;
pub mod serpapi;

/// Reads a string field, treating blank strings as absent.
fn text_field(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

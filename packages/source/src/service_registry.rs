//! Compile-time registry of external service configurations.
//!
//! Each upstream service is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`enabled_services`].

use serde::Deserialize;

/// An external service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Unique identifier (e.g., `"fema_nfhl"`, `"serpapi"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Preference among services with the same role; lower wins.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// FEMA National Flood Hazard Layer query endpoint.
    FemaNfhl {
        /// Layer query URL.
        base_url: String,
    },
    /// Nominatim / `OpenStreetMap` geocoder.
    Nominatim {
        /// Instance root URL.
        base_url: String,
    },
    /// National Weather Service alerts API.
    NwsAlerts {
        /// API root URL.
        base_url: String,
    },
    /// `SerpApi` web search.
    SerpApi {
        /// Search endpoint URL.
        base_url: String,
        /// Search engine to query through `SerpApi`.
        engine: String,
        /// Environment variable holding the API key.
        api_key_env: String,
    },
    /// Google Programmable Search.
    GoogleCustomSearch {
        /// Search endpoint URL.
        base_url: String,
        /// Environment variable holding the API key.
        api_key_env: String,
        /// Environment variable holding the search engine ID (`cx`).
        engine_id_env: String,
    },
}

/// What a service is used for in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    /// Flood hazard zone lookup.
    Hazard,
    /// Reverse and ZIP geocoding.
    Geocoding,
    /// Active weather alerts.
    Alerts,
    /// Historical evidence search.
    Evidence,
}

const fn default_true() -> bool {
    true
}

impl ProviderConfig {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match self {
            Self::FemaNfhl { base_url }
            | Self::Nominatim { base_url }
            | Self::NwsAlerts { base_url }
            | Self::SerpApi { base_url, .. }
            | Self::GoogleCustomSearch { base_url, .. } => base_url,
        }
    }

    /// Returns the role this provider fills.
    #[must_use]
    pub const fn role(&self) -> ServiceRole {
        match self {
            Self::FemaNfhl { .. } => ServiceRole::Hazard,
            Self::Nominatim { .. } => ServiceRole::Geocoding,
            Self::NwsAlerts { .. } => ServiceRole::Alerts,
            Self::SerpApi { .. } | Self::GoogleCustomSearch { .. } => ServiceRole::Evidence,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("fema_nfhl", include_str!("../services/fema_nfhl.toml")),
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("nws_alerts", include_str!("../services/nws_alerts.toml")),
    ("serpapi", include_str!("../services/serpapi.toml")),
    ("google_search", include_str!("../services/google_search.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 5;

/// Returns all service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<ServiceConfig> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<ServiceConfig> {
    let mut services: Vec<ServiceConfig> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Returns enabled services filling `role`, sorted by priority.
#[must_use]
pub fn services_for(role: ServiceRole) -> Vec<ServiceConfig> {
    enabled_services()
        .into_iter()
        .filter(|s| s.provider.role() == role)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                svc.provider.base_url().starts_with("https://"),
                "Service {} has no https base_url",
                svc.id
            );
        }
    }

    #[test]
    fn every_role_has_a_service() {
        for role in [
            ServiceRole::Hazard,
            ServiceRole::Geocoding,
            ServiceRole::Alerts,
            ServiceRole::Evidence,
        ] {
            assert!(!services_for(role).is_empty(), "No service for {role:?}");
        }
    }

    #[test]
    fn evidence_services_sorted_by_priority() {
        let services = services_for(ServiceRole::Evidence);
        assert_eq!(services[0].id, "serpapi");
        for window in services.windows(2) {
            assert!(window[0].priority <= window[1].priority);
        }
    }
}

//! Builds concrete source clients from the service registry.

use std::sync::Arc;

use crate::nfhl::NfhlClient;
use crate::nominatim::NominatimClient;
use crate::nws::NwsClient;
use crate::search::google::GoogleSearchClient;
use crate::search::serpapi::SerpApiClient;
use crate::service_registry::{ProviderConfig, ServiceConfig, enabled_services};
use crate::{AlertSource, EvidenceSource, Geocoder, HazardSource};

/// One client per role. A role is `None` when no enabled service could be
/// configured for it.
#[derive(Clone, Default)]
pub struct SourceClients {
    /// Flood hazard registry.
    pub hazard: Option<Arc<dyn HazardSource>>,
    /// Reverse and ZIP geocoder.
    pub geocoder: Option<Arc<dyn Geocoder>>,
    /// Weather alert feed.
    pub alerts: Option<Arc<dyn AlertSource>>,
    /// Historical evidence search.
    pub evidence: Option<Arc<dyn EvidenceSource>>,
}

impl SourceClients {
    /// Builds clients for all enabled services, reading API keys from the
    /// process environment.
    #[must_use]
    pub fn from_env(client: &reqwest::Client) -> Self {
        Self::from_services(client, &enabled_services(), |key| std::env::var(key).ok())
    }

    /// Builds clients for `services` (assumed sorted by priority), looking
    /// up API keys through `env`.
    ///
    /// The first usable service for each role wins. Search backends whose
    /// credentials are missing are skipped with a warning.
    #[must_use]
    pub fn from_services(
        client: &reqwest::Client,
        services: &[ServiceConfig],
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut clients = Self::default();

        for service in services.iter().filter(|s| s.enabled) {
            match &service.provider {
                ProviderConfig::FemaNfhl { base_url } => {
                    if clients.hazard.is_none() {
                        clients.hazard =
                            Some(Arc::new(NfhlClient::new(client.clone(), base_url.clone())));
                    }
                }
                ProviderConfig::Nominatim { base_url } => {
                    if clients.geocoder.is_none() {
                        clients.geocoder = Some(Arc::new(NominatimClient::new(
                            client.clone(),
                            base_url,
                        )));
                    }
                }
                ProviderConfig::NwsAlerts { base_url } => {
                    if clients.alerts.is_none() {
                        clients.alerts = Some(Arc::new(NwsClient::new(client.clone(), base_url)));
                    }
                }
                ProviderConfig::SerpApi {
                    base_url,
                    engine,
                    api_key_env,
                } => {
                    if clients.evidence.is_some() {
                        continue;
                    }
                    let Some(api_key) = non_empty(env(api_key_env)) else {
                        log::warn!("Skipping {}: {api_key_env} is not set", service.name);
                        continue;
                    };
                    clients.evidence = Some(Arc::new(SerpApiClient::new(
                        client.clone(),
                        base_url.clone(),
                        engine.clone(),
                        api_key,
                    )));
                }
                ProviderConfig::GoogleCustomSearch {
                    base_url,
                    api_key_env,
                    engine_id_env,
                } => {
                    if clients.evidence.is_some() {
                        continue;
                    }
                    let (Some(api_key), Some(engine_id)) =
                        (non_empty(env(api_key_env)), non_empty(env(engine_id_env)))
                    else {
                        log::warn!(
                            "Skipping {}: {api_key_env} and {engine_id_env} must both be set",
                            service.name
                        );
                        continue;
                    };
                    clients.evidence = Some(Arc::new(GoogleSearchClient::new(
                        client.clone(),
                        base_url.clone(),
                        api_key,
                        engine_id,
                    )));
                }
            }
        }

        if clients.evidence.is_none() {
            log::warn!("No historical evidence search backend configured");
        }

        clients
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn build(vars: &[(&str, &str)]) -> SourceClients {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SourceClients::from_services(&reqwest::Client::new(), &enabled_services(), |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn keyless_services_always_configured() {
        let clients = build(&[]);
        assert!(clients.hazard.is_some());
        assert!(clients.geocoder.is_some());
        assert!(clients.alerts.is_some());
        assert!(clients.evidence.is_none());
    }

    #[test]
    fn serpapi_preferred_when_key_present() {
        let clients = build(&[
            ("SERPAPI_API_KEY", "serp"),
            ("GOOGLE_SEARCH_API_KEY", "g"),
            ("GOOGLE_SEARCH_ENGINE_ID", "cx"),
        ]);
        assert_eq!(clients.evidence.unwrap().id(), "serpapi");
    }

    #[test]
    fn falls_back_to_google_search() {
        let clients = build(&[
            ("SERPAPI_API_KEY", " "),
            ("GOOGLE_SEARCH_API_KEY", "g"),
            ("GOOGLE_SEARCH_ENGINE_ID", "cx"),
        ]);
        assert_eq!(clients.evidence.unwrap().id(), "google_search");
    }

    #[test]
    fn google_requires_both_variables() {
        let clients = build(&[("GOOGLE_SEARCH_API_KEY", "g")]);
        assert!(clients.evidence.is_none());
    }
}

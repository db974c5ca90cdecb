//! Evidence gathering across the enrichment sources.
//!
//! Every lookup absorbs its own failure: an unreachable or unconfigured
//! source is logged at `warn` and recorded as unavailable, never
//! returned as an error.

use flood_risk_assessment_models::{
    Coordinates, EvidenceSet, HazardProfile, Location, Query, SourceReport, WeatherAlert,
};
use flood_risk_source::clients::SourceClients;
use flood_risk_source::evidence::{fetch_evidence, place_hint};

/// Everything the prompts are built from.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    /// Point used for point-based sources.
    pub point: Option<Coordinates>,
    /// Hazard profile, if the registry answered with one.
    pub hazard: Option<HazardProfile>,
    /// Human-readable place name.
    pub place_name: Option<String>,
    /// Historical evidence, empty when unavailable.
    pub evidence: EvidenceSet,
    /// Active flood alerts.
    pub alerts: Vec<WeatherAlert>,
    /// Whether the alert feed answered.
    pub alerts_available: bool,
}

impl Lookups {
    /// Per-source availability.
    #[must_use]
    pub fn report(&self) -> SourceReport {
        SourceReport {
            location_resolved: self.point.is_some(),
            hazard_available: self.hazard.is_some(),
            evidence_available: !self.evidence.is_empty(),
            alerts_available: self.alerts_available,
            place_name: self.place_name.clone(),
        }
    }

    /// Returns `true` when any enrichment was missing.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.point.is_none()
            || self.hazard.is_none()
            || self.evidence.is_empty()
            || !self.alerts_available
    }
}

/// Resolves the query's point, then runs the hazard, place name plus
/// evidence and alert lookups concurrently.
pub async fn gather(sources: &SourceClients, query: &Query) -> Lookups {
    let point = resolve_point(sources, query.location()).await;

    let (hazard, (place_name, evidence), (alerts, alerts_available)) = futures::join!(
        lookup_hazard(sources, point),
        lookup_evidence(sources, query.location(), point),
        lookup_alerts(sources, point),
    );

    Lookups {
        point,
        hazard,
        place_name,
        evidence,
        alerts,
        alerts_available,
    }
}

async fn resolve_point(sources: &SourceClients, location: &Location) -> Option<Coordinates> {
    let zip = match location {
        Location::Coordinates(coords) => return Some(*coords),
        Location::ZipCode { zip } => zip,
    };

    let Some(geocoder) = &sources.geocoder else {
        log::warn!("No geocoder configured; cannot locate ZIP code {zip}");
        return None;
    };

    match geocoder.locate_zip(zip).await {
        Ok(Some(point)) => {
            log::debug!("ZIP code {zip} located at {point}");
            Some(point)
        }
        Ok(None) => {
            log::warn!("Geocoder found no location for ZIP code {zip}");
            None
        }
        Err(e) => {
            log::warn!("Geocoding ZIP code {zip} failed: {e}");
            None
        }
    }
}

async fn lookup_hazard(sources: &SourceClients, point: Option<Coordinates>) -> Option<HazardProfile> {
    let point = point?;
    let Some(hazard) = &sources.hazard else {
        log::warn!("No hazard registry configured");
        return None;
    };

    match hazard.hazard_profile(point).await {
        Ok(Some(profile)) if !profile.is_empty() => {
            log::debug!("Hazard profile for {point}: {profile:?}");
            Some(profile)
        }
        Ok(_) => {
            log::warn!("Hazard registry has no flood zone data for {point}");
            None
        }
        Err(e) => {
            log::warn!("Hazard lookup for {point} failed: {e}");
            None
        }
    }
}

async fn lookup_place_name(sources: &SourceClients, point: Option<Coordinates>) -> Option<String> {
    let point = point?;
    let geocoder = sources.geocoder.as_ref()?;

    match geocoder.place_name(point).await {
        Ok(name) => name,
        Err(e) => {
            log::warn!("Reverse geocoding {point} failed: {e}");
            None
        }
    }
}

async fn lookup_evidence(
    sources: &SourceClients,
    location: &Location,
    point: Option<Coordinates>,
) -> (Option<String>, EvidenceSet) {
    let place_name = lookup_place_name(sources, point).await;

    let Some(source) = &sources.evidence else {
        log::warn!("No evidence search backend configured");
        return (place_name, EvidenceSet::empty());
    };

    let place = place_hint(location, place_name.as_deref());
    let evidence = match fetch_evidence(source.as_ref(), &place).await {
        Ok(set) => {
            if set.is_empty() {
                log::warn!("No historical flood evidence found near {place}");
            }
            set
        }
        Err(e) => {
            log::warn!("Evidence search via {} failed: {e}", source.id());
            EvidenceSet::empty()
        }
    };

    (place_name, evidence)
}

async fn lookup_alerts(
    sources: &SourceClients,
    point: Option<Coordinates>,
) -> (Vec<WeatherAlert>, bool) {
    let Some(point) = point else {
        return (Vec::new(), false);
    };
    let Some(alerts) = &sources.alerts else {
        log::warn!("No weather alert feed configured");
        return (Vec::new(), false);
    };

    match alerts.active_flood_alerts(point).await {
        Ok(active) => {
            log::debug!("{} active flood alert(s) for {point}", active.len());
            (active, true)
        }
        Err(e) => {
            log::warn!("Weather alert lookup for {point} failed: {e}");
            (Vec::new(), false)
        }
    }
}

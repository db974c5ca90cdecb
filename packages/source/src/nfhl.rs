//! FEMA National Flood Hazard Layer client.
//!
//! Runs a point-in-polygon query against the NFHL flood hazard zones
//! layer (`ArcGIS` `MapServer` layer 28) and reads the zone attributes of
//! the first intersecting feature.
//!
//! See <https://hazards.fema.gov/femaportal/wps/portal/NFHLWMS>

use async_trait::async_trait;
use flood_risk_assessment_models::{Coordinates, HazardProfile};

use crate::{HazardSource, SourceError, http};

/// Attributes requested from the hazard layer.
const OUT_FIELDS: &str = "FLD_ZONE,ZONE_SUBTY,SFHA_TF,STATIC_BFE";

/// NFHL uses `-9999` for "no base flood elevation".
const NO_BFE_SENTINEL: f64 = -9999.0;

/// Client for the NFHL flood hazard zones query endpoint.
pub struct NfhlClient {
    client: reqwest::Client,
    base_url: String,
}

impl NfhlClient {
    /// Creates a client for the layer query endpoint at `base_url`
    /// (ending in `/MapServer/28/query`).
    #[must_use]
    pub const fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl HazardSource for NfhlClient {
    async fn hazard_profile(
        &self,
        point: Coordinates,
    ) -> Result<Option<HazardProfile>, SourceError> {
        let geometry = format!("{},{}", point.longitude(), point.latitude());

        let body = http::send_json(self.client.get(&self.base_url).query(&[
            ("geometry", geometry.as_str()),
            ("geometryType", "esriGeometryPoint"),
            ("inSR", "4326"),
            ("spatialRel", "esriSpatialRelIntersects"),
            ("outFields", OUT_FIELDS),
            ("returnGeometry", "false"),
            ("f", "json"),
        ]))
        .await?;

        parse_response(&body)
    }
}

/// Parses an `ArcGIS` query response into a hazard profile.
fn parse_response(body: &serde_json::Value) -> Result<Option<HazardProfile>, SourceError> {
    // ArcGIS reports errors with HTTP 200 and an `error` object
    if let Some(error) = body.get("error") {
        return Err(SourceError::Response {
            message: format!(
                "ArcGIS API error: {}",
                error["message"].as_str().unwrap_or("unknown error")
            ),
        });
    }

    let features = body["features"]
        .as_array()
        .ok_or_else(|| SourceError::Response {
            message: "No features array in NFHL response".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let attrs = &first["attributes"];

    let profile = HazardProfile {
        flood_zone: non_empty_str(&attrs["FLD_ZONE"]),
        zone_subtype: non_empty_str(&attrs["ZONE_SUBTY"]),
        base_flood_elevation_feet: attrs["STATIC_BFE"]
            .as_f64()
            .filter(|bfe| *bfe > NO_BFE_SENTINEL),
        is_special_hazard_area: match attrs["SFHA_TF"].as_str().map(str::trim) {
            Some("T") => Some(true),
            Some("F") => Some(false),
            _ => None,
        },
    };

    Ok(if profile.is_empty() { None } else { Some(profile) })
}

fn non_empty_str(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

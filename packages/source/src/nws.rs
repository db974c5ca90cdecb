//! National Weather Service active alerts client.
//!
//! Reads `GET /alerts/active?point={lat},{lon}` and keeps only the
//! alerts whose event name contains `"Flood"` (Flood Warning, Flash Flood
//! Watch, Coastal Flood Advisory, ...). The match is a case-sensitive
//! substring test against the feed's own event vocabulary.
//!
//! See <https://www.weather.gov/documentation/services-web-api>

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flood_risk_assessment_models::{Coordinates, WeatherAlert};
use serde::Deserialize;

use crate::{AlertSource, SourceError, http};

/// Substring an event name must contain to count as flood-related.
const FLOOD_EVENT_MARKER: &str = "Flood";

#[derive(Debug, Deserialize)]
struct AlertResponse {
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertProperties {
    event: String,
    headline: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    area_desc: Option<String>,
    expires: Option<String>,
}

/// NWS alerts API client.
pub struct NwsClient {
    client: reqwest::Client,
    base_url: String,
}

impl NwsClient {
    /// Creates a client for the API rooted at `base_url` (e.g.
    /// `"https://api.weather.gov"`).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AlertSource for NwsClient {
    async fn active_flood_alerts(
        &self,
        point: Coordinates,
    ) -> Result<Vec<WeatherAlert>, SourceError> {
        // The API redirects requests with more than four decimal places
        let point_param = format!("{:.4},{:.4}", point.latitude(), point.longitude());

        let body = http::send_json(
            self.client
                .get(format!("{}/alerts/active", self.base_url))
                .header(reqwest::header::ACCEPT, "application/geo+json")
                .query(&[("point", point_param.as_str())]),
        )
        .await?;

        parse_response(body)
    }
}

fn parse_response(body: serde_json::Value) -> Result<Vec<WeatherAlert>, SourceError> {
    let response: AlertResponse = serde_json::from_value(body)?;

    Ok(response
        .features
        .into_iter()
        .map(|f| f.properties)
        .filter(|p| p.event.contains(FLOOD_EVENT_MARKER))
        .map(|p| WeatherAlert {
            title: p
                .headline
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| p.event.clone()),
            description: p.description.unwrap_or_default(),
            severity: p.severity.unwrap_or_default(),
            area_description: p.area_desc.unwrap_or_default(),
            expires: p
                .expires
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_flood_events() {
        let body = serde_json::json!({
            "features": [
                {
                    "properties": {
                        "event": "Flash Flood Warning",
                        "headline": "Flash Flood Warning issued for Fairfax County",
                        "description": "Heavy rain will cause flash flooding.",
                        "severity": "Severe",
                        "areaDesc": "Fairfax, VA",
                        "expires": "2026-10-16T18:00:00-04:00"
                    }
                },
                {
                    "properties": {
                        "event": "Heat Advisory",
                        "headline": "Heat Advisory",
                        "severity": "Moderate",
                        "areaDesc": "Fairfax, VA"
                    }
                },
                {
                    "properties": {
                        "event": "Coastal Flood Advisory",
                        "headline": null,
                        "severity": "Minor",
                        "areaDesc": "Anne Arundel, MD",
                        "expires": null
                    }
                }
            ]
        });

        let alerts = parse_response(body).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(
            alerts[0].title,
            "Flash Flood Warning issued for Fairfax County"
        );
        assert_eq!(
            alerts[0].expires.unwrap().to_rfc3339(),
            "2026-10-16T22:00:00+00:00"
        );
        assert_eq!(alerts[1].title, "Coastal Flood Advisory");
        assert_eq!(alerts[1].description, "");
        assert_eq!(alerts[1].expires, None);
    }

    #[test]
    fn flood_match_is_case_sensitive() {
        let body = serde_json::json!({
            "features": [{
                "properties": { "event": "flood statement (test)" }
            }]
        });
        assert!(parse_response(body).unwrap().is_empty());
    }

    #[test]
    fn malformed_feed_is_error() {
        let body = serde_json::json!({ "type": "FeatureCollection" });
        assert!(parse_response(body).is_err());
    }
}

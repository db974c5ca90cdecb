//! Nominatim / OpenStreetMap geocoder client.
//!
//! Reverse geocoding turns a point into a place name for the historical
//! evidence search (named places produce far better search results than
//! raw coordinates). Postal code search gives ZIP-only queries a point
//! for the hazard and weather lookups.
//!
//! The public instance allows **1 request per second** and requires an
//! identifying `User-Agent`.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use async_trait::async_trait;
use flood_risk_assessment_models::{Coordinates, ZipCode};

use crate::{Geocoder, SourceError, http};

/// Address keys tried, in order, for the locality part of a place name.
const LOCALITY_KEYS: &[&str] = &["city", "town", "village", "hamlet", "suburb", "county"];

/// Nominatim API client.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Creates a client for the instance rooted at `base_url` (e.g.
    /// `"https://nominatim.openstreetmap.org"`).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn place_name(&self, point: Coordinates) -> Result<Option<String>, SourceError> {
        let lat = point.latitude().to_string();
        let lon = point.longitude().to_string();

        let body = http::send_json(
            self.client
                .get(format!("{}/reverse", self.base_url))
                .query(&[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "jsonv2"),
                    ("zoom", "10"),
                    ("addressdetails", "1"),
                ]),
        )
        .await?;

        Ok(parse_reverse_response(&body))
    }

    async fn locate_zip(&self, zip: &ZipCode) -> Result<Option<Coordinates>, SourceError> {
        let body = http::send_json(
            self.client
                .get(format!("{}/search", self.base_url))
                .query(&[
                    ("postalcode", zip.as_str()),
                    ("countrycodes", "us"),
                    ("format", "jsonv2"),
                    ("limit", "1"),
                ]),
        )
        .await?;

        parse_search_response(&body)
    }
}

/// Builds `"{locality}, {state}"` from a reverse geocoding response,
/// falling back to `display_name`.
fn parse_reverse_response(body: &serde_json::Value) -> Option<String> {
    if body.get("error").is_some() {
        return None;
    }

    let address = &body["address"];
    let locality = LOCALITY_KEYS
        .iter()
        .find_map(|key| address[*key].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let state = address["state"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (locality, state) {
        (Some(locality), Some(state)) => Some(format!("{locality}, {state}")),
        (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
        (None, None) => body["display_name"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    }
}

/// Parses the first hit of a search response into a point.
fn parse_search_response(body: &serde_json::Value) -> Result<Option<Coordinates>, SourceError> {
    let results = body.as_array().ok_or_else(|| SourceError::Response {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SourceError::Response {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SourceError::Response {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Coordinates::new(lat, lon)
        .map(Some)
        .map_err(|e| SourceError::Response {
            message: format!("Nominatim returned an invalid point: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_prefers_city_and_state() {
        let body = serde_json::json!({
            "display_name": "Penn Quarter, Washington, District of Columbia, 20004, United States",
            "address": {
                "city": "Washington",
                "state": "District of Columbia",
                "postcode": "20004"
            }
        });
        assert_eq!(
            parse_reverse_response(&body).as_deref(),
            Some("Washington, District of Columbia")
        );
    }

    #[test]
    fn reverse_falls_back_to_town_then_display_name() {
        let town = serde_json::json!({
            "address": { "town": "Ellicott City", "state": "Maryland" }
        });
        assert_eq!(
            parse_reverse_response(&town).as_deref(),
            Some("Ellicott City, Maryland")
        );

        let display_only = serde_json::json!({
            "display_name": "Gulf of Mexico",
            "address": {}
        });
        assert_eq!(
            parse_reverse_response(&display_only).as_deref(),
            Some("Gulf of Mexico")
        );
    }

    #[test]
    fn reverse_error_is_none() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert_eq!(parse_reverse_response(&body), None);
    }

    #[test]
    fn parses_zip_search_result() {
        let body = serde_json::json!([{
            "lat": "38.9120",
            "lon": "-77.0190",
            "display_name": "20001, Washington, District of Columbia, United States"
        }]);
        let point = parse_search_response(&body).unwrap().unwrap();
        assert!((point.latitude() - 38.912).abs() < 1e-6);
        assert!((point.longitude() - -77.019).abs() < 1e-6);
    }

    #[test]
    fn zip_search_empty_is_none() {
        let body = serde_json::json!([]);
        assert!(parse_search_response(&body).unwrap().is_none());
    }
}

//! Turns raw location and depth input into a canonical [`Query`].
//!
//! Pure functions with no I/O. All string fields are trimmed before
//! parsing; blank strings count as missing.

use serde::Deserialize;

use crate::{Coordinates, Location, Query, ValidationError, ZipCode};

/// Raw location input as collected by a form or CLI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocationInput {
    /// Latitude as typed.
    pub latitude: Option<String>,
    /// Longitude as typed.
    pub longitude: Option<String>,
    /// ZIP code as typed.
    pub zip_code: Option<String>,
    /// Flood depth in feet as typed.
    pub depth: Option<String>,
}

/// Normalizes a coordinate-based request.
///
/// # Errors
///
/// Returns [`ValidationError`] if any field is blank, does not parse as a
/// finite number, or is out of range.
pub fn normalize_coordinates(
    raw_lat: &str,
    raw_lon: &str,
    raw_depth: &str,
) -> Result<Query, ValidationError> {
    let latitude = parse_number("latitude", raw_lat)?;
    let longitude = parse_number("longitude", raw_lon)?;
    let depth = parse_number("depth", raw_depth)?;
    Query::new(
        Location::Coordinates(Coordinates::new(latitude, longitude)?),
        depth,
    )
}

/// Normalizes a ZIP-code-based request.
///
/// # Errors
///
/// Returns [`ValidationError`] if the ZIP code is blank or malformed, or
/// the depth is invalid.
pub fn normalize_zip(raw_zip: &str, raw_depth: &str) -> Result<Query, ValidationError> {
    if raw_zip.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "zip code" });
    }
    let zip = ZipCode::parse(raw_zip)?;
    let depth = parse_number("depth", raw_depth)?;
    Query::new(Location::ZipCode { zip }, depth)
}

/// Normalizes a form submission that may carry coordinates, a ZIP code,
/// or both.
///
/// Coordinates take precedence when both are given. Supplying only one
/// of latitude/longitude is an inconsistency even when a ZIP code is
/// present.
///
/// # Errors
///
/// Returns [`ValidationError`] if the depth is missing, the location
/// fields are inconsistent, or any field fails validation.
pub fn normalize_input(input: &RawLocationInput) -> Result<Query, ValidationError> {
    let latitude = present(input.latitude.as_deref());
    let longitude = present(input.longitude.as_deref());
    let zip = present(input.zip_code.as_deref());
    let depth =
        present(input.depth.as_deref()).ok_or(ValidationError::MissingField { field: "depth" })?;

    match (latitude, longitude, zip) {
        (Some(lat), Some(lon), _) => normalize_coordinates(lat, lon, depth),
        (Some(_), None, _) | (None, Some(_), _) => Err(ValidationError::InconsistentLocation {
            message: "latitude and longitude must be provided together",
        }),
        (None, None, Some(zip)) => normalize_zip(zip, depth),
        (None, None, None) => Err(ValidationError::InconsistentLocation {
            message: "enter either a ZIP code or a latitude and longitude",
        }),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::InvalidNumber {
            field,
            value: trimmed.to_string(),
        }),
    }
}

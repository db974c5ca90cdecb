#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core types for the flood risk pipeline.
//!
//! A [`Query`] is the canonical, validated form of a user request (a
//! location plus a hypothetical flood depth) and doubles as the cache key.
//! The remaining types describe the evidence gathered for a query and the
//! final [`RiskAssessment`] handed back to the caller.
//!
//! Raw user input is turned into a [`Query`] by the [`normalize`] module.

pub mod normalize;

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Maximum number of items kept in an [`EvidenceSet`].
pub const MAX_EVIDENCE_ITEMS: usize = 10;

/// Annual flood probability assumed for zones inside the 1% annual chance
/// floodplain (A and V zones).
pub const ONE_PERCENT_ANNUAL_CHANCE: f64 = 0.01;

/// Annual flood probability assumed for moderate-hazard areas (shaded X
/// and B zones).
pub const POINT_TWO_PERCENT_ANNUAL_CHANCE: f64 = 0.002;

/// Annual flood probability assumed for minimal-hazard areas (unshaded X
/// and C zones).
pub const MINIMAL_ANNUAL_CHANCE: f64 = 0.0005;

/// Errors produced while validating raw user input.
///
/// Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A numeric field did not parse as a finite number.
    #[error("{field} must be a number, got \"{value}\"")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value as received.
        value: String,
    },

    /// A numeric field parsed but is outside its valid range.
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The parsed value.
        value: f64,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },

    /// The ZIP code is not a well-formed US ZIP.
    #[error("\"{value}\" is not a valid US ZIP code")]
    InvalidZipCode {
        /// The raw value as received.
        value: String,
    },

    /// The location fields do not describe exactly one location.
    #[error("{message}")]
    InconsistentLocation {
        /// Description of the inconsistency.
        message: &'static str,
    },
}

/// Typed failures returned by the assessment pipeline.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The request was rejected before any external call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The explanation could not be generated.
    #[error("Failed to generate flood risk explanation: {cause}")]
    Generation {
        /// Underlying cause reported by the generation backend.
        cause: String,
    },
}

/// A validated WGS84 point.
///
/// Both components are finite and within range, and negative zero is
/// stored as positive zero so equal points hash equally.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Creates a point, validating latitude in `[-90, 90]` and longitude in
    /// `[-180, 180]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if either component is non-finite or
    /// out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() {
            return Err(ValidationError::InvalidNumber {
                field: "latitude",
                value: latitude.to_string(),
            });
        }
        if !longitude.is_finite() {
            return Err(ValidationError::InvalidNumber {
                field: "longitude",
                value: longitude.to_string(),
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::OutOfRange {
                field: "latitude",
                value: latitude,
                expected: "between -90 and 90",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::OutOfRange {
                field: "longitude",
                value: longitude,
                expected: "between -180 and 180",
            });
        }

        Ok(Self {
            latitude: canonical_zero(latitude),
            longitude: canonical_zero(longitude),
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Coordinates {}

impl Hash for Coordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A five-digit US ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    /// Parses a ZIP (`NNNNN`) or ZIP+4 (`NNNNN-NNNN`) code.
    ///
    /// The +4 suffix is dropped so both forms share one cache key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidZipCode`] if the value is not a
    /// well-formed ZIP code.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let (base, plus_four) = match trimmed.split_once('-') {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (trimmed, None),
        };

        let base_ok = base.len() == 5 && base.bytes().all(|b| b.is_ascii_digit());
        let suffix_ok =
            plus_four.is_none_or(|s| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()));

        if base_ok && suffix_ok {
            Ok(Self(base.to_string()))
        } else {
            Err(ValidationError::InvalidZipCode {
                value: trimmed.to_string(),
            })
        }
    }

    /// The five-digit code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZipCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the user wants to know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Location {
    /// An exact point.
    Coordinates(Coordinates),
    /// A ZIP code area.
    ZipCode {
        /// The ZIP code.
        zip: ZipCode,
    },
}

impl Location {
    /// Returns the point for coordinate locations.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Coordinates(coords) => Some(*coords),
            Self::ZipCode { .. } => None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinates(coords) => write!(f, "coordinates {coords}"),
            Self::ZipCode { zip } => write!(f, "ZIP code {zip}"),
        }
    }
}

/// A validated assessment request and the cache key for its result.
///
/// Immutable once constructed. Equality is exact value equality.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    location: Location,
    depth_feet: f64,
}

impl Query {
    /// Creates a query, validating that the depth is finite and not
    /// negative.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the depth is invalid.
    pub fn new(location: Location, depth_feet: f64) -> Result<Self, ValidationError> {
        if !depth_feet.is_finite() {
            return Err(ValidationError::InvalidNumber {
                field: "depth",
                value: depth_feet.to_string(),
            });
        }
        if depth_feet < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "depth",
                value: depth_feet,
                expected: "zero or greater",
            });
        }

        Ok(Self {
            location,
            depth_feet: canonical_zero(depth_feet),
        })
    }

    /// The requested location.
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// The hypothetical flood depth in feet.
    #[must_use]
    pub const fn depth_feet(&self) -> f64 {
        self.depth_feet
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.depth_feet.to_bits() == other.depth_feet.to_bits()
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
        self.depth_feet.to_bits().hash(state);
    }
}

/// `-0.0 + 0.0` is `+0.0`; every other value is unchanged.
fn canonical_zero(value: f64) -> f64 {
    value + 0.0
}

/// Flood hazard data for a point, as reported by the hazard registry.
///
/// Every field is optional: `None` means the registry did not say, never
/// "no".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardProfile {
    /// Flood zone designation (e.g. `AE`, `X`).
    pub flood_zone: Option<String>,
    /// Zone subtype (e.g. `0.2 PCT ANNUAL CHANCE FLOOD HAZARD`).
    pub zone_subtype: Option<String>,
    /// Base flood elevation in feet.
    pub base_flood_elevation_feet: Option<f64>,
    /// Whether the point is inside a Special Flood Hazard Area.
    pub is_special_hazard_area: Option<bool>,
}

impl HazardProfile {
    /// Returns `true` if the registry reported nothing useful.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flood_zone.is_none()
            && self.zone_subtype.is_none()
            && self.base_flood_elevation_feet.is_none()
            && self.is_special_hazard_area.is_none()
    }

    /// Official annual flood probability implied by the zone designation.
    ///
    /// Returns `None` for undetermined zones (`D`), open water, and
    /// unknown designations.
    #[must_use]
    pub fn annual_probability(&self) -> Option<f64> {
        let zone = self.flood_zone.as_deref()?.trim().to_ascii_uppercase();
        let subtype = self
            .zone_subtype
            .as_deref()
            .unwrap_or_default()
            .to_ascii_uppercase();

        if is_special_hazard_zone(&zone) {
            return Some(ONE_PERCENT_ANNUAL_CHANCE);
        }

        match zone.as_str() {
            "B" => Some(POINT_TWO_PERCENT_ANNUAL_CHANCE),
            "X" if subtype.contains("0.2 PCT") || subtype.contains("LEVEE") => {
                Some(POINT_TWO_PERCENT_ANNUAL_CHANCE)
            }
            "X" | "C" => Some(MINIMAL_ANNUAL_CHANCE),
            _ => None,
        }
    }
}

/// `A`, `A99`, `AE`, `AH`, `AO`, `AR`, `V`, `VE` and the numbered
/// `A1`-`A30` / `V1`-`V30` zones. Other designations starting with `A`
/// (`AREA NOT INCLUDED`) carry no probability.
fn is_special_hazard_zone(zone: &str) -> bool {
    match zone {
        "A" | "A99" | "AE" | "AH" | "AO" | "AR" | "V" | "VE" => true,
        _ => zone
            .strip_prefix('A')
            .or_else(|| zone.strip_prefix('V'))
            .is_some_and(|rest| {
                rest.parse::<u8>()
                    .is_ok_and(|n| (1..=30).contains(&n) && !rest.starts_with('0'))
            }),
    }
}

/// A piece of textual evidence of past flooding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceItem {
    /// Result title.
    pub title: String,
    /// Result snippet, if the search backend returned one.
    pub snippet: Option<String>,
}

/// A deduplicated, bounded collection of [`EvidenceItem`]s.
///
/// Order carries no meaning. Items are unique by title (compared
/// trimmed and case-insensitively), untitled items are dropped, and at
/// most [`MAX_EVIDENCE_ITEMS`] are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EvidenceSet {
    items: Vec<EvidenceItem>,
}

impl EvidenceSet {
    /// Builds a set from raw items, applying dedup and the size cap.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = EvidenceItem>) -> Self {
        let mut seen = std::collections::BTreeSet::new();
        let mut kept = Vec::new();

        for mut item in items {
            if kept.len() >= MAX_EVIDENCE_ITEMS {
                break;
            }
            let title = item.title.trim();
            if title.is_empty() {
                continue;
            }
            if !seen.insert(title.to_lowercase()) {
                continue;
            }
            item.title = title.to_string();
            item.snippet = item
                .snippet
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            kept.push(item);
        }

        Self { items: kept }
    }

    /// An empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Returns `true` if the set has no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterates over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, EvidenceItem> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a EvidenceSet {
    type Item = &'a EvidenceItem;
    type IntoIter = std::slice::Iter<'a, EvidenceItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An active flood-related weather alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    /// Headline, or the event name when no headline is given.
    pub title: String,
    /// Full alert text.
    pub description: String,
    /// Severity as reported by the feed (e.g. `Severe`).
    pub severity: String,
    /// Affected area description.
    pub area_description: String,
    /// When the alert expires.
    pub expires: Option<DateTime<Utc>>,
}

/// Which kind of text the generation backend is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GenerationKind {
    /// The plain-language explanation.
    Explanation,
    /// The 0–5 likelihood rating.
    LikelihoodRating,
}

/// A single request to the text generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Which stage this request belongs to.
    pub kind: GenerationKind,
    /// The full prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// Temperature used for explanations.
    pub const EXPLANATION_TEMPERATURE: f32 = 0.6;
    /// Token budget for explanations.
    pub const EXPLANATION_MAX_TOKENS: u32 = 600;
    /// Rating generation must be deterministic and parseable.
    pub const RATING_TEMPERATURE: f32 = 0.0;
    /// Token budget for ratings.
    pub const RATING_MAX_TOKENS: u32 = 200;

    /// Creates an explanation request.
    #[must_use]
    pub const fn explanation(prompt: String) -> Self {
        Self {
            kind: GenerationKind::Explanation,
            prompt,
            temperature: Self::EXPLANATION_TEMPERATURE,
            max_output_tokens: Self::EXPLANATION_MAX_TOKENS,
        }
    }

    /// Creates a likelihood rating request.
    #[must_use]
    pub const fn likelihood_rating(prompt: String) -> Self {
        Self {
            kind: GenerationKind::LikelihoodRating,
            prompt,
            temperature: Self::RATING_TEMPERATURE,
            max_output_tokens: Self::RATING_MAX_TOKENS,
        }
    }
}

/// Likelihood of flooding at the requested depth, 0 (highly unlikely)
/// to 5 (definitive).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr,
)]
#[serde(into = "u8")]
pub enum LikelihoodRating {
    /// 0
    #[strum(to_string = "Highly unlikely")]
    HighlyUnlikely = 0,
    /// 1
    #[strum(to_string = "Unlikely")]
    Unlikely = 1,
    /// 2
    #[strum(to_string = "Possible")]
    Possible = 2,
    /// 3
    #[strum(to_string = "Likely")]
    Likely = 3,
    /// 4
    #[strum(to_string = "Highly likely")]
    HighlyLikely = 4,
    /// 5
    #[strum(to_string = "Definitive")]
    Definitive = 5,
}

impl LikelihoodRating {
    /// All ratings in ascending order.
    pub const ALL: [Self; 6] = [
        Self::HighlyUnlikely,
        Self::Unlikely,
        Self::Possible,
        Self::Likely,
        Self::HighlyLikely,
        Self::Definitive,
    ];

    /// Returns the numeric value of this rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a rating from its numeric value, or `None` outside `0..=5`.
    #[must_use]
    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::HighlyUnlikely),
            1 => Some(Self::Unlikely),
            2 => Some(Self::Possible),
            3 => Some(Self::Likely),
            4 => Some(Self::HighlyLikely),
            5 => Some(Self::Definitive),
            _ => None,
        }
    }
}

impl From<LikelihoodRating> for u8 {
    fn from(rating: LikelihoodRating) -> Self {
        rating.value()
    }
}

/// Which enrichment sources contributed to an assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    /// A point was available for point-based lookups.
    pub location_resolved: bool,
    /// The hazard registry returned a profile.
    pub hazard_available: bool,
    /// At least one historical evidence item was found.
    pub evidence_available: bool,
    /// The weather alert feed answered (possibly with no alerts).
    pub alerts_available: bool,
    /// Human-readable place name used for the evidence search.
    pub place_name: Option<String>,
}

/// The pipeline's final output for a [`Query`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Plain-language explanation of what the flood depth means.
    pub explanation_text: String,
    /// Likelihood rating, absent if it could not be generated or parsed.
    pub likelihood_rating: Option<LikelihoodRating>,
    /// Short justification accompanying the rating.
    pub likelihood_explanation: Option<String>,
    /// `true` when any enrichment source was unavailable.
    pub degraded: bool,
    /// Hazard profile used for the prompts.
    pub hazard_profile: Option<HazardProfile>,
    /// Active flood alerts used for the rating prompt.
    pub alerts: Vec<WeatherAlert>,
    /// Per-source availability.
    pub sources: SourceReport,
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn negative_zero_shares_cache_key() {
        let a = Query::new(Location::Coordinates(Coordinates::new(-0.0, 10.0).unwrap()), -0.0)
            .unwrap();
        let b =
            Query::new(Location::Coordinates(Coordinates::new(0.0, 10.0).unwrap()), 0.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(
            Coordinates::new(91.0, 0.0),
            Err(ValidationError::OutOfRange {
                field: "latitude",
                ..
            })
        ));
        assert!(matches!(
            Coordinates::new(0.0, -180.5),
            Err(ValidationError::OutOfRange {
                field: "longitude",
                ..
            })
        ));
        assert!(Coordinates::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn zip_plus_four_collapses_to_five_digits() {
        assert_eq!(ZipCode::parse(" 20001-1234 ").unwrap().as_str(), "20001");
        assert!(ZipCode::parse("2000").is_err());
        assert!(ZipCode::parse("20001-12").is_err());
        assert!(ZipCode::parse("abcde").is_err());
    }

    #[test]
    fn evidence_set_dedupes_and_caps() {
        let mut items = vec![
            EvidenceItem {
                title: "River floods downtown".to_string(),
                snippet: Some("  ".to_string()),
            },
            EvidenceItem {
                title: " river floods DOWNTOWN ".to_string(),
                snippet: Some("duplicate".to_string()),
            },
            EvidenceItem {
                title: "   ".to_string(),
                snippet: Some("untitled".to_string()),
            },
        ];
        for i in 0..20 {
            items.push(EvidenceItem {
                title: format!("Report {i}"),
                snippet: None,
            });
        }

        let set = EvidenceSet::from_items(items);
        assert_eq!(set.len(), MAX_EVIDENCE_ITEMS);
        let first = set.iter().next().unwrap();
        assert_eq!(first.title, "River floods downtown");
        assert_eq!(first.snippet, None);
        assert_eq!(
            set.iter()
                .filter(|i| i.title.eq_ignore_ascii_case("river floods downtown"))
                .count(),
            1
        );
    }

    #[test]
    fn zone_annual_probabilities() {
        let profile = |zone: &str, subtype: Option<&str>| HazardProfile {
            flood_zone: Some(zone.to_string()),
            zone_subtype: subtype.map(String::from),
            ..HazardProfile::default()
        };

        assert_eq!(
            profile("AE", None).annual_probability(),
            Some(ONE_PERCENT_ANNUAL_CHANCE)
        );
        assert_eq!(
            profile("VE", None).annual_probability(),
            Some(ONE_PERCENT_ANNUAL_CHANCE)
        );
        assert_eq!(
            profile("X", Some("0.2 PCT ANNUAL CHANCE FLOOD HAZARD")).annual_probability(),
            Some(POINT_TWO_PERCENT_ANNUAL_CHANCE)
        );
        assert_eq!(
            profile("X", Some("AREA OF MINIMAL FLOOD HAZARD")).annual_probability(),
            Some(MINIMAL_ANNUAL_CHANCE)
        );
        assert_eq!(
            profile("A12", None).annual_probability(),
            Some(ONE_PERCENT_ANNUAL_CHANCE)
        );
        assert_eq!(profile("D", None).annual_probability(), None);
        assert_eq!(profile("AREA NOT INCLUDED", None).annual_probability(), None);
        assert_eq!(profile("OPEN WATER", None).annual_probability(), None);
        assert_eq!(profile("A31", None).annual_probability(), None);
        assert_eq!(HazardProfile::default().annual_probability(), None);
    }

    #[test]
    fn rating_serializes_as_number() {
        let json = serde_json::to_string(&LikelihoodRating::Likely).unwrap();
        assert_eq!(json, "3");
        assert_eq!(LikelihoodRating::HighlyUnlikely.to_string(), "Highly unlikely");
        assert_eq!(LikelihoodRating::from_value(6), None);
    }
}

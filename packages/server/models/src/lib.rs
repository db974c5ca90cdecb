#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the flood risk server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the pipeline types so the API contract can evolve independently.

use flood_risk_assessment_models::normalize::RawLocationInput;
use flood_risk_assessment_models::{
    AssessmentError, HazardProfile, RiskAssessment, SourceReport, WeatherAlert,
};
use serde::{Deserialize, Serialize};

/// A request field that clients may send as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiRawValue {
    /// A JSON number.
    Number(f64),
    /// A JSON string, passed through as typed.
    Text(String),
}

impl ApiRawValue {
    fn into_raw(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

/// Body of `POST /api/assess`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAssessRequest {
    /// Latitude in decimal degrees.
    pub latitude: Option<ApiRawValue>,
    /// Longitude in decimal degrees.
    pub longitude: Option<ApiRawValue>,
    /// US ZIP code.
    pub zip_code: Option<ApiRawValue>,
    /// Hypothetical flood depth in feet.
    pub depth: Option<ApiRawValue>,
}

impl From<ApiAssessRequest> for RawLocationInput {
    fn from(request: ApiAssessRequest) -> Self {
        Self {
            latitude: request.latitude.map(ApiRawValue::into_raw),
            longitude: request.longitude.map(ApiRawValue::into_raw),
            zip_code: request.zip_code.map(ApiRawValue::into_raw),
            depth: request.depth.map(ApiRawValue::into_raw),
        }
    }
}

/// A flood risk assessment as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAssessment {
    /// Plain-language explanation.
    pub explanation: String,
    /// Likelihood rating (0-5).
    pub likelihood_rating: Option<u8>,
    /// Label of the likelihood rating (e.g. `"Likely"`).
    pub likelihood_label: Option<String>,
    /// Justification of the likelihood rating.
    pub likelihood_explanation: Option<String>,
    /// Whether any enrichment source was unavailable.
    pub degraded: bool,
    /// Official flood hazard data used.
    pub hazard: Option<HazardProfile>,
    /// Active flood alerts.
    pub alerts: Vec<WeatherAlert>,
    /// Which sources contributed.
    pub sources: SourceReport,
}

impl From<RiskAssessment> for ApiAssessment {
    fn from(assessment: RiskAssessment) -> Self {
        Self {
            explanation: assessment.explanation_text,
            likelihood_rating: assessment.likelihood_rating.map(|r| r.value()),
            likelihood_label: assessment.likelihood_rating.map(|r| r.to_string()),
            likelihood_explanation: assessment.likelihood_explanation,
            degraded: assessment.degraded,
            hazard: assessment.hazard_profile,
            alerts: assessment.alerts,
            sources: assessment.sources,
        }
    }
}

/// Category of an API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The request was invalid.
    Validation,
    /// The explanation could not be generated.
    Generation,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// What kind of failure this is.
    pub kind: ApiErrorKind,
    /// Human-readable message.
    pub error: String,
}

impl From<&AssessmentError> for ApiError {
    fn from(error: &AssessmentError) -> Self {
        let kind = match error {
            AssessmentError::Validation(_) => ApiErrorKind::Validation,
            AssessmentError::Generation { .. } => ApiErrorKind::Generation,
        };
        Self {
            kind,
            error: error.to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Text generation backend in use.
    pub generator: String,
}

#[cfg(test)]
mod tests {
    use flood_risk_assessment_models::{LikelihoodRating, ValidationError};

    use super::*;

    #[test]
    fn request_accepts_numbers_and_strings() {
        let request: ApiAssessRequest = serde_json::from_str(
            r#"{"latitude": 29.76, "longitude": "-95.37", "depth": 3}"#,
        )
        .unwrap();
        let raw = RawLocationInput::from(request);
        assert_eq!(raw.latitude.as_deref(), Some("29.76"));
        assert_eq!(raw.longitude.as_deref(), Some("-95.37"));
        assert_eq!(raw.depth.as_deref(), Some("3"));
        assert_eq!(raw.zip_code, None);
    }

    #[test]
    fn assessment_exposes_rating_value_and_label() {
        let api = ApiAssessment::from(RiskAssessment {
            explanation_text: "Knee-deep water.".to_string(),
            likelihood_rating: Some(LikelihoodRating::Likely),
            likelihood_explanation: Some("Zone AE.".to_string()),
            degraded: false,
            hazard_profile: None,
            alerts: Vec::new(),
            sources: SourceReport::default(),
        });
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["likelihoodRating"], 3);
        assert_eq!(json["likelihoodLabel"], "Likely");
        assert_eq!(json["explanation"], "Knee-deep water.");
    }

    #[test]
    fn errors_carry_their_kind() {
        let error = AssessmentError::from(ValidationError::MissingField { field: "depth" });
        let api = ApiError::from(&error);
        assert_eq!(api.kind, ApiErrorKind::Validation);
        assert_eq!(api.error, "depth is required");
    }
}

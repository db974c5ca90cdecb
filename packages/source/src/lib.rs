#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! External data clients for the flood risk pipeline.
//!
//! Each upstream service sits behind a small trait so the pipeline can
//! swap backends (or mocks) without touching orchestration code:
//!
//! - [`HazardSource`]: flood zone lookup for a point
//!   ([`nfhl`], FEMA National Flood Hazard Layer).
//! - [`Geocoder`]: reverse geocoding to a place name and ZIP code
//!   centroids ([`nominatim`]).
//! - [`AlertSource`]: active weather alerts ([`nws`]).
//! - [`EvidenceSource`]: web search for historical flood reports
//!   ([`search`]).
//!
//! Endpoints are configured by TOML files in `services/` and loaded via
//! the [`service_registry`]. Clients return [`SourceError`] on failure;
//! deciding what a failure means for the assessment is the caller's job.

pub mod clients;
pub mod evidence;
pub mod http;
pub mod nfhl;
pub mod nominatim;
pub mod nws;
pub mod search;
pub mod service_registry;

use async_trait::async_trait;
use flood_risk_assessment_models::{
    Coordinates, EvidenceItem, HazardProfile, WeatherAlert, ZipCode,
};
use thiserror::Error;

/// Errors that can occur while talking to an external source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Request URL.
        url: String,
    },

    /// The response did not have the expected shape.
    #[error("Unexpected response: {message}")]
    Response {
        /// Description of what was wrong.
        message: String,
    },

    /// A service is misconfigured (e.g. a missing API key).
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Looks up the flood hazard profile for a point.
#[async_trait]
pub trait HazardSource: Send + Sync {
    /// Returns the hazard profile at `point`, or `None` when the registry
    /// has no feature there.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the registry cannot be reached or
    /// answers with something unparseable.
    async fn hazard_profile(&self, point: Coordinates)
    -> Result<Option<HazardProfile>, SourceError>;
}

/// Converts between points and human-readable places.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns a human-readable place name for `point` (e.g.
    /// `"Washington, District of Columbia"`).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the lookup fails.
    async fn place_name(&self, point: Coordinates) -> Result<Option<String>, SourceError>;

    /// Returns a representative point for a ZIP code.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the lookup fails.
    async fn locate_zip(&self, zip: &ZipCode) -> Result<Option<Coordinates>, SourceError>;
}

/// Retrieves active weather alerts.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Returns the active flood-related alerts covering `point`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the feed cannot be read.
    async fn active_flood_alerts(&self, point: Coordinates)
    -> Result<Vec<WeatherAlert>, SourceError>;
}

/// A web/news search backend used for historical evidence.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Short identifier used in logs (e.g. `"serpapi"`).
    fn id(&self) -> &str;

    /// Runs `query` and returns up to `limit` raw results.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the search fails.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidenceItem>, SourceError>;
}

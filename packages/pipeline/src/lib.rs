#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood risk assessment pipeline.
//!
//! Turns a validated [`Query`] into a [`RiskAssessment`]:
//!
//! 1. gather hazard, place name, historical evidence and weather alerts
//!    concurrently ([`lookup`]), absorbing every source failure;
//! 2. generate the explanation (a failure here is fatal);
//! 3. generate and parse the likelihood rating (a failure here leaves
//!    the rating absent);
//! 4. sanitize and filter the generated text.
//!
//! Results are memoized per query by a [`ResultCache`].

pub mod config;
pub mod lookup;

use std::sync::Arc;

use flood_risk_ai::{AiError, TextGenerator, create_generator_from_env};
use flood_risk_assessment_models::normalize::{RawLocationInput, normalize_input};
use flood_risk_assessment_models::{
    AssessmentError, GenerationRequest, LikelihoodRating, Query, RiskAssessment,
};
use flood_risk_cache::{MemoryCache, ResultCache};
use flood_risk_prompt::{
    RedundantSentenceFilter, TextFilter, build_explanation_prompt, build_rating_prompt,
    parse_rating_response, sanitize,
};
use flood_risk_source::SourceError;
use flood_risk_source::clients::SourceClients;
use flood_risk_source::http::build_client;
use futures::FutureExt as _;
use thiserror::Error;

pub use config::{ConfigError, PipelineConfig};
pub use lookup::Lookups;

/// Errors raised while assembling a [`Pipeline`] from configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The source HTTP client could not be built.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// No usable text generation backend.
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// The assessment pipeline and its collaborators.
pub struct Pipeline {
    sources: SourceClients,
    generator: Arc<dyn TextGenerator>,
    filter: Arc<dyn TextFilter>,
    cache: Arc<dyn ResultCache>,
}

impl Pipeline {
    /// Creates a pipeline with the redundancy filter and a default
    /// [`MemoryCache`].
    #[must_use]
    pub fn new(sources: SourceClients, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            sources,
            generator,
            filter: Arc::new(RedundantSentenceFilter),
            cache: Arc::new(MemoryCache::new(flood_risk_cache::CachePolicy::default())),
        }
    }

    /// Replaces the post-processing filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn TextFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the result cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Builds a pipeline from the service registry and environment.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the HTTP client cannot be built or no
    /// text generation backend is configured.
    pub async fn from_env(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let client = build_client(config.http_timeout, &config.user_agent)?;
        let sources = SourceClients::from_env(&client);
        let generator: Arc<dyn TextGenerator> =
            Arc::from(create_generator_from_env(config.http_timeout).await?);

        log::info!("Using text generator {}", generator.name());

        Ok(Self::new(sources, generator)
            .with_cache(Arc::new(MemoryCache::new(config.cache_policy))))
    }

    /// Name of the text generation backend.
    #[must_use]
    pub fn generator_name(&self) -> String {
        self.generator.name()
    }

    /// Validates raw user input and assesses it.
    ///
    /// Invalid input is rejected before any external call is made.
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::Validation`] for invalid input and
    /// [`AssessmentError::Generation`] if the explanation cannot be
    /// generated.
    pub async fn assess_input(
        &self,
        input: &RawLocationInput,
    ) -> Result<RiskAssessment, AssessmentError> {
        let query = normalize_input(input).inspect_err(|e| {
            log::debug!("Rejected input: {e}");
        })?;
        self.assess(&query).await
    }

    /// Returns the assessment for `query`, computing it at most once per
    /// cache lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::Generation`] if the explanation cannot
    /// be generated. Failures are not cached.
    pub async fn assess(&self, query: &Query) -> Result<RiskAssessment, AssessmentError> {
        self.cache
            .get_or_compute(query, self.compute(query).boxed())
            .await
    }

    async fn compute(&self, query: &Query) -> Result<RiskAssessment, AssessmentError> {
        log::debug!(
            "Assessing {} at {} feet",
            query.location(),
            query.depth_feet()
        );

        let lookups = lookup::gather(&self.sources, query).await;
        let degraded = lookups.is_degraded();
        if degraded {
            log::warn!(
                "Assessment for {} is degraded: {:?}",
                query.location(),
                lookups.report()
            );
        }

        let explanation_text = self.generate_explanation(query, &lookups).await?;
        let (likelihood_rating, likelihood_explanation) =
            self.generate_rating(query, &lookups).await;

        log::debug!("Assessment for {} complete", query.location());

        Ok(RiskAssessment {
            explanation_text,
            likelihood_rating,
            likelihood_explanation,
            degraded,
            sources: lookups.report(),
            hazard_profile: lookups.hazard,
            alerts: lookups.alerts,
        })
    }

    async fn generate_explanation(
        &self,
        query: &Query,
        lookups: &Lookups,
    ) -> Result<String, AssessmentError> {
        let prompt = build_explanation_prompt(
            query,
            lookups.place_name.as_deref(),
            lookups.hazard.as_ref(),
        );
        log::debug!("Explanation prompt built ({} chars)", prompt.len());

        let raw = self
            .generator
            .generate(&GenerationRequest::explanation(prompt))
            .await
            .map_err(|e| {
                log::error!("Explanation generation via {} failed: {e}", self.generator.name());
                AssessmentError::Generation {
                    cause: e.to_string(),
                }
            })?;

        let text = self.clean(&raw);
        if text.is_empty() {
            log::error!("Explanation was empty after sanitizing");
            return Err(AssessmentError::Generation {
                cause: "the generated explanation was empty".to_string(),
            });
        }

        Ok(text)
    }

    async fn generate_rating(
        &self,
        query: &Query,
        lookups: &Lookups,
    ) -> (Option<LikelihoodRating>, Option<String>) {
        let prompt = build_rating_prompt(
            query,
            lookups.place_name.as_deref(),
            lookups.hazard.as_ref(),
            &lookups.evidence,
            &lookups.alerts,
        );
        log::debug!("Rating prompt built ({} chars)", prompt.len());

        let raw = match self
            .generator
            .generate(&GenerationRequest::likelihood_rating(prompt))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Rating generation via {} failed: {e}", self.generator.name());
                return (None, None);
            }
        };

        let parsed = parse_rating_response(&sanitize(&raw));
        if parsed.rating.is_none() {
            log::warn!("No valid rating in generated reply: {raw:?}");
        }

        let explanation = parsed
            .explanation
            .map(|text| self.filter.apply(&text))
            .filter(|text| !text.trim().is_empty());

        (parsed.rating, explanation)
    }

    fn clean(&self, raw: &str) -> String {
        self.filter.apply(&sanitize(raw)).trim().to_string()
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text generation client with LLM provider abstraction.
//!
//! Supports `OpenAI`, Anthropic Claude, AWS Bedrock (feature-gated), and
//! any `OpenAI`-compatible local/self-hosted server (Ollama, vLLM,
//! llama.cpp, LM Studio) via the `AI_BASE_URL` environment variable.
//!
//! Every provider implements [`providers::TextGenerator`]: one prompt in,
//! one block of text out, with the sampling temperature and token budget
//! taken from the [`GenerationRequest`]. Calls are attempted once; retry
//! policy belongs to the caller.
//!
//! [`GenerationRequest`]: flood_risk_assessment_models::GenerationRequest

pub mod providers;

use flood_risk_assessment_models::GenerationKind;
use thiserror::Error;

pub use providers::{TextGenerator, create_generator_from_env};

/// Errors that can occur during text generation.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error (auth, quota, bad request, ...).
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider answered but produced no text.
    #[error("Empty completion for {kind} request")]
    EmptyCompletion {
        /// Which request came back empty.
        kind: GenerationKind,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

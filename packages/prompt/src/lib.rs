#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Prompt construction and generated-text handling.
//!
//! The [`builder`] renders the explanation and likelihood-rating prompts
//! from gathered evidence; everything it emits is deterministic for a
//! given input. The rating prompt pins the model to a two-line
//! `Rating: X` / `Explanation: ...` grammar which [`parse`] reads back.
//! Generated text is cleaned by [`sanitize`] and then by a pluggable
//! [`filter::TextFilter`] before it reaches the caller.

pub mod builder;
pub mod filter;
pub mod parse;
pub mod probability;
pub mod sanitize;

pub use builder::{build_explanation_prompt, build_rating_prompt};
pub use filter::{NoopFilter, RedundantSentenceFilter, TextFilter};
pub use parse::{ParsedRating, parse_explanation, parse_rating, parse_rating_response};
pub use probability::score_from_annual_probability;
pub use sanitize::sanitize;

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for flood risk assessments.
//!
//! ```text
//! flood_risk assess --lat 29.76 --lon -95.37 --depth 3 [--json]
//! flood_risk assess --zip 77002 --depth 3
//! flood_risk serve
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use flood_risk_assessment_models::normalize::{RawLocationInput, normalize_input};
use flood_risk_assessment_models::{Query, RiskAssessment};
use flood_risk_pipeline::{Pipeline, PipelineConfig};
use flood_risk_server_models::ApiAssessment;

#[derive(Parser)]
#[command(
    name = "flood_risk",
    about = "Explain what a flood depth means for a location"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one location and depth
    Assess {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<String>,
        /// US ZIP code (used when no coordinates are given)
        #[arg(long)]
        zip: Option<String>,
        /// Flood depth in feet
        #[arg(long, allow_hyphen_values = true)]
        depth: String,
        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the JSON API server (`BIND_ADDR`, `PORT`)
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Assess {
            lat,
            lon,
            zip,
            depth,
            json,
        } => {
            let input = RawLocationInput {
                latitude: lat,
                longitude: lon,
                zip_code: zip,
                depth: Some(depth),
            };
            let query = match normalize_input(&input) {
                Ok(query) => query,
                Err(e) => {
                    eprintln!("Invalid input: {e}");
                    std::process::exit(2);
                }
            };

            let config = PipelineConfig::from_env()?;
            let pipeline = Pipeline::from_env(&config).await?;
            log::info!(
                "Assessing {} at {} feet with {}",
                query.location(),
                query.depth_feet(),
                pipeline.generator_name()
            );

            let assessment = match pipeline.assess(&query).await {
                Ok(assessment) => assessment,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };

            if json {
                let body = serde_json::to_string_pretty(&ApiAssessment::from(assessment))?;
                println!("{body}");
            } else {
                print!("{}", render(&query, &assessment));
            }
        }
        Commands::Serve => {
            // actix-web runs its own single-threaded runtime per worker, so
            // the server is started on a blocking thread.
            tokio::task::spawn_blocking(|| actix_web::rt::System::new().block_on(serve()))
                .await??;
        }
    }

    Ok(())
}

async fn serve() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = PipelineConfig::from_env()?;
    let pipeline = Pipeline::from_env(&config).await?;
    let (bind_addr, port) = flood_risk_server::bind_from_env();

    flood_risk_server::run_server(Arc::new(pipeline), &bind_addr, port).await?;

    Ok(())
}

/// Formats an assessment for the terminal.
fn render(query: &Query, assessment: &RiskAssessment) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Flood risk for {} at {} feet",
        query.location(),
        query.depth_feet()
    );
    if let Some(place) = &assessment.sources.place_name {
        let _ = writeln!(out, "Place: {place}");
    }
    if let Some(zone) = assessment
        .hazard_profile
        .as_ref()
        .and_then(|h| h.flood_zone.as_deref())
    {
        let _ = writeln!(out, "Flood zone: {zone}");
    }
    out.push('\n');

    out.push_str(&assessment.explanation_text);
    out.push_str("\n\n");

    match assessment.likelihood_rating {
        Some(rating) => {
            let _ = write!(out, "Likelihood: {} ({rating})", rating.value());
            if let Some(why) = &assessment.likelihood_explanation {
                let _ = write!(out, ": {why}");
            }
            out.push('\n');
        }
        None => out.push_str("Likelihood: unavailable\n"),
    }

    for alert in &assessment.alerts {
        let _ = writeln!(out, "Active alert: {}", alert.title);
    }

    if assessment.degraded {
        let sources = &assessment.sources;
        let missing: Vec<&str> = [
            (!sources.location_resolved, "location"),
            (!sources.hazard_available, "flood zone data"),
            (!sources.evidence_available, "historical reports"),
            (!sources.alerts_available, "weather alerts"),
        ]
        .into_iter()
        .filter_map(|(missing, name)| missing.then_some(name))
        .collect();
        let _ = writeln!(out, "\nNote: unavailable sources: {}", missing.join(", "));
    }

    out
}

#[cfg(test)]
mod tests {
    use flood_risk_assessment_models::{
        Coordinates, HazardProfile, LikelihoodRating, Location, SourceReport,
    };

    use super::*;

    fn query() -> Query {
        Query::new(
            Location::Coordinates(Coordinates::new(29.7604, -95.3698).unwrap()),
            2.5,
        )
        .unwrap()
    }

    #[test]
    fn renders_full_assessment() {
        let assessment = RiskAssessment {
            explanation_text: "Water reaches the knees.".to_string(),
            likelihood_rating: Some(LikelihoodRating::Likely),
            likelihood_explanation: Some("Zone AE.".to_string()),
            degraded: false,
            hazard_profile: Some(HazardProfile {
                flood_zone: Some("AE".to_string()),
                ..HazardProfile::default()
            }),
            alerts: Vec::new(),
            sources: SourceReport {
                location_resolved: true,
                hazard_available: true,
                evidence_available: true,
                alerts_available: true,
                place_name: Some("Houston, Texas".to_string()),
            },
        };

        assert_eq!(
            render(&query(), &assessment),
            "Flood risk for coordinates 29.7604, -95.3698 at 2.5 feet\n\
             Place: Houston, Texas\n\
             Flood zone: AE\n\
             \n\
             Water reaches the knees.\n\
             \n\
             Likelihood: 3 (Likely): Zone AE.\n"
        );
    }

    #[test]
    fn lists_unavailable_sources_when_degraded() {
        let assessment = RiskAssessment {
            explanation_text: "Generic advice.".to_string(),
            likelihood_rating: None,
            likelihood_explanation: None,
            degraded: true,
            hazard_profile: None,
            alerts: Vec::new(),
            sources: SourceReport {
                location_resolved: true,
                alerts_available: true,
                ..SourceReport::default()
            },
        };

        let text = render(&query(), &assessment);
        assert!(text.contains("Likelihood: unavailable\n"));
        assert!(text.ends_with("Note: unavailable sources: flood zone data, historical reports\n"));
    }
}

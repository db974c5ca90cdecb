//! Deterministic prompt rendering.
//!
//! Absent hazard fields are rendered as `unknown` here and nowhere else;
//! the data model keeps them as `None`.

use std::fmt::Write as _;

use flood_risk_assessment_models::{
    EvidenceSet, HazardProfile, LikelihoodRating, Location, Query, WeatherAlert,
};

use crate::probability::score_from_annual_probability;

/// Stated when the hazard registry returned nothing for the location.
pub const NO_HAZARD_DATA_NOTICE: &str = "No official flood zone data was found for this location.";

/// Stated when the evidence search came back empty.
pub const NO_EVIDENCE_NOTICE: &str = "No historical flood reports were found.";

/// Stated when no flood alerts are active.
pub const NO_ALERTS_NOTICE: &str = "There are no active flood alerts for this location.";

const UNKNOWN: &str = "unknown";

/// Renders the explanation prompt.
///
/// With a hazard profile the prompt lists the flood zone, base flood
/// elevation and special flood hazard area status. Without one it says
/// so explicitly and asks for a generic, depth-based explanation.
#[must_use]
pub fn build_explanation_prompt(
    query: &Query,
    place_name: Option<&str>,
    hazard: Option<&HazardProfile>,
) -> String {
    let depth = format_depth(query.depth_feet());
    let place = describe_place(query.location(), place_name);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Explain in simple, clear terms what a flood depth of {depth} feet means for residents \
         living at {place}."
    );
    prompt.push('\n');

    match hazard.filter(|profile| !profile.is_empty()) {
        Some(profile) => {
            prompt.push_str("Official flood hazard data for this location:\n");
            write_hazard_lines(&mut prompt, profile);
            prompt.push('\n');
            prompt.push_str(
                "Use this data to put the depth in context for this specific location.\n",
            );
        }
        None => {
            let _ = writeln!(prompt, "{NO_HAZARD_DATA_NOTICE}");
            prompt.push_str(
                "Give a general explanation based on the flood depth alone, without assuming \
                 anything about the local flood zone.\n",
            );
        }
    }

    prompt.push('\n');
    prompt.push_str(
        "Describe how high the water would reach indoors and outdoors, the types of damage \
         likely to occur, the impact on travel and infrastructure, and advice on how residents \
         can prepare. Avoid exaggeration but be informative and helpful.",
    );

    prompt
}

/// Renders the likelihood rating prompt.
///
/// The prompt enumerates the 0–5 scale with its labels and demands the
/// two-line `Rating: X` / `Explanation: <text>` reply that
/// [`crate::parse::parse_rating_response`] reads.
#[must_use]
pub fn build_rating_prompt(
    query: &Query,
    place_name: Option<&str>,
    hazard: Option<&HazardProfile>,
    evidence: &EvidenceSet,
    alerts: &[WeatherAlert],
) -> String {
    let depth = format_depth(query.depth_feet());
    let place = describe_place(query.location(), place_name);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Rate how likely it is that {place} experiences flooding {depth} feet deep."
    );
    prompt.push('\n');

    prompt.push_str("Official flood hazard data:\n");
    match hazard.filter(|profile| !profile.is_empty()) {
        Some(profile) => {
            write_hazard_lines(&mut prompt, profile);
            if let Some(probability) = profile.annual_probability()
                && let Some(score) = score_from_annual_probability(probability)
            {
                let _ = writeln!(
                    prompt,
                    "- Official annual flood probability: {}% (reference score {} - {score})",
                    format_percent(probability),
                    score.value(),
                );
            }
        }
        None => {
            let _ = writeln!(prompt, "{NO_HAZARD_DATA_NOTICE}");
        }
    }
    prompt.push('\n');

    prompt.push_str("Historical flood reports nearby:\n");
    if evidence.is_empty() {
        let _ = writeln!(prompt, "{NO_EVIDENCE_NOTICE}");
    } else {
        for (index, item) in evidence.iter().enumerate() {
            match &item.snippet {
                Some(snippet) => {
                    let _ = writeln!(prompt, "{}. {}: {snippet}", index + 1, item.title);
                }
                None => {
                    let _ = writeln!(prompt, "{}. {}", index + 1, item.title);
                }
            }
        }
    }
    prompt.push('\n');

    prompt.push_str("Active flood alerts:\n");
    if alerts.is_empty() {
        let _ = writeln!(prompt, "{NO_ALERTS_NOTICE}");
    } else {
        for alert in alerts {
            let severity = if alert.severity.is_empty() {
                UNKNOWN
            } else {
                alert.severity.as_str()
            };
            let _ = writeln!(prompt, "- {} (severity: {severity})", alert.title);
        }
    }
    prompt.push('\n');

    prompt.push_str("Use this scale:\n");
    for rating in LikelihoodRating::ALL {
        let _ = writeln!(prompt, "{} = {rating}", rating.value());
    }
    prompt.push('\n');

    prompt.push_str(
        "Reply with exactly two lines and nothing else:\n\
         Rating: X\n\
         Explanation: <one or two sentences justifying the rating>\n\
         where X is a single whole number from 0 to 5.",
    );

    prompt
}

fn write_hazard_lines(prompt: &mut String, profile: &HazardProfile) {
    let zone = match (&profile.flood_zone, &profile.zone_subtype) {
        (Some(zone), Some(subtype)) => format!("{zone} ({subtype})"),
        (Some(zone), None) => zone.clone(),
        (None, _) => UNKNOWN.to_string(),
    };
    let bfe = profile
        .base_flood_elevation_feet
        .map_or_else(|| UNKNOWN.to_string(), |bfe| format!("{} feet", format_depth(bfe)));
    let sfha = match profile.is_special_hazard_area {
        Some(true) => "Yes",
        Some(false) => "No",
        None => UNKNOWN,
    };

    let _ = writeln!(prompt, "- Flood zone: {zone}");
    let _ = writeln!(prompt, "- Base flood elevation: {bfe}");
    let _ = writeln!(prompt, "- In a Special Flood Hazard Area: {sfha}");
}

fn describe_place(location: &Location, place_name: Option<&str>) -> String {
    match place_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => match location {
            Location::Coordinates(coords) => format!("{name} ({coords})"),
            Location::ZipCode { zip } => format!("{name} (ZIP code {zip})"),
        },
        None => location.to_string(),
    }
}

/// Formats a number without trailing zeros (`3`, `2.5`, `0.25`).
fn format_depth(value: f64) -> String {
    trim_zeros(&format!("{value:.2}"))
}

fn format_percent(probability: f64) -> String {
    trim_zeros(&format!("{:.2}", probability * 100.0))
}

fn trim_zeros(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted.to_string()
    }
}

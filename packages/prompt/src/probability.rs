//! Annual flood probability to likelihood score mapping.
//!
//! Used for sources that report an annual probability instead of asking
//! the model for a rating. Each score covers the half-open interval
//! `[lower, upper)`, so a probability exactly on a boundary belongs to
//! the higher score.

use flood_risk_assessment_models::LikelihoodRating;

/// Upper bounds (exclusive) of each score below the maximum.
const THRESHOLDS: [(f64, LikelihoodRating); 5] = [
    (0.001, LikelihoodRating::HighlyUnlikely),
    (0.005, LikelihoodRating::Unlikely),
    (0.01, LikelihoodRating::Possible),
    (0.02, LikelihoodRating::Likely),
    (0.05, LikelihoodRating::HighlyLikely),
];

/// Maps an annual flood probability to a 0–5 likelihood score.
///
/// Returns `None` for negative or non-finite probabilities.
#[must_use]
pub fn score_from_annual_probability(probability: f64) -> Option<LikelihoodRating> {
    if !probability.is_finite() || probability < 0.0 {
        return None;
    }

    Some(
        THRESHOLDS
            .iter()
            .find(|(upper, _)| probability < *upper)
            .map_or(LikelihoodRating::Definitive, |(_, rating)| *rating),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_match_table() {
        let cases = [
            (0.0009, 0),
            (0.001, 1),
            (0.0049, 1),
            (0.005, 2),
            (0.0099, 2),
            (0.01, 3),
            (0.0199, 3),
            (0.02, 4),
            (0.0499, 4),
            (0.05, 5),
            (0.0, 0),
            (1.0, 5),
        ];
        for (probability, expected) in cases {
            assert_eq!(
                score_from_annual_probability(probability).map(LikelihoodRating::value),
                Some(expected),
                "probability {probability}"
            );
        }
    }

    #[test]
    fn mapping_is_monotonic() {
        let mut previous = LikelihoodRating::HighlyUnlikely;
        for step in 0..=1000 {
            let probability = f64::from(step) / 10_000.0;
            let score = score_from_annual_probability(probability).unwrap();
            assert!(score >= previous, "score dropped at {probability}");
            previous = score;
        }
    }

    #[test]
    fn rejects_invalid_probabilities() {
        assert_eq!(score_from_annual_probability(-0.1), None);
        assert_eq!(score_from_annual_probability(f64::NAN), None);
        assert_eq!(score_from_annual_probability(f64::INFINITY), None);
    }
}

//! HTTP handler functions for the flood risk API.

use actix_web::{HttpResponse, web};
use flood_risk_assessment_models::AssessmentError;
use flood_risk_assessment_models::normalize::RawLocationInput;
use flood_risk_server_models::{ApiAssessRequest, ApiAssessment, ApiError, ApiHealth};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        generator: state.pipeline.generator_name(),
    })
}

/// `POST /api/assess`
///
/// Validates the location and depth, then returns the assessment.
/// Invalid input is a `400`; a failed explanation is a `502`.
pub async fn assess(state: web::Data<AppState>, body: web::Json<ApiAssessRequest>) -> HttpResponse {
    let input = RawLocationInput::from(body.into_inner());

    match state.pipeline.assess_input(&input).await {
        Ok(assessment) => HttpResponse::Ok().json(ApiAssessment::from(assessment)),
        Err(e @ AssessmentError::Validation(_)) => HttpResponse::BadRequest().json(ApiError::from(&e)),
        Err(e) => {
            log::error!("Assessment failed: {e}");
            HttpResponse::BadGateway().json(ApiError::from(&e))
        }
    }
}

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::blender::PredictionResult;
use super::signals::ClinicalSignals;
use super::TriageArtifacts;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AssessmentRequest {
    pub anamnesis: String,
    /// Echo the extracted signals next to the result.
    #[serde(default)]
    pub include_signals: bool,
}

#[derive(Debug, Serialize)]
pub struct AssessmentResponse {
    #[serde(flatten)]
    pub prediction: PredictionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<ClinicalSignals>,
}

/// Router builder exposing the assessment endpoint over shared artifacts.
pub fn triage_router(artifacts: Arc<TriageArtifacts>) -> Router {
    Router::new()
        .route("/api/v1/triage/assessments", post(assessment_handler))
        .with_state(artifacts)
}

pub(crate) async fn assessment_handler(
    State(artifacts): State<Arc<TriageArtifacts>>,
    Json(request): Json<AssessmentRequest>,
) -> Result<Json<AssessmentResponse>, AppError> {
    if request.anamnesis.trim().is_empty() {
        return Err(AppError::EmptyAnamnesis);
    }

    let assessment = artifacts.assess(&request.anamnesis);
    info!(
        admit = assessment.disposition.admit,
        discharge = assessment.disposition.discharge,
        "triage assessment served"
    );

    Ok(Json(AssessmentResponse {
        prediction: assessment.prediction(),
        signals: request.include_signals.then_some(assessment.signals),
    }))
}

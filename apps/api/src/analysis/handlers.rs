//! Axum route handlers for the Relevance API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::models::EvaluationRecord;
use crate::analysis::orchestrator::EvaluationRequest;
use crate::analysis::pool::shutdown_signalled;
use crate::analysis::requirements::JobProfile;
use crate::errors::{classify, error_body, AppError};
use crate::state::AppState;

const MAX_BATCH_SIZE: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequirementsRequest {
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub resume_id: Option<String>,
    pub jd_id: Option<String>,
    pub resume_text: String,
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchResume {
    pub resume_id: Option<String>,
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchEvaluateRequest {
    pub jd_id: Option<String>,
    pub jd_text: String,
    pub resumes: Vec<BatchResume>,
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub resume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct BatchEvaluateResponse {
    pub jd_id: String,
    pub results: Vec<BatchItem>,
}

/// Caller-supplied id, or a fresh UUID when none was given.
fn resolve_id(id: Option<String>, field: &str) -> Result<String, AppError> {
    match id {
        Some(id) if id.trim().is_empty() => {
            Err(AppError::Validation(format!("{field} cannot be blank")))
        }
        Some(id) => Ok(id),
        None => Ok(Uuid::new_v4().to_string()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/requirements
///
/// Previews what the extractor finds in a JD: requirements, role title,
/// experience and education asks.
pub async fn handle_extract_requirements(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequirementsRequest>,
) -> Result<Json<JobProfile>, AppError> {
    let profile = state.engine.extract_profile(&request.jd_text)?;
    Ok(Json(profile))
}

/// POST /api/v1/evaluations
///
/// Evaluates one resume against one JD.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluationRecord>, AppError> {
    let request = EvaluationRequest {
        resume_id: resolve_id(request.resume_id, "resume_id")?,
        jd_id: resolve_id(request.jd_id, "jd_id")?,
        resume_text: request.resume_text,
        jd_text: request.jd_text,
    };

    let result = state
        .engine
        .evaluate_with_shutdown(&request, shutdown_signalled(state.shutdown.clone()))
        .await?;

    Ok(Json(result.to_record()))
}

/// POST /api/v1/evaluations/batch
///
/// Evaluates many resumes against one JD on the worker pool. A failing
/// resume is reported in its slot and does not fail the batch.
pub async fn handle_evaluate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchEvaluateRequest>,
) -> Result<Json<BatchEvaluateResponse>, AppError> {
    if request.resumes.is_empty() {
        return Err(AppError::Validation("resumes cannot be empty".to_string()));
    }
    if request.resumes.len() > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "at most {MAX_BATCH_SIZE} resumes per batch, got {}",
            request.resumes.len()
        )));
    }

    let jd_id = resolve_id(request.jd_id, "jd_id")?;
    let requests = request
        .resumes
        .into_iter()
        .map(|resume| {
            Ok(EvaluationRequest {
                resume_id: resolve_id(resume.resume_id, "resume_id")?,
                jd_id: jd_id.clone(),
                resume_text: resume.resume_text,
                jd_text: request.jd_text.clone(),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let resume_ids: Vec<String> = requests.iter().map(|r| r.resume_id.clone()).collect();
    let outcomes = state
        .pool
        .evaluate_all_until(requests, state.shutdown.clone())
        .await;

    let results = resume_ids
        .into_iter()
        .zip(outcomes)
        .map(|(resume_id, outcome)| match outcome {
            Ok(result) => BatchItem {
                resume_id,
                result: Some(result.to_record()),
                error: None,
            },
            Err(failure) => {
                let (_, code) = classify(&failure.error);
                let body = error_body(code, failure.to_string(), Some(failure.stage));
                BatchItem {
                    resume_id,
                    result: None,
                    error: Some(body["error"].clone()),
                }
            }
        })
        .collect();

    Ok(Json(BatchEvaluateResponse { jd_id, results }))
}

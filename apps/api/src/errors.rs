use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::analysis::errors::{AnalysisError, EvaluationFailure, Stage};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationFailure),
}

/// Status and machine-readable code for an engine error.
pub fn classify(error: &AnalysisError) -> (StatusCode, &'static str) {
    match error {
        AnalysisError::Normalization { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "NORMALIZATION_ERROR")
        }
        AnalysisError::InvalidRequirementSet => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUIREMENT_SET")
        }
        AnalysisError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED"),
        AnalysisError::ProviderUnavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_UNAVAILABLE")
        }
    }
}

/// Error body shared by single and batch responses.
pub fn error_body(code: &str, message: String, stage: Option<Stage>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if let Some(stage) = stage {
        error["stage"] = json!(stage);
    }
    json!({ "error": error })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Analysis(e) => {
                let (status, code) = classify(e);
                (status, code, e.to_string(), None)
            }
            AppError::Evaluation(failure) => {
                let (status, code) = classify(&failure.error);
                if status.is_server_error() {
                    tracing::error!("Evaluation error: {failure}");
                }
                (status, code, failure.to_string(), Some(failure.stage))
            }
        };

        (status, Json(error_body(code, message, stage))).into_response()
    }
}

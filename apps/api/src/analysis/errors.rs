use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::models::DocumentKind;
use crate::similarity::ProviderError;

/// Pipeline stages of a single evaluation, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalizing,
    Extracting,
    Matching,
    Aggregating,
    GeneratingFeedback,
    Complete,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalizing => "normalizing",
            Stage::Extracting => "extracting",
            Stage::Matching => "matching",
            Stage::Aggregating => "aggregating",
            Stage::GeneratingFeedback => "generating_feedback",
            Stage::Complete => "complete",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors raised by the analysis stages.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Fatal for the document: nothing to normalize.
    #[error("cannot normalize {kind}: {reason}")]
    Normalization { kind: DocumentKind, reason: String },

    /// Fatal for the JD: no requirement could be extracted.
    #[error("job description yields no extractable requirements")]
    InvalidRequirementSet,

    /// Recovered by the orchestrator; the evaluation is marked degraded.
    #[error("similarity provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error("evaluation cancelled")]
    Cancelled,
}

/// Startup-time errors for the vocabulary and scoring configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid skill vocabulary: {0}")]
    Vocabulary(String),

    #[error("invalid scoring configuration: {0}")]
    Scoring(String),
}

/// A fatal error tied to the pair it aborted and the stage it aborted in.
#[derive(Debug, Error)]
#[error("evaluation of resume '{resume_id}' against JD '{jd_id}' failed while {stage}: {error}")]
pub struct EvaluationFailure {
    pub resume_id: String,
    pub jd_id: String,
    pub stage: Stage,
    #[source]
    pub error: AnalysisError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_converts_into_unavailable() {
        let err: AnalysisError = ProviderError::Unavailable("down".into()).into();
        assert!(matches!(err, AnalysisError::ProviderUnavailable(_)));
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn test_failure_message_names_pair_and_stage() {
        let failure = EvaluationFailure {
            resume_id: "r-9".to_string(),
            jd_id: "jd-2".to_string(),
            stage: Stage::Extracting,
            error: AnalysisError::InvalidRequirementSet,
        };
        let msg = failure.to_string();
        assert!(msg.contains("r-9"));
        assert!(msg.contains("jd-2"));
        assert!(msg.contains("extracting"));
    }
}

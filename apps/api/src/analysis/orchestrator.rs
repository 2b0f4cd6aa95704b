//! Evaluation Orchestrator — runs one (resume, JD) pair through every stage.
//!
//! `Normalizing → Extracting → Matching (hard ‖ semantic) → Aggregating →
//! GeneratingFeedback → Complete`. Fatal errors stop the pair and report
//! the stage they stopped in; a semantic provider failure only marks the
//! result degraded, and a narrator failure only drops the narrative. The
//! engine holds nothing mutable, so clones are cheap and evaluations never
//! observe each other.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::aggregator::aggregate;
use crate::analysis::errors::{AnalysisError, EvaluationFailure, Stage};
use crate::analysis::feedback::{generate_feedback, FeedbackInput};
use crate::analysis::hard_matcher::hard_match;
use crate::analysis::models::{
    DocumentKind, EvaluationParts, EvaluationResult, MatchSignal, MissingSkill, NormalizedDocument,
};
use crate::analysis::normalizer::normalize;
use crate::analysis::qualifications::{declared_experience_years, education_levels};
use crate::analysis::requirements::{extract_requirements, JobProfile};
use crate::analysis::scoring_config::ScoringConfig;
use crate::analysis::semantic_matcher::{semantic_candidates, semantic_match};
use crate::analysis::vocabulary::SkillVocabulary;
use crate::narrative::{FeedbackProvider, NarrativeRequest};
use crate::similarity::SimilarityProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub resume_id: String,
    pub jd_id: String,
    pub resume_text: String,
    pub jd_text: String,
}

/// Output of the first two stages.
struct Prepared {
    resume: NormalizedDocument,
    profile: JobProfile,
}

struct Matched {
    signals: Vec<MatchSignal>,
    degraded: bool,
}

#[derive(Clone)]
pub struct RelevanceEngine {
    vocabulary: Arc<SkillVocabulary>,
    config: Arc<ScoringConfig>,
    provider: Arc<dyn SimilarityProvider>,
    narrator: Option<Arc<dyn FeedbackProvider>>,
}

impl RelevanceEngine {
    pub fn new(
        vocabulary: Arc<SkillVocabulary>,
        config: Arc<ScoringConfig>,
        provider: Arc<dyn SimilarityProvider>,
    ) -> Self {
        Self {
            vocabulary,
            config,
            provider,
            narrator: None,
        }
    }

    /// Adds a narrative summary to every result.
    pub fn with_feedback_provider(mut self, narrator: Arc<dyn FeedbackProvider>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn feedback_provider_name(&self) -> Option<&'static str> {
        self.narrator.as_ref().map(|n| n.name())
    }

    /// Normalizes and extracts a JD without evaluating anything against it.
    pub fn extract_profile(&self, jd_text: &str) -> Result<JobProfile, AnalysisError> {
        let jd = normalize(jd_text, DocumentKind::JD)?;
        Ok(extract_requirements(&jd, &self.vocabulary))
    }

    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationFailure> {
        self.evaluate_with_shutdown(request, std::future::pending()).await
    }

    /// Like `evaluate`, but gives up with `Cancelled` once `shutdown` resolves.
    /// Only matching and the narrative await, so cancellation lands in
    /// `Matching` or `GeneratingFeedback`.
    pub async fn evaluate_with_shutdown<F>(
        &self,
        request: &EvaluationRequest,
        shutdown: F,
    ) -> Result<EvaluationResult, EvaluationFailure>
    where
        F: Future<Output = ()>,
    {
        let prepared = self.prepare(request)?;
        tokio::pin!(shutdown);

        debug!(resume_id = %request.resume_id, jd_id = %request.jd_id, stage = %Stage::Matching, "evaluation stage");
        let matched = tokio::select! {
            biased;
            _ = &mut shutdown => {
                return Err(failure(request, Stage::Matching, AnalysisError::Cancelled));
            }
            matched = self.match_signals(&prepared) => matched,
        };

        let result = self.score(request, prepared, matched)?;

        let narrative = tokio::select! {
            biased;
            _ = &mut shutdown => {
                return Err(failure(request, Stage::GeneratingFeedback, AnalysisError::Cancelled));
            }
            narrative = self.narrate(&result) => narrative,
        };
        let result = result.with_narrative(narrative);

        info!(
            resume_id = %request.resume_id,
            jd_id = %request.jd_id,
            stage = %Stage::Complete,
            score = result.score(),
            verdict = ?result.verdict(),
            matched = result.matched().len(),
            missing = result.missing().len(),
            degraded = result.is_degraded(),
            "evaluation complete"
        );

        Ok(result)
    }

    fn prepare(&self, request: &EvaluationRequest) -> Result<Prepared, EvaluationFailure> {
        debug!(resume_id = %request.resume_id, jd_id = %request.jd_id, stage = %Stage::Normalizing, "evaluation stage");
        let resume = normalize(&request.resume_text, DocumentKind::Resume)
            .map_err(|e| failure(request, Stage::Normalizing, e))?;
        let jd = normalize(&request.jd_text, DocumentKind::JD)
            .map_err(|e| failure(request, Stage::Normalizing, e))?;

        debug!(resume_id = %request.resume_id, jd_id = %request.jd_id, stage = %Stage::Extracting, "evaluation stage");
        let profile = extract_requirements(&jd, &self.vocabulary);
        if profile.requirements.is_empty() {
            return Err(failure(
                request,
                Stage::Extracting,
                AnalysisError::InvalidRequirementSet,
            ));
        }

        Ok(Prepared { resume, profile })
    }

    async fn match_signals(&self, prepared: &Prepared) -> Matched {
        let requirements = &prepared.profile.requirements;
        let candidates = semantic_candidates(&prepared.resume, requirements);

        let (mut signals, semantic) = tokio::join!(
            async { hard_match(&prepared.resume, requirements, self.config.fuzzy_threshold) },
            semantic_match(
                &prepared.resume,
                &candidates,
                self.provider.as_ref(),
                self.config.semantic_threshold,
                self.config.provider_timeout(),
            ),
        );

        let degraded = match semantic {
            Ok(semantic) => {
                signals.extend(semantic);
                false
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "semantic matching unavailable; continuing with lexical signals only"
                );
                true
            }
        };

        Matched { signals, degraded }
    }

    fn score(
        &self,
        request: &EvaluationRequest,
        prepared: Prepared,
        matched: Matched,
    ) -> Result<EvaluationResult, EvaluationFailure> {
        let Prepared { resume, profile } = prepared;

        debug!(resume_id = %request.resume_id, jd_id = %request.jd_id, stage = %Stage::Aggregating, "evaluation stage");
        let aggregate = aggregate(&profile.requirements, matched.signals, &self.config)
            .map_err(|e| failure(request, Stage::Aggregating, e))?;

        debug!(resume_id = %request.resume_id, jd_id = %request.jd_id, stage = %Stage::GeneratingFeedback, "evaluation stage");
        let resume_experience_years = declared_experience_years(&resume);
        let resume_education = education_levels(&resume);
        let feedback = generate_feedback(&FeedbackInput {
            profile: &profile,
            matched: &aggregate.matched,
            missing: &aggregate.missing,
            verdict: aggregate.verdict,
            resume_experience_years,
            resume_education: &resume_education,
        });

        Ok(EvaluationResult::from_parts(EvaluationParts {
            resume_id: request.resume_id.clone(),
            jd_id: request.jd_id.clone(),
            score: aggregate.score,
            verdict: aggregate.verdict,
            matched: aggregate.matched,
            missing: aggregate.missing,
            feedback,
            degraded: matched.degraded,
            role_title: profile.role_title,
            resume_experience_years,
        }))
    }

    /// Optional narrative, bounded by the provider timeout. Any failure
    /// leaves the ranked feedback as the only feedback.
    async fn narrate(&self, result: &EvaluationResult) -> Option<String> {
        let narrator = self.narrator.as_ref()?;
        let request = NarrativeRequest {
            role_title: result.role_title().map(str::to_string),
            score: result.score(),
            verdict: result.verdict(),
            matched_skills: result
                .matched()
                .iter()
                .map(|s| s.requirement().skill_name.clone())
                .collect(),
            missing_skills: result.missing().iter().map(MissingSkill::from).collect(),
            feedback: result.feedback().to_vec(),
        };

        let timeout = self.config.provider_timeout();
        match tokio::time::timeout(timeout, narrator.summarize(&request)).await {
            Ok(Ok(summary)) if !summary.trim().is_empty() => Some(summary.trim().to_string()),
            Ok(Ok(_)) => {
                warn!(
                    resume_id = %result.resume_id(),
                    jd_id = %result.jd_id(),
                    provider = narrator.name(),
                    "narrative was empty; omitting it"
                );
                None
            }
            Ok(Err(e)) => {
                warn!(
                    resume_id = %result.resume_id(),
                    jd_id = %result.jd_id(),
                    provider = narrator.name(),
                    error = %e,
                    "narrative unavailable; omitting it"
                );
                None
            }
            Err(_) => {
                warn!(
                    resume_id = %result.resume_id(),
                    jd_id = %result.jd_id(),
                    provider = narrator.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "narrative timed out; omitting it"
                );
                None
            }
        }
    }
}

fn failure(request: &EvaluationRequest, stage: Stage, error: AnalysisError) -> EvaluationFailure {
    warn!(
        resume_id = %request.resume_id,
        jd_id = %request.jd_id,
        %stage,
        error = %error,
        "evaluation failed"
    );
    EvaluationFailure {
        resume_id: request.resume_id.clone(),
        jd_id: request.jd_id.clone(),
        stage,
        error,
    }
}

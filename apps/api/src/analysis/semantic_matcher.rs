//! Semantic Matcher — provider-backed similarity for requirements that have
//! no exact lexical hit.
//!
//! One `similarity_matrix` call covers every candidate requirement against
//! every resume passage, bounded by the configured provider timeout. Any
//! provider failure surfaces as `AnalysisError::ProviderUnavailable`; the
//! orchestrator decides what that means for the evaluation.

use std::time::Duration;

use tracing::debug;

use crate::analysis::errors::AnalysisError;
use crate::analysis::hard_matcher::has_exact_match;
use crate::analysis::models::{MatchSignal, NormalizedDocument, Requirement};
use crate::similarity::{ProviderError, SimilarityProvider};

/// Requirements the semantic pass should look at, in requirement order.
pub fn semantic_candidates(
    resume: &NormalizedDocument,
    requirements: &[Requirement],
) -> Vec<Requirement> {
    requirements
        .iter()
        .filter(|r| !has_exact_match(resume, r))
        .cloned()
        .collect()
}

/// Sentences from Summary/Skills/Experience/Projects/Certifications, or the
/// whole resume when none of those sections exist.
fn passages(resume: &NormalizedDocument) -> Vec<String> {
    let focused: Vec<String> = resume
        .sections()
        .iter()
        .filter(|s| s.tag.is_evidence_section())
        .flat_map(|s| s.sentences.iter().map(|sentence| sentence.text.clone()))
        .collect();

    if !focused.is_empty() {
        return focused;
    }
    resume.sentences().map(|s| s.text.clone()).collect()
}

pub async fn semantic_match(
    resume: &NormalizedDocument,
    candidates: &[Requirement],
    provider: &dyn SimilarityProvider,
    threshold: f32,
    timeout: Duration,
) -> Result<Vec<MatchSignal>, AnalysisError> {
    let passages = passages(resume);
    if candidates.is_empty() || passages.is_empty() {
        return Ok(Vec::new());
    }

    let queries: Vec<String> = candidates.iter().map(Requirement::description).collect();

    let matrix = tokio::time::timeout(timeout, provider.similarity_matrix(&queries, &passages))
        .await
        .map_err(|_| ProviderError::Timeout(timeout))??;

    if matrix.len() != queries.len() || matrix.iter().any(|row| row.len() != passages.len()) {
        return Err(ProviderError::Incomplete {
            expected: queries.len() * passages.len(),
            got: matrix.iter().map(Vec::len).sum(),
        }
        .into());
    }

    let signals: Vec<MatchSignal> = candidates
        .iter()
        .zip(&matrix)
        .filter_map(|(requirement, row)| {
            let (best_idx, best) = best_passage(row)?;
            debug!(
                skill = %requirement.skill_name,
                similarity = best,
                provider = provider.name(),
                "semantic best passage"
            );
            (best >= threshold).then(|| {
                MatchSignal::semantic(requirement.clone(), best, Some(passages[best_idx].clone()))
            })
        })
        .collect();

    Ok(signals)
}

/// Index and score of the highest-scoring passage; the first one wins ties.
fn best_passage(row: &[f32]) -> Option<(usize, f32)> {
    row.iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best, (idx, score)| match best {
            Some((_, b)) if b >= score => best,
            _ => Some((idx, score)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{DocumentKind, MatchMethod, RequirementKind};
    use crate::analysis::normalizer::normalize;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores 0.7 when a query's first word shows up in the passage under an alias.
    struct AliasProvider {
        calls: AtomicUsize,
    }

    impl AliasProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SimilarityProvider for AliasProvider {
        fn name(&self) -> &'static str {
            "alias"
        }

        async fn similarity(&self, query: &str, passage: &str) -> Result<f32, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let passage = passage.to_lowercase();
            Ok(match query.split_whitespace().next() {
                Some("sql") if passage.contains("structured query language") => 0.7,
                Some("docker") if passage.contains("containers") => 0.5,
                _ => 0.1,
            })
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl SimilarityProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn similarity(&self, _: &str, _: &str) -> Result<f32, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1.0)
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SimilarityProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn similarity(&self, _: &str, _: &str) -> Result<f32, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }
    }

    fn requirement(name: &str) -> Requirement {
        Requirement {
            kind: RequirementKind::MustHave,
            skill_name: name.to_string(),
            synonyms: BTreeSet::new(),
            min_experience_years: None,
        }
    }

    fn resume(text: &str) -> NormalizedDocument {
        normalize(text, DocumentKind::Resume).unwrap()
    }

    #[tokio::test]
    async fn test_emits_semantic_signal_above_threshold() {
        let doc = resume("Skills\nPython. Structured Query Language reporting.");
        let provider = AliasProvider::new();
        let signals = semantic_match(
            &doc,
            &[requirement("sql"), requirement("docker")],
            &provider,
            0.65,
            Duration::from_secs(3),
        )
        .await
        .unwrap();

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].requirement().skill_name, "sql");
        assert_eq!(signals[0].method(), MatchMethod::Semantic);
        assert!((signals[0].confidence() - 0.7).abs() < 1e-6);
        assert_eq!(signals[0].evidence(), Some("Structured Query Language reporting."));
    }

    #[test]
    fn test_candidates_exclude_exact_hits() {
        let doc = resume("Python and Docker.");
        let candidates =
            semantic_candidates(&doc, &[requirement("python"), requirement("sql"), requirement("docker")]);
        let names: Vec<&str> = candidates.iter().map(|r| r.skill_name.as_str()).collect();
        assert_eq!(names, vec!["sql"]);
    }

    #[tokio::test]
    async fn test_no_candidates_skips_provider() {
        let provider = AliasProvider::new();
        let signals = semantic_match(&resume("Python"), &[], &provider, 0.65, Duration::from_secs(3))
            .await
            .unwrap();
        assert!(signals.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_focuses_on_evidence_sections() {
        let doc = resume("Hobbies: structured query language trivia\nSkills\nPython");
        let provider = AliasProvider::new();
        let signals = semantic_match(&doc, &[requirement("sql")], &provider, 0.65, Duration::from_secs(3))
            .await
            .unwrap();
        // Body text is outside the evidence sections, so only "Python" is compared.
        assert!(signals.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_provider_unavailable() {
        let err = semantic_match(
            &resume("Skills\nPython"),
            &[requirement("sql")],
            &SlowProvider,
            0.65,
            Duration::from_secs(3),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::ProviderUnavailable(ProviderError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_provider_unavailable() {
        let err = semantic_match(
            &resume("Python"),
            &[requirement("sql")],
            &FailingProvider,
            0.65,
            Duration::from_secs(3),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_best_passage_prefers_first_on_ties_and_skips_nan() {
        assert_eq!(best_passage(&[0.2, 0.8, 0.8]), Some((1, 0.8)));
        assert_eq!(best_passage(&[f32::NAN, 0.3]), Some((1, 0.3)));
        assert_eq!(best_passage(&[]), None);
    }
}

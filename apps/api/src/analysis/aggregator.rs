//! Score aggregation as a pure function from signals to score and verdict.
//!
//! Each requirement keeps its single best signal. A requirement contributes
//! `weight × confidence` where MustHave and NiceToHave weights come from the
//! scoring configuration; the score is the weighted share of the maximum.

use std::cmp::Ordering;

use tracing::debug;

use crate::analysis::errors::AnalysisError;
use crate::analysis::models::{MatchSignal, Requirement, RequirementKind, Verdict};
use crate::analysis::scoring_config::ScoringConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub score: u8,
    pub verdict: Verdict,
    /// Best signal per matched requirement, in requirement order.
    pub matched: Vec<MatchSignal>,
    /// Requirements without any signal, in requirement order.
    pub missing: Vec<Requirement>,
}

pub fn aggregate(
    requirements: &[Requirement],
    signals: Vec<MatchSignal>,
    config: &ScoringConfig,
) -> Result<Aggregate, AnalysisError> {
    if requirements.is_empty() {
        return Err(AnalysisError::InvalidRequirementSet);
    }

    let mut best: Vec<Option<MatchSignal>> = vec![None; requirements.len()];

    for signal in signals {
        let Some(idx) = requirements
            .iter()
            .position(|r| r.skill_name == signal.requirement().skill_name)
        else {
            debug!(skill = %signal.requirement().skill_name, "dropping signal for unknown requirement");
            continue;
        };

        let replace = match &best[idx] {
            None => true,
            Some(current) => outranks(&signal, current),
        };
        if replace {
            best[idx] = Some(signal);
        }
    }

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut earned = 0.0f64;
    let mut possible = 0.0f64;

    for (requirement, signal) in requirements.iter().zip(best) {
        let weight = weight(requirement.kind, config);
        possible += weight;

        match signal.filter(|s| s.confidence() > 0.0) {
            Some(signal) => {
                earned += weight * f64::from(signal.confidence());
                matched.push(signal);
            }
            None => missing.push(requirement.clone()),
        }
    }

    let score = (100.0 * earned / possible).round().clamp(0.0, 100.0) as u8;

    Ok(Aggregate {
        score,
        verdict: verdict_for(score, config),
        matched,
        missing,
    })
}

pub fn verdict_for(score: u8, config: &ScoringConfig) -> Verdict {
    if score >= config.high_cutoff {
        Verdict::High
    } else if score >= config.medium_cutoff {
        Verdict::Medium
    } else {
        Verdict::Low
    }
}

fn weight(kind: RequirementKind, config: &ScoringConfig) -> f64 {
    match kind {
        RequirementKind::MustHave => config.must_have_weight,
        RequirementKind::NiceToHave => config.nice_to_have_weight,
    }
}

/// Higher confidence wins; equal confidence falls back to Exact > Fuzzy > Semantic.
fn outranks(candidate: &MatchSignal, current: &MatchSignal) -> bool {
    match candidate.confidence().partial_cmp(&current.confidence()) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => candidate.method() < current.method(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::MatchMethod;
    use std::collections::BTreeSet;

    fn requirement(name: &str, kind: RequirementKind) -> Requirement {
        Requirement {
            kind,
            skill_name: name.to_string(),
            synonyms: BTreeSet::new(),
            min_experience_years: None,
        }
    }

    fn reference_requirements() -> Vec<Requirement> {
        vec![
            requirement("python", RequirementKind::MustHave),
            requirement("sql", RequirementKind::MustHave),
            requirement("docker", RequirementKind::NiceToHave),
        ]
    }

    #[test]
    fn test_reference_scenario_scores_68_medium() {
        let reqs = reference_requirements();
        let signals = vec![
            MatchSignal::exact(reqs[0].clone(), None),
            MatchSignal::semantic(reqs[1].clone(), 0.7, None),
        ];

        let result = aggregate(&reqs, signals, &ScoringConfig::default()).unwrap();
        assert_eq!(result.score, 68);
        assert_eq!(result.verdict, Verdict::Medium);
        assert_eq!(result.matched.len(), 2);
        assert_eq!(result.missing, vec![reqs[2].clone()]);
    }

    #[test]
    fn test_empty_requirement_set_is_rejected() {
        let err = aggregate(&[], Vec::new(), &ScoringConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRequirementSet));
    }

    #[test]
    fn test_best_confidence_wins_across_methods() {
        let reqs = vec![requirement("kubernetes", RequirementKind::MustHave)];
        let signals = vec![
            MatchSignal::fuzzy(reqs[0].clone(), 0.82, None),
            MatchSignal::semantic(reqs[0].clone(), 0.9, None),
        ];
        let result = aggregate(&reqs, signals, &ScoringConfig::default()).unwrap();
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].method(), MatchMethod::Semantic);
        assert_eq!(result.score, 90);
    }

    #[test]
    fn test_ties_prefer_fuzzy_over_semantic() {
        let reqs = vec![requirement("kafka", RequirementKind::NiceToHave)];
        let signals = vec![
            MatchSignal::semantic(reqs[0].clone(), 0.85, None),
            MatchSignal::fuzzy(reqs[0].clone(), 0.85, None),
        ];
        let result = aggregate(&reqs, signals, &ScoringConfig::default()).unwrap();
        assert_eq!(result.matched[0].method(), MatchMethod::Fuzzy);
    }

    #[test]
    fn test_partition_covers_every_requirement_once() {
        let reqs = vec![
            requirement("a", RequirementKind::MustHave),
            requirement("b", RequirementKind::NiceToHave),
            requirement("c", RequirementKind::MustHave),
            requirement("d", RequirementKind::NiceToHave),
        ];
        let signals = vec![
            MatchSignal::exact(reqs[2].clone(), None),
            MatchSignal::fuzzy(reqs[1].clone(), 0.8, None),
            MatchSignal::semantic(reqs[2].clone(), 0.7, None),
        ];

        let result = aggregate(&reqs, signals, &ScoringConfig::default()).unwrap();
        let mut seen: Vec<&str> = result
            .matched
            .iter()
            .map(|s| s.requirement().skill_name.as_str())
            .chain(result.missing.iter().map(|r| r.skill_name.as_str()))
            .collect();
        assert_eq!(seen.len(), reqs.len());
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);

        let matched: Vec<&str> = result
            .matched
            .iter()
            .map(|s| s.requirement().skill_name.as_str())
            .collect();
        assert_eq!(matched, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_confidence_counts_as_missing() {
        let reqs = vec![requirement("rust", RequirementKind::MustHave)];
        let signals = vec![MatchSignal::semantic(reqs[0].clone(), 0.0, None)];
        let result = aggregate(&reqs, signals, &ScoringConfig::default()).unwrap();
        assert!(result.matched.is_empty());
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.score, 0);
        assert_eq!(result.verdict, Verdict::Low);
    }

    #[test]
    fn test_signals_for_unknown_requirements_are_ignored() {
        let reqs = vec![requirement("go", RequirementKind::MustHave)];
        let stray = requirement("cobol", RequirementKind::MustHave);
        let result = aggregate(&reqs, vec![MatchSignal::exact(stray, None)], &ScoringConfig::default())
            .unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.missing.len(), 1);
    }

    #[test]
    fn test_all_exact_scores_100_high() {
        let reqs = reference_requirements();
        let signals = reqs.iter().map(|r| MatchSignal::exact(r.clone(), None)).collect();
        let result = aggregate(&reqs, signals, &ScoringConfig::default()).unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.verdict, Verdict::High);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_verdict_cutoffs_are_inclusive_and_configurable() {
        let config = ScoringConfig::default();
        assert_eq!(verdict_for(75, &config), Verdict::High);
        assert_eq!(verdict_for(74, &config), Verdict::Medium);
        assert_eq!(verdict_for(50, &config), Verdict::Medium);
        assert_eq!(verdict_for(49, &config), Verdict::Low);

        let strict = ScoringConfig {
            high_cutoff: 90,
            medium_cutoff: 70,
            ..ScoringConfig::default()
        };
        assert_eq!(verdict_for(80, &strict), Verdict::Medium);
    }

    #[test]
    fn test_custom_weights_change_score() {
        let reqs = reference_requirements();
        let signals = vec![MatchSignal::exact(reqs[2].clone(), None)];
        let even = ScoringConfig {
            must_have_weight: 1.0,
            ..ScoringConfig::default()
        };
        assert_eq!(aggregate(&reqs, signals.clone(), &ScoringConfig::default()).unwrap().score, 20);
        assert_eq!(aggregate(&reqs, signals, &even).unwrap().score, 33);
    }
}

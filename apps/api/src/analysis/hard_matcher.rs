//! Hard Matcher — exact and fuzzy lexical evidence for each requirement.
//!
//! Both passes compare folded keys (see `normalizer::fold`), so matching is
//! case- and separator-insensitive. Exact dominates: a requirement with an
//! exact hit never gets a Fuzzy signal.

use strsim::normalized_levenshtein;

use crate::analysis::models::{MatchSignal, NormalizedDocument, Requirement, Sentence};
use crate::analysis::normalizer::{fold_tokens, tokenize};

/// Folded forms shorter than this are too ambiguous to fuzzy-match ("sql" vs "sq").
const MIN_FUZZY_CHARS: usize = 4;

struct SurfaceForm {
    key: String,
    words: usize,
}

fn surface_forms(requirement: &Requirement) -> Vec<SurfaceForm> {
    requirement
        .surface_forms()
        .map(|form| {
            let tokens = tokenize(form);
            SurfaceForm {
                key: fold_tokens(&tokens),
                words: tokens.len().max(1),
            }
        })
        .filter(|form| !form.key.is_empty())
        .collect()
}

/// One signal per requirement with lexical evidence, in requirement order.
pub fn hard_match(
    resume: &NormalizedDocument,
    requirements: &[Requirement],
    fuzzy_threshold: f32,
) -> Vec<MatchSignal> {
    let sentences: Vec<&Sentence> = resume.sentences().collect();

    requirements
        .iter()
        .filter_map(|requirement| {
            let forms = surface_forms(requirement);
            if let Some(evidence) = find_exact(&sentences, &forms) {
                return Some(MatchSignal::exact(requirement.clone(), Some(evidence)));
            }
            find_fuzzy(&sentences, &forms, fuzzy_threshold).map(|(similarity, evidence)| {
                MatchSignal::fuzzy(requirement.clone(), similarity, Some(evidence))
            })
        })
        .collect()
}

/// True when the requirement has an exact hit in the resume.
pub fn has_exact_match(resume: &NormalizedDocument, requirement: &Requirement) -> bool {
    let sentences: Vec<&Sentence> = resume.sentences().collect();
    find_exact(&sentences, &surface_forms(requirement)).is_some()
}

/// Returns the first sentence containing any form as a token phrase.
fn find_exact(sentences: &[&Sentence], forms: &[SurfaceForm]) -> Option<String> {
    let max_window = forms.iter().map(|f| f.words + 1).max()?;

    sentences.iter().find_map(|sentence| {
        let tokens = &sentence.tokens;
        (1..=max_window.min(tokens.len())).find_map(|len| {
            tokens.windows(len).find_map(|window| {
                let key = fold_tokens(window);
                forms
                    .iter()
                    .any(|f| f.key == key)
                    .then(|| sentence.text.clone())
            })
        })
    })
}

/// Best normalized Levenshtein similarity between any form and any resume
/// n-gram of comparable length, if it clears the threshold.
fn find_fuzzy(
    sentences: &[&Sentence],
    forms: &[SurfaceForm],
    threshold: f32,
) -> Option<(f32, String)> {
    let mut best: Option<(f32, String)> = None;

    for form in forms.iter().filter(|f| f.key.chars().count() >= MIN_FUZZY_CHARS) {
        let form_len = form.key.chars().count();
        let min_words = form.words.saturating_sub(1).max(1);

        for sentence in sentences {
            for len in min_words..=form.words + 1 {
                for window in sentence.tokens.windows(len) {
                    let key = fold_tokens(window);
                    // Length gap alone already rules the pair out.
                    if (similarity_ceiling(form_len, key.chars().count()) as f32) < threshold {
                        continue;
                    }

                    let similarity = normalized_levenshtein(&form.key, &key) as f32;
                    if similarity >= threshold
                        && best.as_ref().map_or(true, |(b, _)| similarity > *b)
                    {
                        best = Some((similarity, window.join(" ")));
                    }
                }
            }
        }
    }

    best
}

/// Highest normalized Levenshtein similarity two strings of these lengths
/// can reach, computed the way `strsim` computes the similarity itself.
fn similarity_ceiling(a: usize, b: usize) -> f64 {
    let longest = a.max(b);
    if longest == 0 {
        return 1.0;
    }
    1.0 - a.abs_diff(b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{DocumentKind, MatchMethod, RequirementKind};
    use crate::analysis::normalizer::normalize;
    use std::collections::BTreeSet;

    fn requirement(name: &str, synonyms: &[&str]) -> Requirement {
        Requirement {
            kind: RequirementKind::MustHave,
            skill_name: name.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            min_experience_years: None,
        }
    }

    fn resume(text: &str) -> NormalizedDocument {
        normalize(text, DocumentKind::Resume).unwrap()
    }

    #[test]
    fn test_exact_match_any_separator() {
        let req = requirement("nodejs", &["node.js"]);
        for text in ["Built services in Node JS", "node.js APIs", "NodeJS", "NODE.JS daily"] {
            let signals = hard_match(&resume(text), &[req.clone()], 0.8);
            assert_eq!(signals.len(), 1, "{text}");
            assert_eq!(signals[0].method(), MatchMethod::Exact);
            assert_eq!(signals[0].confidence(), 1.0);
        }
    }

    #[test]
    fn test_exact_via_synonym_carries_sentence_evidence() {
        let req = requirement("kubernetes", &["k8s"]);
        let signals = hard_match(&resume("Skills\nDeployed on K8s clusters."), &[req], 0.8);
        assert_eq!(signals[0].method(), MatchMethod::Exact);
        assert_eq!(signals[0].evidence(), Some("Deployed on K8s clusters."));
    }

    #[test]
    fn test_exact_dominates_fuzzy() {
        let req = requirement("python", &[]);
        let signals = hard_match(&resume("Pythn scripts. Python services."), &[req], 0.8);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].method(), MatchMethod::Exact);
    }

    #[test]
    fn test_fuzzy_match_on_typo() {
        let req = requirement("kubernetes", &[]);
        let signals = hard_match(&resume("Operated Kubernets in production"), &[req], 0.8);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].method(), MatchMethod::Fuzzy);
        assert!((signals[0].confidence() - 0.9).abs() < 1e-6);
        assert_eq!(signals[0].evidence(), Some("kubernets"));
    }

    #[test]
    fn test_fuzzy_respects_threshold() {
        let req = requirement("kubernetes", &[]);
        assert!(hard_match(&resume("Operated Kubernets"), &[req.clone()], 0.95).is_empty());
        assert_eq!(hard_match(&resume("Operated Kubernets"), &[req], 0.85).len(), 1);
    }

    #[test]
    fn test_fuzzy_accepts_similarity_equal_to_threshold() {
        let req = requirement("rust", &[]);
        let signals = hard_match(&resume("Built tools in Rustc daily"), &[req], 0.8);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].method(), MatchMethod::Fuzzy);
        assert_eq!(signals[0].confidence(), 0.8);
        assert_eq!(signals[0].evidence(), Some("rustc"));
    }

    #[test]
    fn test_similarity_ceiling_matches_length_gap() {
        assert_eq!(similarity_ceiling(4, 5) as f32, 0.8);
        assert_eq!(similarity_ceiling(0, 0), 1.0);
        assert!(similarity_ceiling(4, 10) < 0.8);
    }

    #[test]
    fn test_short_forms_are_never_fuzzy() {
        let req = requirement("sql", &[]);
        assert!(hard_match(&resume("Wrote sq1 queries with mysql"), &[req], 0.5).is_empty());
    }

    #[test]
    fn test_slashed_skills_match_both_ways() {
        let reqs = vec![
            requirement("python", &[]),
            requirement("sql", &[]),
            requirement("ci/cd", &[]),
        ];
        let signals = hard_match(&resume("Python/SQL reporting. Owned the CI/CD setup."), &reqs, 0.8);
        assert_eq!(signals.len(), 3);
        assert!(signals.iter().all(|s| s.method() == MatchMethod::Exact));
    }

    #[test]
    fn test_substring_is_not_exact() {
        let java = requirement("java", &[]);
        let signals = hard_match(&resume("JavaScript and TypeScript"), &[java], 0.8);
        assert!(signals.is_empty());
    }

    #[test]
    fn test_has_exact_match_ignores_fuzzy_hits() {
        let doc = resume("Operated Kubernets and Docker");
        assert!(has_exact_match(&doc, &requirement("docker", &[])));
        assert!(!has_exact_match(&doc, &requirement("kubernetes", &[])));
    }

    #[test]
    fn test_signals_follow_requirement_order_and_skip_unmatched() {
        let reqs = vec![
            requirement("docker", &[]),
            requirement("python", &[]),
            requirement("rust", &[]),
        ];
        let signals = hard_match(&resume("Python and Rust"), &reqs, 0.8);
        let names: Vec<&str> = signals.iter().map(|s| s.requirement().skill_name.as_str()).collect();
        assert_eq!(names, vec!["python", "rust"]);
    }
}

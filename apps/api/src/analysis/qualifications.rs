//! Experience-year and education-level detection shared by the extractor
//! (what the JD asks for) and the feedback generator (what the resume shows).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::models::{NormalizedDocument, Sentence};
use crate::analysis::normalizer::fold;

/// "3+ years", "5 yrs", "2.5 years", also matched after "minimum"/"at least".
static YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}(?:\.\d)?)\s*\+?\s*(?:-\s*\d{1,2}\s*)?(?:years?|yrs?)\b")
        .expect("years pattern compiles")
});

/// Largest years figure mentioned in a sentence, if any.
pub fn years_in_sentence(sentence: &Sentence) -> Option<f32> {
    let text = sentence.tokens.join(" ");
    YEARS
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f32>().ok())
        .fold(None, |best: Option<f32>, years| {
            Some(best.map_or(years, |b| b.max(years)))
        })
}

/// True when a sentence talks about experience rather than e.g. company age.
pub fn mentions_experience(sentence: &Sentence) -> bool {
    sentence
        .tokens
        .iter()
        .any(|t| t.starts_with("experience") || t == "exp")
}

/// Highest years-of-experience figure the resume declares.
pub fn declared_experience_years(resume: &NormalizedDocument) -> Option<f32> {
    resume
        .sentences()
        .filter_map(years_in_sentence)
        .fold(None, |best: Option<f32>, years| {
            Some(best.map_or(years, |b| b.max(years)))
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    Diploma,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            EducationLevel::Diploma => "diploma",
            EducationLevel::Bachelor => "bachelor's degree",
            EducationLevel::Master => "master's degree",
            EducationLevel::Doctorate => "doctorate",
        }
    }
}

const BACHELOR_FORMS: &[&str] = &["bachelor", "bachelors", "bsc", "btech", "undergraduate"];
const MASTER_FORMS: &[&str] = &["msc", "mtech", "mba", "postgraduate"];
const DOCTORATE_FORMS: &[&str] = &["phd", "doctorate", "doctoral"];

/// Education levels named anywhere in the document, lowest first.
///
/// A bare "degree" counts as a bachelor's degree when no level is named.
/// "master" only counts next to "degree"/"in"/"of"/"'s" so "scrum master"
/// does not read as a postgraduate degree.
pub fn education_levels(document: &NormalizedDocument) -> Vec<EducationLevel> {
    let mut levels = Vec::new();
    let mut generic_degree = false;

    for sentence in document.sentences() {
        let folded: Vec<String> = sentence.tokens.iter().map(|t| fold(t)).collect();
        for (idx, token) in folded.iter().enumerate() {
            let next = folded.get(idx + 1).map(String::as_str);
            let level = match token.as_str() {
                t if BACHELOR_FORMS.contains(&t) => Some(EducationLevel::Bachelor),
                t if MASTER_FORMS.contains(&t) => Some(EducationLevel::Master),
                "master" | "masters" if matches!(next, Some("degree" | "in" | "of" | "s")) => {
                    Some(EducationLevel::Master)
                }
                t if DOCTORATE_FORMS.contains(&t) => Some(EducationLevel::Doctorate),
                "diploma" => Some(EducationLevel::Diploma),
                "degree" => {
                    generic_degree = true;
                    None
                }
                _ => None,
            };
            if let Some(level) = level {
                if !levels.contains(&level) {
                    levels.push(level);
                }
            }
        }
    }

    if levels.is_empty() && generic_degree {
        levels.push(EducationLevel::Bachelor);
    }
    levels.sort();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::DocumentKind;
    use crate::analysis::normalizer::normalize;

    fn sentence(text: &str) -> Sentence {
        normalize(text, DocumentKind::JD).unwrap().sentences().next().unwrap().clone()
    }

    #[test]
    fn test_years_patterns() {
        assert_eq!(years_in_sentence(&sentence("3+ years of experience with Python")), Some(3.0));
        assert_eq!(years_in_sentence(&sentence("Minimum 5 years in backend roles")), Some(5.0));
        assert_eq!(years_in_sentence(&sentence("at least 2 yrs exp")), Some(2.0));
        assert_eq!(years_in_sentence(&sentence("3-5 years experience")), Some(3.0));
        assert_eq!(years_in_sentence(&sentence("2.5 years as analyst")), Some(2.5));
        assert_eq!(years_in_sentence(&sentence("Python and SQL")), None);
    }

    #[test]
    fn test_mentions_experience() {
        assert!(mentions_experience(&sentence("Experienced in SQL")));
        assert!(mentions_experience(&sentence("4 years of experience")));
        assert!(!mentions_experience(&sentence("Founded 20 years ago")));
    }

    #[test]
    fn test_declared_experience_takes_max() {
        let resume = normalize(
            "Analyst with 2 years at Acme.\nOverall 4+ years in data work.",
            DocumentKind::Resume,
        )
        .unwrap();
        assert_eq!(declared_experience_years(&resume), Some(4.0));

        let fresher = normalize("Recent graduate", DocumentKind::Resume).unwrap();
        assert_eq!(declared_experience_years(&fresher), None);
    }

    #[test]
    fn test_education_levels_detected() {
        let doc = normalize(
            "Bachelor's or Master's degree in Computer Science; PhD a plus",
            DocumentKind::JD,
        )
        .unwrap();
        assert_eq!(
            education_levels(&doc),
            vec![EducationLevel::Bachelor, EducationLevel::Master, EducationLevel::Doctorate]
        );
    }

    #[test]
    fn test_scrum_master_is_not_a_degree() {
        let doc = normalize("Certified Scrum Master", DocumentKind::Resume).unwrap();
        assert!(education_levels(&doc).is_empty());
    }

    #[test]
    fn test_generic_degree_means_bachelor() {
        let doc = normalize("A degree in a quantitative field", DocumentKind::JD).unwrap();
        assert_eq!(education_levels(&doc), vec![EducationLevel::Bachelor]);

        let doc = normalize("B.Tech, Computer Science", DocumentKind::Resume).unwrap();
        assert_eq!(education_levels(&doc), vec![EducationLevel::Bachelor]);
    }
}

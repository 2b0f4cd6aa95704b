//! Requirement Extractor — turns a normalized JD into a `JobProfile`.
//!
//! Vocabulary-driven and deterministic: skills are detected by canonical or
//! synonym match, classified MustHave/NiceToHave from section and sentence
//! language, and ordered by first mention.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::models::{
    NormalizedDocument, Requirement, RequirementKind, SectionTag, Sentence,
};
use crate::analysis::normalizer::{fold, tokenize};
use crate::analysis::qualifications::{
    education_levels, mentions_experience, years_in_sentence, EducationLevel,
};
use crate::analysis::vocabulary::SkillVocabulary;

/// Phrases that make a skill mandatory. Matched on folded tokens.
const MUST_HAVE_PHRASES: &[&[&str]] = &[
    &["required"],
    &["requires"],
    &["require"],
    &["must"],
    &["essential"],
    &["mandatory"],
    &["proficient"],
    &["proficiency"],
    &["expertise"],
    &["need", "to", "have"],
];

/// Phrases that mark a clause as optional even inside a mandatory sentence.
const NICE_TO_HAVE_PHRASES: &[&[&str]] = &[
    &["plus"],
    &["preferred"],
    &["preferably"],
    &["bonus"],
    &["desirable"],
    &["optional"],
    &["advantage"],
    &["advantageous"],
    &["nice", "to", "have"],
    &["good", "to", "have"],
];

const TITLE_PREFIXES: &[&str] = &["job title", "title", "position", "role"];
const MAX_TITLE_WORDS: usize = 12;

/// Structured view of a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    pub role_title: Option<String>,
    pub requirements: Vec<Requirement>,
    /// Largest experience figure the JD asks for anywhere.
    pub min_experience_years: Option<f32>,
    /// Lowest degree level that satisfies the JD, if it names one.
    pub education: Option<EducationLevel>,
}

/// Extracts requirements, role title, experience and education asks from a JD.
pub fn extract_requirements(jd: &NormalizedDocument, vocabulary: &SkillVocabulary) -> JobProfile {
    let scoped = jd.sections().iter().any(|s| s.tag.is_requirement_section());

    let mut requirements: Vec<Requirement> = Vec::new();
    let mut positions: HashMap<usize, usize> = HashMap::new();
    let mut min_experience_years: Option<f32> = None;

    for section in jd.sections() {
        let in_scope = !scoped || section.tag.is_requirement_section();

        for sentence in &section.sentences {
            let years = years_in_sentence(sentence);
            if !in_scope {
                if let Some(years) = years.filter(|_| mentions_experience(sentence)) {
                    min_experience_years = Some(max_years(min_experience_years, years));
                }
                continue;
            }

            let mentions = vocabulary.find_mentions(&sentence.tokens);
            if let Some(years) = years.filter(|_| !mentions.is_empty() || mentions_experience(sentence)) {
                min_experience_years = Some(max_years(min_experience_years, years));
            }

            let clauses = clause_ids(sentence);
            let sentence_must = contains_phrase(&sentence.tokens, MUST_HAVE_PHRASES);

            for mention in mentions {
                let clause = clauses.get(mention.start).copied().unwrap_or(0);
                let clause_tokens: Vec<String> = sentence
                    .tokens
                    .iter()
                    .zip(&clauses)
                    .filter(|(_, id)| **id == clause)
                    .map(|(t, _)| t.clone())
                    .collect();

                let kind = match section.tag {
                    SectionTag::MustHave => RequirementKind::MustHave,
                    SectionTag::NiceToHave => RequirementKind::NiceToHave,
                    _ if contains_phrase(&clause_tokens, NICE_TO_HAVE_PHRASES) => {
                        RequirementKind::NiceToHave
                    }
                    _ if sentence_must => RequirementKind::MustHave,
                    _ => RequirementKind::NiceToHave,
                };

                let entry = vocabulary.entry(mention.entry);
                let mention_years = years.filter(|_| {
                    mentions_experience(sentence) || years_follow_skill(sentence, mention.start)
                });

                match positions.get(&mention.entry) {
                    Some(&idx) => {
                        let existing = &mut requirements[idx];
                        if kind == RequirementKind::MustHave {
                            existing.kind = RequirementKind::MustHave;
                        }
                        if let Some(years) = mention_years {
                            existing.min_experience_years =
                                Some(max_years(existing.min_experience_years, years));
                        }
                    }
                    None => {
                        positions.insert(mention.entry, requirements.len());
                        requirements.push(Requirement {
                            kind,
                            skill_name: entry.canonical.clone(),
                            synonyms: entry.synonyms.clone(),
                            min_experience_years: mention_years,
                        });
                    }
                }
            }
        }
    }

    let profile = JobProfile {
        role_title: role_title(jd),
        requirements,
        min_experience_years,
        education: education_levels(jd).into_iter().next(),
    };

    debug!(
        requirements = profile.requirements.len(),
        must_have = profile
            .requirements
            .iter()
            .filter(|r| r.kind == RequirementKind::MustHave)
            .count(),
        min_experience_years = ?profile.min_experience_years,
        role_title = ?profile.role_title,
        "extracted job profile"
    );

    profile
}

fn max_years(current: Option<f32>, years: f32) -> f32 {
    current.map_or(years, |c| c.max(years))
}

/// Clause index for every token, clauses being comma-separated runs of the sentence.
fn clause_ids(sentence: &Sentence) -> Vec<usize> {
    let mut ids = Vec::with_capacity(sentence.tokens.len());
    for (clause, text) in sentence.text.split(',').enumerate() {
        ids.extend(std::iter::repeat(clause).take(tokenize(text).len()));
    }
    ids
}

/// "Python (3+ years)" attaches the figure to the skill even without the word "experience".
fn years_follow_skill(sentence: &Sentence, start: usize) -> bool {
    sentence.tokens[start..]
        .iter()
        .take(6)
        .any(|t| t.starts_with("year") || t.starts_with("yr"))
}

fn contains_phrase(tokens: &[String], phrases: &[&[&str]]) -> bool {
    let folded: Vec<String> = tokens.iter().map(|t| fold(t)).collect();
    phrases.iter().any(|phrase| {
        folded
            .windows(phrase.len())
            .any(|window| window.iter().zip(phrase.iter()).all(|(a, b)| a == b))
    })
}

/// First short line of the leading Body section, minus any "Title:" prefix.
fn role_title(jd: &NormalizedDocument) -> Option<String> {
    let body = jd.sections().first().filter(|s| s.tag == SectionTag::Body)?;
    let sentence = body.sentences.first()?;

    if sentence.tokens.len() > MAX_TITLE_WORDS
        || years_in_sentence(sentence).is_some()
        || contains_phrase(&sentence.tokens, MUST_HAVE_PHRASES)
    {
        return None;
    }

    let mut title = sentence.text.trim_end_matches(['.', ':', ';']).trim();
    if let Some((prefix, rest)) = title.split_once(':') {
        if TITLE_PREFIXES.contains(&prefix.trim().to_lowercase().as_str()) {
            title = rest.trim();
        }
    }

    (!title.is_empty()).then(|| title.to_string())
}

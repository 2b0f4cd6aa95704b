//! Core data model shared by every stage of the relevance pipeline.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Normalized documents
// ────────────────────────────────────────────────────────────────────────────

/// Which side of the comparison a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Resume,
    JD,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Resume => write!(f, "resume"),
            DocumentKind::JD => write!(f, "job description"),
        }
    }
}

/// Recognized section headings. `Body` holds text outside any heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionTag {
    Body,
    Summary,
    Education,
    Experience,
    Skills,
    Projects,
    Certifications,
    Requirements,
    Qualifications,
    Responsibilities,
    MustHave,
    NiceToHave,
    About,
}

impl SectionTag {
    pub fn display_name(&self) -> &'static str {
        match self {
            SectionTag::Body => "Body",
            SectionTag::Summary => "Summary",
            SectionTag::Education => "Education",
            SectionTag::Experience => "Experience",
            SectionTag::Skills => "Skills",
            SectionTag::Projects => "Projects",
            SectionTag::Certifications => "Certifications",
            SectionTag::Requirements => "Requirements",
            SectionTag::Qualifications => "Qualifications",
            SectionTag::Responsibilities => "Responsibilities",
            SectionTag::MustHave => "Must Have",
            SectionTag::NiceToHave => "Nice To Have",
            SectionTag::About => "About",
        }
    }

    /// JD sections that carry requirement language.
    pub fn is_requirement_section(&self) -> bool {
        matches!(
            self,
            SectionTag::Requirements
                | SectionTag::Qualifications
                | SectionTag::Responsibilities
                | SectionTag::MustHave
                | SectionTag::NiceToHave
        )
    }

    /// Resume sections worth comparing semantically against a skill.
    pub fn is_evidence_section(&self) -> bool {
        matches!(
            self,
            SectionTag::Summary
                | SectionTag::Skills
                | SectionTag::Experience
                | SectionTag::Projects
                | SectionTag::Certifications
        )
    }
}

/// A sentence keeps its original wording for evidence alongside normalized tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub text: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub tag: SectionTag,
    pub sentences: Vec<Sentence>,
}

/// Output of the normalizer. Fields are private so a document cannot change
/// after it is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDocument {
    kind: DocumentKind,
    sections: Vec<Section>,
}

impl NormalizedDocument {
    pub(crate) fn new(kind: DocumentKind, sections: Vec<Section>) -> Self {
        Self { kind, sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.sections.iter().flat_map(|s| s.sentences.iter())
    }

    pub fn token_count(&self) -> usize {
        self.sentences().map(|s| s.tokens.len()).sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requirements and signals
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementKind {
    MustHave,
    NiceToHave,
}

/// One skill a JD asks for. Unique by `skill_name` within a JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub skill_name: String,
    pub synonyms: BTreeSet<String>,
    pub min_experience_years: Option<f32>,
}

impl Requirement {
    /// Canonical name followed by every synonym.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.skill_name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }

    /// Text handed to the similarity provider for this requirement.
    pub fn description(&self) -> String {
        if self.synonyms.is_empty() {
            self.skill_name.clone()
        } else {
            let synonyms: Vec<&str> = self.synonyms.iter().map(String::as_str).collect();
            format!("{} ({})", self.skill_name, synonyms.join(", "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Semantic,
}

/// Evidence that a requirement is covered by the resume.
///
/// Confidence is clamped to [0, 1] on construction and Exact signals always
/// carry 1.0, so neither invariant can be broken by a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSignal {
    requirement: Requirement,
    method: MatchMethod,
    confidence: f32,
    evidence: Option<String>,
}

impl MatchSignal {
    pub fn exact(requirement: Requirement, evidence: Option<String>) -> Self {
        Self {
            requirement,
            method: MatchMethod::Exact,
            confidence: 1.0,
            evidence,
        }
    }

    pub fn fuzzy(requirement: Requirement, confidence: f32, evidence: Option<String>) -> Self {
        Self::scored(requirement, MatchMethod::Fuzzy, confidence, evidence)
    }

    pub fn semantic(requirement: Requirement, confidence: f32, evidence: Option<String>) -> Self {
        Self::scored(requirement, MatchMethod::Semantic, confidence, evidence)
    }

    fn scored(
        requirement: Requirement,
        method: MatchMethod,
        confidence: f32,
        evidence: Option<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            requirement,
            method,
            confidence,
            evidence,
        }
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn method(&self) -> MatchMethod {
        self.method
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn evidence(&self) -> Option<&str> {
        self.evidence.as_deref()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

/// Immutable outcome of one (resume, JD) evaluation. Only the orchestrator
/// builds these.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    resume_id: String,
    jd_id: String,
    score: u8,
    verdict: Verdict,
    matched: Vec<MatchSignal>,
    missing: Vec<Requirement>,
    feedback: Vec<String>,
    computed_at: DateTime<Utc>,
    degraded: bool,
    role_title: Option<String>,
    resume_experience_years: Option<f32>,
    narrative: Option<String>,
}

pub(crate) struct EvaluationParts {
    pub resume_id: String,
    pub jd_id: String,
    pub score: u8,
    pub verdict: Verdict,
    pub matched: Vec<MatchSignal>,
    pub missing: Vec<Requirement>,
    pub feedback: Vec<String>,
    pub degraded: bool,
    pub role_title: Option<String>,
    pub resume_experience_years: Option<f32>,
}

impl EvaluationResult {
    pub(crate) fn from_parts(parts: EvaluationParts) -> Self {
        Self {
            resume_id: parts.resume_id,
            jd_id: parts.jd_id,
            score: parts.score,
            verdict: parts.verdict,
            matched: parts.matched,
            missing: parts.missing,
            feedback: parts.feedback,
            computed_at: Utc::now(),
            degraded: parts.degraded,
            role_title: parts.role_title,
            resume_experience_years: parts.resume_experience_years,
            narrative: None,
        }
    }

    /// Attaches the optional model-written summary.
    pub(crate) fn with_narrative(mut self, narrative: Option<String>) -> Self {
        self.narrative = narrative;
        self
    }

    pub fn resume_id(&self) -> &str {
        &self.resume_id
    }

    pub fn jd_id(&self) -> &str {
        &self.jd_id
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn matched(&self) -> &[MatchSignal] {
        &self.matched
    }

    pub fn missing(&self) -> &[Requirement] {
        &self.missing
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    /// True when semantic signals were dropped because the provider failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn role_title(&self) -> Option<&str> {
        self.role_title.as_deref()
    }

    /// Flattens the result into the record handed to storage/UI collaborators.
    pub fn to_record(&self) -> EvaluationRecord {
        EvaluationRecord {
            resume_id: self.resume_id.clone(),
            jd_id: self.jd_id.clone(),
            score: self.score,
            verdict: self.verdict,
            matched: self
                .matched
                .iter()
                .map(|signal| MatchedSkill {
                    skill: signal.requirement.skill_name.clone(),
                    kind: signal.requirement.kind,
                    method: signal.method,
                    confidence: signal.confidence,
                    evidence: signal.evidence.clone(),
                })
                .collect(),
            missing: self.missing.iter().map(MissingSkill::from).collect(),
            feedback: self.feedback.clone(),
            narrative: self.narrative.clone(),
            computed_at: self.computed_at,
            degraded: self.degraded,
            role_title: self.role_title.clone(),
            resume_experience_years: self.resume_experience_years,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedSkill {
    pub skill: String,
    pub kind: RequirementKind,
    pub method: MatchMethod,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingSkill {
    pub skill: String,
    pub kind: RequirementKind,
}

impl From<&Requirement> for MissingSkill {
    fn from(requirement: &Requirement) -> Self {
        Self {
            skill: requirement.skill_name.clone(),
            kind: requirement.kind,
        }
    }
}

/// Serialized form of an `EvaluationResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub resume_id: String,
    pub jd_id: String,
    pub score: u8,
    pub verdict: Verdict,
    pub matched: Vec<MatchedSkill>,
    pub missing: Vec<MissingSkill>,
    pub feedback: Vec<String>,
    /// Model-written summary; absent when no narrator is configured or it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    pub computed_at: DateTime<Utc>,
    pub degraded: bool,
    pub role_title: Option<String>,
    pub resume_experience_years: Option<f32>,
}

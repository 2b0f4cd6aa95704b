//! Ranked, concrete improvement notes for one evaluation.
//!
//! Every line names a specific requirement or gap. Order:
//! missing must-haves, missing nice-to-haves, experience gaps, education gap.

use crate::analysis::models::{MatchSignal, Requirement, RequirementKind, Verdict};
use crate::analysis::qualifications::EducationLevel;
use crate::analysis::requirements::JobProfile;

/// What the generator needs to know about one evaluation.
pub struct FeedbackInput<'a> {
    pub profile: &'a JobProfile,
    pub matched: &'a [MatchSignal],
    pub missing: &'a [Requirement],
    pub verdict: Verdict,
    pub resume_experience_years: Option<f32>,
    /// Levels the resume mentions, lowest first.
    pub resume_education: &'a [EducationLevel],
}

pub fn generate_feedback(input: &FeedbackInput<'_>) -> Vec<String> {
    let mut feedback = Vec::new();

    for requirement in input.missing.iter().filter(|r| r.kind == RequirementKind::MustHave) {
        feedback.push(missing_must_have(requirement, input.verdict));
    }

    for requirement in input.missing.iter().filter(|r| r.kind == RequirementKind::NiceToHave) {
        feedback.push(format!(
            "Missing nice-to-have skill: {}",
            requirement.skill_name
        ));
    }

    feedback.extend(experience_gaps(input));

    if let Some(line) = education_gap(input.profile.education, input.resume_education) {
        feedback.push(line);
    }

    feedback
}

fn missing_must_have(requirement: &Requirement, verdict: Verdict) -> String {
    let years = requirement
        .min_experience_years
        .map(|y| format!(" ({y}+ years expected)"))
        .unwrap_or_default();

    match verdict {
        Verdict::Low => format!(
            "Critical gap: must-have skill {}{years} was not found in the resume",
            requirement.skill_name
        ),
        Verdict::Medium | Verdict::High => {
            format!("Missing must-have skill: {}{years}", requirement.skill_name)
        }
    }
}

/// Gaps are only reported against a figure the resume actually states.
/// Missing requirements already carry their years in the lines above.
fn experience_gaps(input: &FeedbackInput<'_>) -> Vec<String> {
    let Some(declared) = input.resume_experience_years else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut largest_reported: Option<f32> = None;

    for signal in input.matched {
        let requirement = signal.requirement();
        let Some(required) = requirement.min_experience_years else {
            continue;
        };
        if required > declared {
            lines.push(format!(
                "Experience gap: {} asks for {required}+ years, resume shows {declared}",
                requirement.skill_name
            ));
            largest_reported = Some(largest_reported.map_or(required, |r| r.max(required)));
        }
    }

    if let Some(required) = input.profile.min_experience_years {
        let covered = largest_reported.is_some_and(|r| r >= required);
        if required > declared && !covered {
            let role = input.profile.role_title.as_deref().unwrap_or("the role");
            lines.push(format!(
                "Experience gap: {role} asks for {required}+ years of experience, resume shows {declared}"
            ));
        }
    }

    lines
}

fn education_gap(required: Option<EducationLevel>, resume: &[EducationLevel]) -> Option<String> {
    let required = required?;
    match resume.iter().max() {
        Some(highest) if *highest >= required => None,
        Some(highest) => Some(format!(
            "Education gap: {} or higher expected, resume shows {}",
            required.label(),
            highest.label()
        )),
        None => Some(format!(
            "Education gap: {} or higher expected, none found in the resume",
            required.label()
        )),
    }
}

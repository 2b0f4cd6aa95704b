// Prompt text for narrative feedback.

use crate::analysis::models::RequirementKind;

use super::NarrativeRequest;

pub const NARRATIVE_SYSTEM: &str = "You are an experienced career coach. \
    Write plain prose, no markdown headings. \
    Only discuss the skills and gaps listed in the analysis. \
    Do NOT invent experience the candidate has not shown.";

const INSTRUCTIONS: &str = "\
    Write a short summary (at most 5 sentences) for the candidate: \
    one sentence on overall fit, one on their strongest matches, \
    then concrete next steps for the most important gaps, in the order given.";

/// Renders the automated analysis as the user prompt.
pub fn build_narrative_prompt(request: &NarrativeRequest) -> String {
    let role = request.role_title.as_deref().unwrap_or("the role");

    let matched = if request.matched_skills.is_empty() {
        "none of the required skills were found".to_string()
    } else {
        request.matched_skills.join(", ")
    };

    let missing = if request.missing_skills.is_empty() {
        "none".to_string()
    } else {
        request
            .missing_skills
            .iter()
            .map(|m| match m.kind {
                RequirementKind::MustHave => format!("{} (must-have)", m.skill),
                RequirementKind::NiceToHave => format!("{} (nice-to-have)", m.skill),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut prompt = format!(
        "AUTOMATED ANALYSIS for {role}:\n\
         - Match score: {}/100 ({:?} fit)\n\
         - Skills found: {matched}\n\
         - Skills missing: {missing}\n",
        request.score, request.verdict
    );

    if !request.feedback.is_empty() {
        prompt.push_str("- Ranked gaps:\n");
        for (rank, line) in request.feedback.iter().enumerate() {
            prompt.push_str(&format!("  {}. {line}\n", rank + 1));
        }
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

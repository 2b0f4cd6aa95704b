//! Text Normalizer — turns raw resume/JD text into a `NormalizedDocument`.
//!
//! Lowercases and tokenizes, keeps the punctuation that is part of skill names
//! (`c++`, `c#`, `node.js`, `front-end`), splits the text into sections using a
//! small table of heading aliases and falls back to a single `Body` section.

use tracing::debug;

use crate::analysis::errors::AnalysisError;
use crate::analysis::models::{DocumentKind, NormalizedDocument, Section, SectionTag, Sentence};

/// Headings longer than this are treated as content.
const MAX_HEADING_WORDS: usize = 5;

const RESUME_HEADINGS: &[(&str, SectionTag)] = &[
    ("summary", SectionTag::Summary),
    ("professional summary", SectionTag::Summary),
    ("profile", SectionTag::Summary),
    ("objective", SectionTag::Summary),
    ("about me", SectionTag::Summary),
    ("education", SectionTag::Education),
    ("academic background", SectionTag::Education),
    ("academics", SectionTag::Education),
    ("education and training", SectionTag::Education),
    ("experience", SectionTag::Experience),
    ("work experience", SectionTag::Experience),
    ("professional experience", SectionTag::Experience),
    ("employment history", SectionTag::Experience),
    ("work history", SectionTag::Experience),
    ("internships", SectionTag::Experience),
    ("internship", SectionTag::Experience),
    ("skills", SectionTag::Skills),
    ("technical skills", SectionTag::Skills),
    ("core skills", SectionTag::Skills),
    ("key skills", SectionTag::Skills),
    ("skill set", SectionTag::Skills),
    ("technologies", SectionTag::Skills),
    ("tech stack", SectionTag::Skills),
    ("projects", SectionTag::Projects),
    ("project", SectionTag::Projects),
    ("personal projects", SectionTag::Projects),
    ("academic projects", SectionTag::Projects),
    ("certifications", SectionTag::Certifications),
    ("certification", SectionTag::Certifications),
    ("certificates", SectionTag::Certifications),
    ("licenses and certifications", SectionTag::Certifications),
    ("courses", SectionTag::Certifications),
];

const JD_HEADINGS: &[(&str, SectionTag)] = &[
    ("requirements", SectionTag::Requirements),
    ("job requirements", SectionTag::Requirements),
    ("skills", SectionTag::Requirements),
    ("technical skills", SectionTag::Requirements),
    ("tech stack", SectionTag::Requirements),
    ("what were looking for", SectionTag::Requirements),
    ("qualifications", SectionTag::Qualifications),
    ("minimum qualifications", SectionTag::Qualifications),
    ("basic qualifications", SectionTag::Qualifications),
    ("education", SectionTag::Qualifications),
    ("who you are", SectionTag::Qualifications),
    ("responsibilities", SectionTag::Responsibilities),
    ("key responsibilities", SectionTag::Responsibilities),
    ("duties", SectionTag::Responsibilities),
    ("what youll do", SectionTag::Responsibilities),
    ("the role", SectionTag::Responsibilities),
    ("must have", SectionTag::MustHave),
    ("must haves", SectionTag::MustHave),
    ("required", SectionTag::MustHave),
    ("required skills", SectionTag::MustHave),
    ("mandatory", SectionTag::MustHave),
    ("mandatory skills", SectionTag::MustHave),
    ("essential", SectionTag::MustHave),
    ("essential skills", SectionTag::MustHave),
    ("nice to have", SectionTag::NiceToHave),
    ("nice to haves", SectionTag::NiceToHave),
    ("good to have", SectionTag::NiceToHave),
    ("preferred", SectionTag::NiceToHave),
    ("preferred skills", SectionTag::NiceToHave),
    ("preferred qualifications", SectionTag::NiceToHave),
    ("bonus", SectionTag::NiceToHave),
    ("bonus points", SectionTag::NiceToHave),
    ("desirable", SectionTag::NiceToHave),
    ("about", SectionTag::About),
    ("about us", SectionTag::About),
    ("about the company", SectionTag::About),
    ("who we are", SectionTag::About),
    ("benefits", SectionTag::About),
    ("perks", SectionTag::About),
];

/// Normalizes raw text. Fails only when the text is empty or whitespace.
pub fn normalize(raw: &str, kind: DocumentKind) -> Result<NormalizedDocument, AnalysisError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::Normalization {
            kind,
            reason: "text is empty".to_string(),
        });
    }

    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        name: SectionTag::Body.display_name().to_string(),
        tag: SectionTag::Body,
        sentences: Vec::new(),
    };

    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match detect_heading(line, kind) {
            Some((tag, inline)) => {
                push_section(&mut sections, current);
                current = Section {
                    name: tag.display_name().to_string(),
                    tag,
                    sentences: Vec::new(),
                };
                if let Some(inline) = inline {
                    current.sentences.extend(split_sentences(inline));
                }
            }
            None => current.sentences.extend(split_sentences(line)),
        }
    }
    push_section(&mut sections, current);

    // Punctuation-only input still yields a (degenerate) Body section.
    if sections.is_empty() {
        sections.push(Section {
            name: SectionTag::Body.display_name().to_string(),
            tag: SectionTag::Body,
            sentences: vec![Sentence {
                text: trimmed.to_string(),
                tokens: Vec::new(),
            }],
        });
    }

    let document = NormalizedDocument::new(kind, sections);
    debug!(
        kind = %kind,
        sections = document.sections().len(),
        tokens = document.token_count(),
        "normalized document"
    );
    Ok(document)
}

fn push_section(sections: &mut Vec<Section>, section: Section) {
    if section.sentences.is_empty() {
        return;
    }
    // Repeated headings ("Skills" twice) fold into the earlier section.
    if let Some(existing) = sections
        .iter_mut()
        .find(|s| s.tag == section.tag && s.tag != SectionTag::Body)
    {
        existing.sentences.extend(section.sentences);
    } else {
        sections.push(section);
    }
}

/// Returns the section tag and any inline content after a `Heading:` prefix.
fn detect_heading(line: &str, kind: DocumentKind) -> Option<(SectionTag, Option<&str>)> {
    let (head, inline) = match line.split_once(':') {
        Some((head, rest)) => {
            let rest = rest.trim();
            (head, if rest.is_empty() { None } else { Some(rest) })
        }
        None => (line, None),
    };

    let key = heading_key(head);
    if key.is_empty() || key.split(' ').count() > MAX_HEADING_WORDS {
        return None;
    }

    let table = match kind {
        DocumentKind::Resume => RESUME_HEADINGS,
        DocumentKind::JD => JD_HEADINGS,
    };
    table
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, tag)| (*tag, inline))
}

/// "## Nice-to-Have:" → "nice to have"; "What We're Looking For" → "what were looking for".
fn heading_key(head: &str) -> String {
    let cleaned: String = head
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a line on sentence punctuation followed by whitespace.
fn split_sentences(line: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let at_boundary = matches!(c, '.' | ';' | '!' | '?')
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = idx + c.len_utf8();
            push_sentence(&mut sentences, &line[start..end]);
            start = end;
        }
    }
    push_sentence(&mut sentences, &line[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<Sentence>, text: &str) {
    let text = text.trim();
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return;
    }
    sentences.push(Sentence {
        text: text.to_string(),
        tokens,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Token helpers (shared with the extractor and matchers)
// ────────────────────────────────────────────────────────────────────────────

/// Lowercases and splits text into tokens, keeping `+ # . - _` inside tokens.
/// `/` is a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_token_char(c))
        .filter_map(clean_token)
        .collect()
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-' | '_')
}

fn clean_token(raw: &str) -> Option<String> {
    let token = raw
        .trim_end_matches(|c: char| matches!(c, '.' | '-' | '_'))
        .trim_start_matches(|c: char| matches!(c, '-' | '_' | '+' | '#'));

    // A single leading dot survives for names like ".net".
    let token = match token.strip_prefix('.') {
        Some(rest) if rest.starts_with(|c: char| c.is_alphabetic()) => token,
        Some(rest) => rest.trim_start_matches('.'),
        None => token,
    };

    if token.chars().any(char::is_alphanumeric) {
        Some(token.to_string())
    } else {
        None
    }
}

/// Separator-insensitive comparison key: "Node.js", "node js" and "NodeJS"
/// all fold to "nodejs". `+` and `#` are kept so "c++" and "c#" stay distinct.
pub fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '+' | '#'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Folds a run of tokens into a single key.
pub fn fold_tokens(tokens: &[String]) -> String {
    tokens.iter().map(|t| fold(t)).collect()
}

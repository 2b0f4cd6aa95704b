//! Canonical skill names and their synonyms.
//!
//! Loaded once at startup (JSON object `{ "canonical": ["synonym", ...] }`) and
//! shared read-only across evaluations. Lookups are separator-insensitive:
//! every form is indexed by its folded key (see `normalizer::fold`).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use tracing::info;

use crate::analysis::errors::ConfigurationError;
use crate::analysis::normalizer::{fold, fold_tokens, tokenize};

/// Skills recognized when no vocabulary file is configured.
///
/// Bare suffix synonyms such as "js" are left out: the exact pass would find
/// them inside "Node JS" or "Vue JS".
const BUILTIN_SKILLS: &[(&str, &[&str])] = &[
    ("python", &["python3", "python 3"]),
    ("java", &["java se", "java ee", "core java"]),
    ("javascript", &["ecmascript", "es6"]),
    ("typescript", &["ts"]),
    ("nodejs", &["node.js", "node js"]),
    ("react", &["reactjs", "react.js"]),
    ("angular", &["angularjs", "angular.js"]),
    ("c++", &["cpp"]),
    ("c#", &["csharp", "c sharp"]),
    ("golang", &["go lang"]),
    ("rust", &["rustlang"]),
    ("sql", &["t-sql", "tsql"]),
    ("postgresql", &["postgres"]),
    ("mysql", &["mariadb"]),
    ("mongodb", &["mongo"]),
    ("redis", &[]),
    ("docker", &["dockerfile", "containerization"]),
    ("kubernetes", &["k8s"]),
    ("aws", &["amazon web services"]),
    ("azure", &["microsoft azure"]),
    ("gcp", &["google cloud platform", "google cloud"]),
    ("terraform", &[]),
    ("ci/cd", &["continuous integration", "continuous delivery"]),
    ("git", &["github", "gitlab"]),
    ("linux", &["unix"]),
    ("spring boot", &["springboot"]),
    ("django", &[]),
    ("flask", &[]),
    ("fastapi", &["fast api"]),
    ("rest api", &["restful api", "restful apis", "rest apis"]),
    ("graphql", &[]),
    ("kafka", &["apache kafka"]),
    ("spark", &["apache spark", "pyspark"]),
    ("hadoop", &[]),
    ("machine learning", &["ml"]),
    ("deep learning", &["neural networks"]),
    ("nlp", &["natural language processing"]),
    ("tensorflow", &[]),
    ("pytorch", &["torch"]),
    ("pandas", &[]),
    ("numpy", &[]),
    ("scikit-learn", &["sklearn", "scikit learn"]),
    ("data analysis", &["data analytics"]),
    ("power bi", &["powerbi"]),
    ("tableau", &[]),
    ("excel", &["ms excel", "microsoft excel"]),
];

/// One canonical skill and its synonyms, as configured.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillEntry {
    pub canonical: String,
    pub synonyms: BTreeSet<String>,
}

/// A vocabulary skill found in a token run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillMention {
    pub entry: usize,
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    entries: Vec<SkillEntry>,
    index: HashMap<String, usize>,
    max_window: usize,
}

impl SkillVocabulary {
    /// Builds and validates a vocabulary. Canonical names are lowercased and
    /// entries kept in canonical order so lookups are deterministic.
    pub fn new(skills: BTreeMap<String, Vec<String>>) -> Result<Self, ConfigurationError> {
        if skills.is_empty() {
            return Err(ConfigurationError::Vocabulary(
                "vocabulary contains no skills".to_string(),
            ));
        }

        let mut entries: Vec<SkillEntry> = Vec::with_capacity(skills.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut max_window = 1;

        for (canonical, synonyms) in skills {
            let canonical = canonical.trim().to_lowercase();
            let entry_idx = entries.len();
            let synonyms: BTreeSet<String> = synonyms
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| *s != canonical)
                .collect();

            for form in std::iter::once(&canonical).chain(synonyms.iter()) {
                let key = fold(form);
                if key.is_empty() {
                    return Err(ConfigurationError::Vocabulary(format!(
                        "skill form '{form}' of '{canonical}' has no letters or digits"
                    )));
                }
                if let Some(&other) = index.get(&key) {
                    if other != entry_idx {
                        return Err(ConfigurationError::Vocabulary(format!(
                            "'{form}' of '{canonical}' collides with '{}'",
                            entries[other].canonical
                        )));
                    }
                }
                index.insert(key, entry_idx);
                // One extra token of slack so "node js" can match a form written "node.js".
                max_window = max_window.max(tokenize(form).len() + 1);
            }

            entries.push(SkillEntry {
                canonical,
                synonyms,
            });
        }

        Ok(Self {
            entries,
            index,
            max_window,
        })
    }

    pub fn builtin() -> Self {
        let skills = BUILTIN_SKILLS
            .iter()
            .map(|(canonical, synonyms)| {
                (
                    canonical.to_string(),
                    synonyms.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self::new(skills).expect("built-in vocabulary must validate")
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let skills: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::new(skills)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigurationError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let vocabulary = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            skills = vocabulary.len(),
            "loaded skill vocabulary"
        );
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, idx: usize) -> &SkillEntry {
        &self.entries[idx]
    }

    /// Leftmost-longest scan of a token run for vocabulary skills.
    pub fn find_mentions(&self, tokens: &[String]) -> Vec<SkillMention> {
        let mut mentions = Vec::new();
        let mut start = 0;

        while start < tokens.len() {
            let longest = (1..=self.max_window.min(tokens.len() - start))
                .rev()
                .find_map(|len| {
                    self.index
                        .get(&fold_tokens(&tokens[start..start + len]))
                        .map(|&entry| SkillMention { entry, start, len })
                });

            match longest {
                Some(mention) => {
                    start += mention.len;
                    mentions.push(mention);
                }
                None => start += 1,
            }
        }

        mentions
    }
}

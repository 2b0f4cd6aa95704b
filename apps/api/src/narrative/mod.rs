//! Narrative feedback: an optional model-written summary of one evaluation.
//!
//! The ranked `feedback` lines stay the traceable output of the engine; a
//! narrator only rephrases them for a candidate. The engine holds an
//! `Option<Arc<dyn FeedbackProvider>>`, bounds each call by the provider
//! timeout and drops the narrative when the call fails.

use async_trait::async_trait;

use crate::analysis::models::{MissingSkill, Verdict};
use crate::similarity::ProviderError;

pub mod http;
pub mod prompts;

pub use http::HttpChatClient;

/// What a narrator is told about one evaluation. Raw resume text is never
/// included.
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    pub role_title: Option<String>,
    pub score: u8,
    pub verdict: Verdict,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<MissingSkill>,
    /// Ranked feedback lines, most important first.
    pub feedback: Vec<String>,
}

#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    /// Backend label, recorded in logs and on `/health`.
    fn name(&self) -> &'static str;

    async fn summarize(&self, request: &NarrativeRequest) -> Result<String, ProviderError>;
}

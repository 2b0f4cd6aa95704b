// Relevance Analysis Engine
// Normalize → extract → hard ‖ semantic match → aggregate → feedback.
// Semantic similarity comes from an injected provider (see crate::similarity).

pub mod aggregator;
pub mod errors;
pub mod feedback;
pub mod handlers;
pub mod hard_matcher;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod pool;
pub mod qualifications;
pub mod requirements;
pub mod scoring_config;
pub mod semantic_matcher;
pub mod vocabulary;

//! Similarity providers: the semantic capability injected into the engine.
//!
//! The engine only sees `Arc<dyn SimilarityProvider>`, chosen at startup:
//! - `EmbeddingSimilarity<HttpEmbeddingClient>` when an embedding endpoint is configured
//! - `EmbeddingSimilarity<HashingEmbedder>` otherwise (deterministic, no network)
//!
//! Tests inject their own stubs.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub mod hashing;
pub mod http;

pub use hashing::HashingEmbedder;
pub use http::HttpEmbeddingClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider returned {got} embeddings for {expected} inputs")]
    Incomplete { expected: usize, got: usize },

    #[error("provider returned empty content")]
    EmptyContent,

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definitions
// ────────────────────────────────────────────────────────────────────────────

/// Text-to-text similarity in [0, 1]. Implement this to swap semantic
/// backends without touching the matcher or orchestrator.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    /// Backend label, recorded in logs.
    fn name(&self) -> &'static str;

    async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f32, ProviderError>;

    /// Scores every query against every passage; row `i` belongs to query `i`.
    /// Backends that can batch should override this.
    async fn similarity_matrix(
        &self,
        queries: &[String],
        passages: &[String],
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut matrix = Vec::with_capacity(queries.len());
        for query in queries {
            let mut row = Vec::with_capacity(passages.len());
            for passage in passages {
                row.push(self.similarity(query, passage).await?);
            }
            matrix.push(row);
        }
        Ok(matrix)
    }
}

/// Text → vector. Adapted into a `SimilarityProvider` by `EmbeddingSimilarity`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Cosine similarity over embeddings, embedding each side once per matrix.
pub struct EmbeddingSimilarity<E> {
    embedder: E,
}

impl<E: EmbeddingProvider> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl<E: EmbeddingProvider> SimilarityProvider for EmbeddingSimilarity<E> {
    fn name(&self) -> &'static str {
        self.embedder.name()
    }

    async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f32, ProviderError> {
        let a = self.embedder.embed(text_a).await?;
        let b = self.embedder.embed(text_b).await?;
        Ok(cosine_similarity(&a, &b))
    }

    async fn similarity_matrix(
        &self,
        queries: &[String],
        passages: &[String],
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let query_vectors = self.embedder.embed_batch(queries).await?;
        let passage_vectors = self.embedder.embed_batch(passages).await?;

        Ok(query_vectors
            .iter()
            .map(|q| passage_vectors.iter().map(|p| cosine_similarity(q, p)).collect())
            .collect())
    }
}

/// Cosine similarity clamped to [0, 1]; opposed vectors count as unrelated.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

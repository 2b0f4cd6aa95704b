use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use super::{EmbeddingProvider, ProviderError};
use crate::analysis::normalizer::{fold, tokenize};

/// Fixed keys keep embeddings stable across processes and Rust versions.
const HASH_KEY_0: u64 = 0x5265_6c65_7661_6e63;
const HASH_KEY_1: u64 = 0x6520_456e_6769_6e65;

const DEFAULT_DIMENSION: usize = 512;
const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder over words and character trigrams.
///
/// Needs no model and no network, so it is the default backend when no
/// embedding endpoint is configured. It captures spelling overlap
/// ("postgres" ~ "postgresql") rather than meaning.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = SipHasher13::new_with_keys(HASH_KEY_0, HASH_KEY_1);
        feature.hash(&mut hasher);
        let hash = hasher.finish();
        // Low bit picks the sign so collisions tend to cancel out.
        let sign = if hash & 1 == 0 { 1.0 } else { -1.0 };
        (((hash >> 1) as usize) % self.dimension, sign)
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in tokenize(text).iter().map(|t| fold(t)).filter(|w| !w.is_empty()) {
            let (idx, sign) = self.bucket(&format!("w:{word}"));
            vector[idx] += sign * WORD_WEIGHT;

            let padded: Vec<char> = format!("^{word}$").chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                let (idx, sign) = self.bucket(&format!("t:{trigram}"));
                vector[idx] += sign * TRIGRAM_WEIGHT;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &'static str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embed_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn test_vectors_are_unit_length() {
        let embedder = HashingEmbedder::default();
        let v = embedder.embed_text("Python data pipelines");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
        assert_eq!(v.len(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let a = HashingEmbedder::default().embed_text("Kubernetes operators");
        let b = HashingEmbedder::default().embed_text("Kubernetes operators");
        assert_eq!(a, b);
    }

    #[test]
    fn test_related_spelling_scores_higher() {
        let embedder = HashingEmbedder::default();
        let skill = embedder.embed_text("postgresql");
        let related = embedder.embed_text("Tuned Postgres indexes");
        let unrelated = embedder.embed_text("Designed marketing brochures");
        assert!(
            cosine_similarity(&skill, &related) > cosine_similarity(&skill, &unrelated),
            "related text should score higher"
        );
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashingEmbedder::new(8).embed_text("   ");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}

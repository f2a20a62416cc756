//! Local Hashing Embedding Provider
//!
//! Feature-hashed bag of words: each lowercase alphanumeric token is hashed
//! into one of `dimension` buckets with a hash-derived sign, then the vector is
//! L2 normalized. No network access and fully deterministic, which makes it
//! suitable for offline indexing and for tests.

use async_trait::async_trait;

use super::provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};

pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimension: usize) -> EmbeddingResult<Self> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                message: "hashing embedder dimension must be at least 1".to_string(),
            });
        }
        Ok(Self { dimension })
    }

    pub fn from_config(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        Self::new(config.effective_dimension())
    }

    /// Compute the embedding synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();

        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = fnv1a(token.as_bytes());
            let idx = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            vec[idx] += sign;
        }

        let mag: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if mag > 0.0 {
            for v in &mut vec {
                *v /= mag;
            }
        } else {
            // No tokens: fall back to the uniform unit vector so cosine stays defined.
            let uniform = 1.0 / (self.dimension as f32).sqrt();
            vec.iter_mut().for_each(|v| *v = uniform);
        }
        vec
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn health_check(&self) -> EmbeddingResult<()> {
        Ok(())
    }

    fn is_local(&self) -> bool {
        true
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Hashing
    }

    fn display_name(&self) -> &str {
        "Hashing (Local)"
    }
}

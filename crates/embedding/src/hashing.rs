use crate::{EmbeddingError, EmbeddingProvider};
use ahash::RandomState;
use async_trait::async_trait;
use core_types::Vector;
use std::hash::BuildHasher;

// Fixed seeds keep bucket assignment stable for the life of the process.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Offline provider: signed feature hashing of lowercase word tokens,
/// L2-normalised.
///
/// Texts sharing words land near each other under cosine; it carries no
/// semantics beyond that, which is enough for tests and demos without an
/// API key.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    state: RandomState,
}

impl HashingEmbedder {
    /// `dimension` is clamped to at least 1.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            state: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        }
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn embed_sync(&self, text: &str) -> Vector {
        let mut v = vec![0.0_f32; self.dimension];
        for token in tokens(text) {
            let h = BuildHasher::hash_one(&self.state, token.as_str());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
            v[bucket] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}

use async_trait::async_trait;

use super::provider::Vectorizer;
use crate::error::{DocumentError, DocumentResult};

/// Deterministic bag-of-words vectorizer
///
/// Lowercased alphanumeric tokens are hashed into `dimension` signed
/// buckets and the result is L2-normalised. Texts sharing words land close
/// together, which is enough for offline runs and tests. Not a semantic
/// model.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    dimension: usize,
}

impl HashingVectorizer {
    pub fn new(dimension: usize) -> DocumentResult<Self> {
        if dimension == 0 {
            return Err(DocumentError::Embedding(
                "Vectorizer dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

// 64-bit FNV-1a, stable across platforms and releases
fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Vectorizer for HashingVectorizer {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> DocumentResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

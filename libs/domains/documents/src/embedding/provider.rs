use async_trait::async_trait;

use crate::error::{DocumentError, DocumentResult};

/// Turns text into fixed-length vectors
///
/// Every call returns exactly one vector per input text, and every vector
/// has [`Vectorizer::dimension`] components for the lifetime of the
/// instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vectorizer: Send + Sync {
    fn dimension(&self) -> usize;

    async fn encode(&self, texts: &[String]) -> DocumentResult<Vec<Vec<f32>>>;
}

/// Encode a single text as a one-element batch
pub async fn encode_text(vectorizer: &dyn Vectorizer, text: &str) -> DocumentResult<Vec<f32>> {
    let mut vectors = vectorizer.encode(&[text.to_string()]).await?;
    if vectors.len() != 1 {
        return Err(DocumentError::Embedding(format!(
            "Expected 1 vector, got {}",
            vectors.len()
        )));
    }
    Ok(vectors.remove(0))
}

/// Check a batch returned by an embedding engine against the contract
pub(crate) fn check_batch(
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> DocumentResult<()> {
    if vectors.len() != expected_count {
        return Err(DocumentError::Embedding(format!(
            "Expected {} vectors, got {}",
            expected_count,
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(DocumentError::Embedding(format!(
            "Expected vectors of dimension {}, got {}",
            dimension,
            bad.len()
        )));
    }
    Ok(())
}

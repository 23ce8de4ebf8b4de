/// Mock embedder for tests and for running without model files.
///
/// Hashes lowercase word tokens into buckets (feature hashing), so texts that
/// share words land close together under cosine distance.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};

/// A mock embedder that produces deterministic bag-of-words vectors.
///
/// Useful for testing without loading a real ONNX model.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimensions as u64) as usize
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        if self.dimensions == 0 {
            return Err(EmbedderError::InferenceFailed(
                "mock embedder configured with zero dimensions".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimensions];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut seen_any = false;
        for token in tokens {
            embedding[self.bucket(&token)] += 1.0;
            seen_any = true;
        }

        // Token-free input still needs a direction for cosine distance
        if !seen_any {
            embedding[0] = 1.0;
        }

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        let inv = 1.0 / norm_sq.sqrt();
        for v in &mut embedding {
            *v *= inv;
        }

        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

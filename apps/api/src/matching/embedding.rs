//! Embedding provider: turns normalized text into a fixed-dimension vector,
//! with the all-zero vector standing in for "no content".

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend failed: {0}")]
    Backend(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),
}

/// Sentence-embedding model. Must be deterministic: same text, same vector.
pub trait EmbeddingBackend: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingProvider {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Absent or blank text yields the zero vector without touching the backend.
    pub fn embed<'a>(&self, text: impl Into<Option<&'a str>>) -> Result<Vec<f32>, EmbeddingError> {
        let expected = self.backend.dimension();
        let text = match text.into() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(vec![0.0; expected]),
        };

        let vector = self.backend.embed(text)?;
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

pub fn is_zero_vector(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// dot(a, b) / (‖a‖·‖b‖), accumulated in f64.
///
/// Returns exactly `0.0` when either side is the zero vector, the lengths
/// differ, or the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || is_zero_vector(a) || is_zero_vector(b) {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

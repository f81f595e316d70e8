//! Concrete embedding backends.
//!
//! - `HashedEmbedder`: deterministic feature hashing, no model files. Default.
//! - `FastEmbedder`: all-MiniLM-L6-v2 via fastembed/ONNX (`fastembed` feature).

use fxhash::hash64;

use crate::matching::embedding::{EmbeddingBackend, EmbeddingError};

/// Dimension of all-MiniLM-L6-v2, also the hashed backend's default.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

const BIGRAM_WEIGHT: f32 = 0.5;

/// In-place L2 normalization; the zero vector is left untouched.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Signed feature hashing over unigrams and adjacent bigrams, L2-normalized.
///
/// Texts sharing vocabulary land in shared buckets, so cosine similarity tracks
/// lexical overlap. Useful wherever a real sentence model is not available.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Result<Self, EmbeddingError> {
        if dim == 0 {
            return Err(EmbeddingError::Unavailable(
                "hashed embedding dimension must be non-zero".to_string(),
            ));
        }
        Ok(Self { dim })
    }

    fn accumulate(&self, v: &mut [f32], feature: &str, weight: f32) {
        let h = hash64(feature.as_bytes());
        let bucket = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
        v[bucket] += sign * weight;
    }
}

impl EmbeddingBackend for HashedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0.0_f32; self.dim];
        let tokens: Vec<&str> = text.split_whitespace().collect();

        for token in &tokens {
            self.accumulate(&mut v, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut v, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        l2_normalize_in_place(&mut v);
        Ok(v)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hashed"
    }
}

#[cfg(feature = "fastembed")]
pub use self::onnx::FastEmbedder;

#[cfg(feature = "fastembed")]
mod onnx {
    use std::sync::Mutex;

    use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
    use tracing::info;

    use super::DEFAULT_EMBEDDING_DIM;
    use crate::matching::embedding::{EmbeddingBackend, EmbeddingError};

    /// all-MiniLM-L6-v2 sentence embeddings. fastembed needs `&mut` for
    /// inference, so the model sits behind a mutex.
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        /// Downloads the model on first use (cached by fastembed afterwards).
        pub fn load() -> Result<Self, EmbeddingError> {
            info!("Loading all-MiniLM-L6-v2 sentence embedding model...");
            let model = TextEmbedding::try_new(TextInitOptions::new(EmbeddingModel::AllMiniLML6V2))
                .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl EmbeddingBackend for FastEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbeddingError::Backend("embedding model lock poisoned".to_string()))?;
            let mut vectors = model
                .embed(vec![text], None)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;
            vectors
                .pop()
                .ok_or_else(|| EmbeddingError::Backend("model returned no vectors".to_string()))
        }

        fn dimension(&self) -> usize {
            DEFAULT_EMBEDDING_DIM
        }

        fn name(&self) -> &str {
            "fastembed/all-MiniLM-L6-v2"
        }
    }
}

//! Embedding backend trait and the disabled backend.

use ndarray::Array1;

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Embed a text. Returns `None` when the backend is unavailable or the
    /// text has nothing to embed.
    fn embed(&self, text: &str) -> Option<Array1<f32>>;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<Array1<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the embedder can produce vectors.
    fn is_available(&self) -> bool;
}

/// Embedder that never produces vectors.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<Array1<f32>> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}

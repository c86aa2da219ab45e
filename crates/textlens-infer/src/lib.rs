//! textlens infer: embedding backends for the vector memory.
//!
//! `HashEmbedder` is the default: deterministic feature hashing that needs
//! no model files. `NoopEmbedder` disables embedding entirely, which turns
//! every memory lookup into an empty result.

pub mod embedder;
pub mod hash;

pub use embedder::{EmbedderBackend, NoopEmbedder};
pub use hash::HashEmbedder;

use std::sync::Arc;

/// Create the embedder used by the vector memory.
///
/// A zero dimension disables embedding.
pub fn create_embedder(dim: usize) -> Arc<dyn EmbedderBackend> {
    if dim == 0 {
        tracing::info!("Embedding dimension is 0, vector memory disabled");
        return Arc::new(NoopEmbedder::new(0));
    }
    tracing::debug!("Using hash embedder (dim={})", dim);
    Arc::new(HashEmbedder::new(dim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_embedder() {
        let e = create_embedder(64);
        assert!(e.is_available());
        assert_eq!(e.dimension(), 64);
        assert!(!create_embedder(0).is_available());
    }
}

//! Feature-hashing embedder.
//!
//! Each lowercase word token is hashed with SHA-256; the first eight bytes
//! pick a bucket and the ninth byte picks a sign. Token counts accumulate
//! in their buckets and the vector is L2-normalized, so texts that share
//! words have a high cosine similarity. Output is identical across runs
//! and platforms.

use ndarray::Array1;
use sha2::{Digest, Sha256};

use crate::embedder::EmbedderBackend;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(head) % self.dim as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl EmbedderBackend for HashEmbedder {
    fn embed(&self, text: &str) -> Option<Array1<f32>> {
        let mut v = Array1::<f32>::zeros(self.dim);
        let tokens = text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for token in tokens {
            let (i, sign) = self.bucket(&token);
            v[i] += sign;
        }

        let norm = v.dot(&v).sqrt();
        if norm == 0.0 {
            return None;
        }
        Some(v / norm)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        true
    }
}

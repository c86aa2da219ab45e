//! uint8 embedding quantization.
//!
//! `[min, max]` maps linearly onto `[0, 255]`; a value is restored as
//! `byte * scale + offset`.

use ndarray::Array1;

/// A quantized embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    pub bytes: Vec<u8>,
    pub scale: f32,
    pub offset: f32,
}

impl Quantized {
    pub fn from_embedding(embedding: &Array1<f32>) -> Self {
        let min = embedding.iter().copied().fold(f32::INFINITY, f32::min);
        let max = embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let range = max - min;
        if !range.is_finite() || range < 1e-9 {
            // Constant (or empty) vector.
            return Self {
                bytes: vec![0; embedding.len()],
                scale: 0.0,
                offset: if min.is_finite() { min } else { 0.0 },
            };
        }

        let scale = range / 255.0;
        let bytes = embedding
            .iter()
            .map(|&v| ((v - min) / scale).round().clamp(0.0, 255.0) as u8)
            .collect();
        Self {
            bytes,
            scale,
            offset: min,
        }
    }

    pub fn restore(&self) -> Array1<f32> {
        self.bytes
            .iter()
            .map(|&b| b as f32 * self.scale + self.offset)
            .collect()
    }
}

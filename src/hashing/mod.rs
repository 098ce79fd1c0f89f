//! BLAKE3 helpers for embedding cache keys and deterministic stub vectors.

use blake3::Hasher;

/// Cache key for an embedding: model name and text, separated so that
/// `("ab", "c")` and `("a", "bc")` never collide.
#[inline]
pub fn hash_embedding_key(model: &str, text: &str) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Expands `text` into a deterministic L2-normalized vector of `dim` floats.
///
/// Components are drawn from the BLAKE3 extended output, mapped to `[-1, 1]`.
pub fn seeded_unit_vector(text: &str, dim: usize) -> Vec<f32> {
    if dim == 0 {
        return Vec::new();
    }

    let mut reader = Hasher::new().update(text.as_bytes()).finalize_xof();
    let mut buf = vec![0u8; dim * 4];
    reader.fill(&mut buf);

    let mut vector: Vec<f32> = buf
        .chunks_exact(4)
        .map(|chunk| {
            let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            (raw as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
        })
        .collect();

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

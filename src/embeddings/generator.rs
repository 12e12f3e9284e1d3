//! Deterministic hashing embedder
//!
//! Maps text to a fixed-length, unit-normalized vector without any model or
//! network call. Each token is hashed with a 31-multiplier rolling hash and
//! its position-decayed weight is spread over three buckets. Identical text
//! and dimension always produce the identical vector, so stored chunk
//! vectors stay comparable across queries and restarts.

use tracing::debug;

use super::text_preprocessing::tokenize;
use super::DEFAULT_EMBEDDING_DIM;

/// Weight share of the secondary bucket relative to the primary one
const SECONDARY_WEIGHT: f32 = 0.5;
/// Weight share of the positional bucket relative to the primary one
const POSITIONAL_WEIGHT: f32 = 0.25;

/// Hashing embedding service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingService {
    dimension: usize,
}

impl EmbeddingService {
    /// Create an embedder producing vectors of length `dimension`
    ///
    /// A zero dimension is bumped to 1 so the service stays total.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(config.embedding_dimension())
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed a single text
    pub fn generate(&self, text: &str) -> Vec<f32> {
        embed(text, self.dimension)
    }

    /// Embed many texts, preserving order
    pub fn generate_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<f32>> {
        let embeddings: Vec<Vec<f32>> = texts.iter().map(|t| self.generate(t.as_ref())).collect();
        debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            self.dimension
        );
        embeddings
    }
}

impl Default for EmbeddingService {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

/// Embed `text` into a vector of length `dimension`
///
/// Returns the all-zero vector when the text has no usable tokens.
pub fn embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    if dimension == 0 {
        return vector;
    }

    for (position, token) in tokenize(text).iter().enumerate() {
        let hash = rolling_hash(token);
        let weight = 1.0 / (position as f32 + 1.0);

        vector[bucket(hash, dimension)] += weight;
        vector[bucket(hash.wrapping_mul(31), dimension)] += weight * SECONDARY_WEIGHT;
        vector[bucket(hash.wrapping_add(position as i32), dimension)] +=
            weight * POSITIONAL_WEIGHT;
    }

    l2_normalize(&mut vector);
    vector
}

/// `hash = hash * 31 + code` over the token's characters, in wrapping i32
pub fn rolling_hash(token: &str) -> i32 {
    token.chars().fold(0i32, |hash, c| {
        hash.wrapping_mul(31).wrapping_add(u32::from(c) as i32)
    })
}

fn bucket(hash: i32, dimension: usize) -> usize {
    hash.unsigned_abs() as usize % dimension
}

/// Scale to unit length in place; a zero vector is left untouched
pub fn l2_normalize(vector: &mut [f32]) -> f32 {
    let norm = magnitude(vector);
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

pub fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_hash_matches_reference_values() {
        // "ab" = 97 * 31 + 98
        assert_eq!(rolling_hash("ab"), 3105);
        assert_eq!(rolling_hash(""), 0);
    }

    #[test]
    fn test_rolling_hash_wraps() {
        let long = "z".repeat(64);
        // Must not panic under overflow checks
        let _ = rolling_hash(&long);
    }

    #[test]
    fn test_embedding_dimension() {
        let service = EmbeddingService::new(64);
        assert_eq!(service.generate("hello world").len(), 64);
        assert_eq!(EmbeddingService::default().dimension(), 128);
    }

    #[test]
    fn test_deterministic() {
        let service = EmbeddingService::default();
        let text = "The project uses React and Node.js.";
        assert_eq!(service.generate(text), service.generate(text));
        assert_eq!(embed(text, 256), embed(text, 256));
    }

    #[test]
    fn test_known_vector() {
        // Tokens react, and, node, js. Bucket 127 takes both react's primary
        // and positional weight; bucket 87 is shared by "and" and "js".
        let expected: [(usize, f32); 10] = [
            (2, 0.211_093_55),
            (4, 0.052_773_39),
            (9, 0.158_320_16),
            (31, 0.316_640_33),
            (62, 0.105_546_78),
            (73, 0.158_320_16),
            (76, 0.039_580_04),
            (87, 0.395_800_41),
            (88, 0.079_160_08),
            (127, 0.791_600_8),
        ];

        let v = embed("React and Node.js", 128);
        let nonzero: Vec<usize> = (0..v.len()).filter(|&i| v[i] != 0.0).collect();
        assert_eq!(nonzero, expected.iter().map(|&(i, _)| i).collect::<Vec<_>>());
        for (index, value) in expected {
            assert!(
                (v[index] - value).abs() < 1e-6,
                "bucket {index}: {} != {value}",
                v[index]
            );
        }
    }

    #[test]
    fn test_unit_norm() {
        for text in ["hello world", "a much longer sentence about retrieval", "xy"] {
            let v = embed(text, 128);
            assert!((magnitude(&v) - 1.0).abs() < 1e-5, "norm for {text:?}");
        }
    }

    #[test]
    fn test_degenerate_inputs_are_zero() {
        for text in ["", "   ", "a ! ?", "\n\t"] {
            let v = embed(text, 32);
            assert_eq!(v.len(), 32);
            assert!(v.iter().all(|&x| x == 0.0), "expected zero vector for {text:?}");
        }
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        assert_eq!(embed("React, Node!", 128), embed("react node", 128));
    }

    #[test]
    fn test_different_inputs_differ() {
        let v1 = embed("hello", 128);
        let v2 = embed("goodbye", 128);
        let dot: f32 = v1.iter().zip(&v2).map(|(a, b)| a * b).sum();
        assert!(dot < 0.99);
    }

    #[test]
    fn test_batch_preserves_order() {
        let service = EmbeddingService::new(16);
        let batch = service.generate_batch(&["first chunk", "second chunk"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], service.generate("first chunk"));
        assert_eq!(batch[1], service.generate("second chunk"));
    }

    #[test]
    fn test_zero_dimension_is_clamped() {
        assert_eq!(EmbeddingService::new(0).generate("hello there").len(), 1);
        assert!(embed("hello", 0).is_empty());
    }
}

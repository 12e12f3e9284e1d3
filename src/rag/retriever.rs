//! Similarity ranking of document chunks against a query vector

use tracing::debug;

use crate::config;
use crate::config::RetrievalConfig;
use crate::embeddings::magnitude;
use crate::models::Chunk;
use crate::models::ScoredChunk;

/// Cosine similarity in [-1, 1]
///
/// Vectors of different length, or with zero magnitude, score 0.
pub fn raw_cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (mag_a * mag_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Cosine similarity clamped into [0, 1], the range thresholds are expressed in
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    raw_cosine_similarity(a, b).max(0.0)
}

/// Ranks chunks against a query with a never-empty fallback
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    threshold: f32,
    top_k: usize,
    fallback_k: usize,
}

impl Retriever {
    pub fn new(threshold: f32, top_k: usize) -> Self {
        Self {
            threshold,
            top_k,
            fallback_k: config::default_fallback_k(),
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.similarity_threshold, config.top_k).with_fallback_k(config.fallback_k)
    }

    #[must_use]
    pub const fn with_fallback_k(mut self, fallback_k: usize) -> Self {
        self.fallback_k = fallback_k;
        self
    }

    /// Rank `chunks` against `query`
    ///
    /// Chunks without a usable (non-zero) embedding are skipped. Results
    /// above the threshold are returned best first, at most `top_k`, with
    /// equal scores kept in document order. When nothing clears the
    /// threshold the best `fallback_k` usable chunks are returned anyway.
    /// The result is empty only when no chunk has a usable embedding.
    pub fn retrieve(&self, query: &[f32], chunks: &[Chunk]) -> Vec<ScoredChunk> {
        let mut ranked: Vec<ScoredChunk> = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| magnitude(&chunk.embedding) > 0.0)
            .map(|(index, chunk)| ScoredChunk {
                chunk: chunk.clone(),
                index,
                score: cosine_similarity(query, &chunk.embedding),
            })
            .collect();

        if ranked.is_empty() {
            debug!("No chunk among {} has a usable embedding", chunks.len());
            return Vec::new();
        }

        // Stable sort keeps document order among equal scores
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        for (rank, scored) in ranked.iter().take(3).enumerate() {
            debug!(
                "{}. Score: {:.4} - chunk #{}",
                rank + 1,
                scored.score,
                scored.index
            );
        }

        let relevant: Vec<ScoredChunk> = ranked
            .iter()
            .filter(|scored| scored.score > self.threshold)
            .take(self.top_k)
            .cloned()
            .collect();

        if !relevant.is_empty() {
            debug!(
                "Found {} relevant chunks (score > {})",
                relevant.len(),
                self.threshold
            );
            return relevant;
        }

        debug!(
            "No chunks above threshold {}, using top {} anyway",
            self.threshold, self.fallback_k
        );
        ranked.truncate(self.fallback_k.max(1));
        ranked
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

/// Rank with the default fallback size
pub fn retrieve(query: &[f32], chunks: &[Chunk], threshold: f32, top_k: usize) -> Vec<ScoredChunk> {
    Retriever::new(threshold, top_k).retrieve(query, chunks)
}

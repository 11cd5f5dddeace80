//! Similarity scoring for vector search.
//!
//! Every metric returns a score where higher means more similar, so the
//! store can rank uniformly.

use confidant_types::memory::SimilarityMetric;

/// Score `a` against `b` under `metric`.
#[inline]
pub fn similarity(metric: SimilarityMetric, a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    match metric {
        SimilarityMetric::Cosine => cosine_similarity(a, b),
        SimilarityMetric::Dot => dot_product(a, b),
        // 1 / (1 + dist) maps [0, inf) onto (0, 1].
        SimilarityMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
    }
}

#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero vectors score 0 against everything.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

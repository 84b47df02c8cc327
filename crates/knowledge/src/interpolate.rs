//! Interpolation between a historical fact and a hypothetical query.
//!
//! The blended vector `(1 - alpha) * fact + alpha * query` is projected back
//! onto the unit sphere and used as a search key. `alpha = 0` reproduces the
//! neighborhood of the fact, `alpha = 1` that of the query.

use crate::embeddings::l2_norm;
use crate::types::ScoredChunk;
use crate::vector_index::VectorIndex;
use mingyu_core::{AppError, AppResult};

/// Norm below which the blend is considered to have cancelled out.
pub const DEGENERATE_NORM: f32 = 1e-6;

/// Result of one interpolation.
#[derive(Debug, Clone)]
pub struct Interpolation {
    /// Normalized blend, or the raw blend when its norm is zero
    pub gen_vector: Vec<f32>,

    /// Neighbors of `gen_vector`, excluded id removed
    pub neighbors: Vec<ScoredChunk>,

    /// The blend nearly cancelled out (e.g. opposite inputs at alpha 0.5)
    pub degenerate: bool,
}

/// Blend and normalize two vectors.
///
/// Returns the generated vector and whether it is degenerate.
pub fn blend(fact: &[f32], query: &[f32], alpha: f32) -> AppResult<(Vec<f32>, bool)> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(AppError::Knowledge(format!(
            "alpha must be within [0, 1], got {}",
            alpha
        )));
    }

    if fact.len() != query.len() {
        return Err(AppError::Knowledge(format!(
            "Cannot interpolate vectors of different dimensions ({} vs {})",
            fact.len(),
            query.len()
        )));
    }

    let mut raw: Vec<f32> = fact
        .iter()
        .zip(query)
        .map(|(f, q)| (1.0 - alpha) * f + alpha * q)
        .collect();

    let norm = l2_norm(&raw);
    if norm > 0.0 {
        for x in raw.iter_mut() {
            *x /= norm;
        }
    }

    Ok((raw, norm < DEGENERATE_NORM))
}

/// Blend `fact` and `query`, search around the result, and drop
/// `exclude_id` from the neighbors without refilling the gap.
pub fn interpolate<I: VectorIndex + ?Sized>(
    index: &I,
    fact: &[f32],
    query: &[f32],
    alpha: f32,
    exclude_id: Option<&str>,
    neighbor_count: usize,
) -> AppResult<Interpolation> {
    if neighbor_count == 0 {
        return Err(AppError::Knowledge(
            "neighbor count must be positive".to_string(),
        ));
    }

    let (gen_vector, degenerate) = blend(fact, query, alpha)?;
    if degenerate {
        tracing::warn!(
            "Interpolated vector is degenerate at alpha {}; neighbors are not meaningful",
            alpha
        );
    }

    let mut neighbors = index.search(&gen_vector, neighbor_count);
    if let Some(id) = exclude_id {
        neighbors.retain(|n| n.chunk.id != id);
    }

    tracing::debug!(
        "Interpolation at alpha {} returned {} neighbors",
        alpha,
        neighbors.len()
    );

    Ok(Interpolation {
        gen_vector,
        neighbors,
        degenerate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::fixture;

    fn ids(neighbors: &[ScoredChunk]) -> Vec<&str> {
        neighbors.iter().map(|n| n.chunk.id.as_str()).collect()
    }

    #[test]
    fn test_midpoint_of_orthogonal_vectors() {
        let (gen, degenerate) = blend(&[1.0, 0.0], &[0.0, 1.0], 0.5).unwrap();
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((gen[0] - expected).abs() < 1e-4);
        assert!((gen[1] - expected).abs() < 1e-4);
        assert!(!degenerate);
    }

    #[test]
    fn test_unit_norm_output() {
        let (gen, _) = blend(&[0.6, 0.8, 0.0], &[0.0, 0.0, 1.0], 0.3).unwrap();
        assert!((l2_norm(&gen) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_opposite_vectors_cancel() {
        let (gen, degenerate) = blend(&[1.0, 0.0], &[-1.0, 0.0], 0.5).unwrap();
        assert!(degenerate);
        assert!(gen.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(blend(&[1.0], &[1.0], 1.5).is_err());
        assert!(blend(&[1.0], &[1.0], -0.1).is_err());
        assert!(blend(&[1.0], &[1.0], f32::NAN).is_err());
        assert!(blend(&[1.0, 0.0], &[1.0], 0.5).is_err());

        let index = fixture(&[("a", vec![1.0])]);
        assert!(interpolate(&index, &[1.0], &[1.0], 0.5, None, 0).is_err());
    }

    #[test]
    fn test_alpha_extremes_match_plain_search() {
        let index = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![0.6, 0.8]),
        ]);
        let fact = [1.0, 0.0];
        let query = [0.0, 1.0];

        let at_fact = interpolate(&index, &fact, &query, 0.0, None, 3).unwrap();
        assert_eq!(at_fact.neighbors, index.search(&fact, 3));

        let at_query = interpolate(&index, &fact, &query, 1.0, None, 3).unwrap();
        assert_eq!(at_query.neighbors, index.search(&query, 3));
    }

    #[test]
    fn test_exclusion_without_backfill() {
        let index = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.8, 0.6]),
            ("c", vec![0.0, 1.0]),
        ]);

        let result = interpolate(&index, &[1.0, 0.0], &[1.0, 0.0], 0.5, Some("a"), 2).unwrap();
        // "a" was in the top 2 and is removed; "c" is not pulled in
        assert_eq!(ids(&result.neighbors), vec!["b"]);
    }

    #[test]
    fn test_exclusion_of_absent_id_keeps_everything() {
        let index = fixture(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);
        let result = interpolate(&index, &[1.0, 0.0], &[0.0, 1.0], 0.5, Some("zzz"), 2).unwrap();
        assert_eq!(result.neighbors.len(), 2);
    }

    #[test]
    fn test_degenerate_search_returns_zero_scores() {
        let index = fixture(&[("a", vec![1.0, 0.0])]);
        let result = interpolate(&index, &[1.0, 0.0], &[-1.0, 0.0], 0.5, None, 1).unwrap();
        assert!(result.degenerate);
        assert_eq!(result.neighbors[0].score, 0.0);
    }
}

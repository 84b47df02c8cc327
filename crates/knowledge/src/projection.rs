//! Two-dimensional projection of an exploration for plotting.
//!
//! Principal components are computed from the centered Gram matrix by power
//! iteration with deflation. The point count is small (at most a few dozen),
//! so the `n x n` Gram matrix is cheaper than a `d x d` covariance.

use crate::vector_index::VectorIndex;
use mingyu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Background rows taken from the front of the index.
pub const BACKGROUND_LIMIT: usize = 50;

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Background,
    Anchor,
    Query,
    Generated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub vector: Vec<f32>,
    pub label: String,
    pub kind: PointKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub kind: PointKind,
}

/// Background sample plus the three vectors of one exploration.
pub fn exploration_points<I: VectorIndex + ?Sized>(
    index: &I,
    fact: &[f32],
    query: &[f32],
    generated: &[f32],
) -> Vec<ProjectionInput> {
    let background = index.len().min(BACKGROUND_LIMIT);
    let mut points = Vec::with_capacity(background + 3);

    for position in 0..background {
        if let (Some(vector), Some(chunk)) = (index.vector(position), index.chunk(position)) {
            points.push(ProjectionInput {
                vector: vector.to_vec(),
                label: chunk.name.clone(),
                kind: PointKind::Background,
            });
        }
    }

    points.push(ProjectionInput {
        vector: fact.to_vec(),
        label: "历史锚点 (Fact)".to_string(),
        kind: PointKind::Anchor,
    });
    points.push(ProjectionInput {
        vector: query.to_vec(),
        label: "用户假设 (Query)".to_string(),
        kind: PointKind::Query,
    });
    points.push(ProjectionInput {
        vector: generated.to_vec(),
        label: "生成伪史 (Generated)".to_string(),
        kind: PointKind::Generated,
    });

    points
}

/// Project points onto their first two principal components.
pub fn project(points: &[ProjectionInput]) -> AppResult<Vec<ProjectedPoint>> {
    let Some(first) = points.first() else {
        return Ok(Vec::new());
    };

    let dims = first.vector.len();
    if let Some(p) = points.iter().find(|p| p.vector.len() != dims) {
        return Err(AppError::Knowledge(format!(
            "Cannot project '{}': {} dimensions, expected {}",
            p.label,
            p.vector.len(),
            dims
        )));
    }

    let n = points.len();
    let mut mean = vec![0.0f64; dims];
    for p in points {
        for (m, x) in mean.iter_mut().zip(&p.vector) {
            *m += f64::from(*x);
        }
    }
    for m in mean.iter_mut() {
        *m /= n as f64;
    }

    let centered: Vec<Vec<f64>> = points
        .iter()
        .map(|p| {
            p.vector
                .iter()
                .zip(&mean)
                .map(|(x, m)| f64::from(*x) - m)
                .collect()
        })
        .collect();

    let mut gram = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in i..n {
            let value: f64 = centered[i].iter().zip(&centered[j]).map(|(a, b)| a * b).sum();
            gram[i][j] = value;
            gram[j][i] = value;
        }
    }

    let (lambda1, u1) = dominant_eigenpair(&gram, &[]);
    let (lambda2, u2) = dominant_eigenpair(&gram, &[u1.as_slice()]);

    let scale1 = lambda1.max(0.0).sqrt();
    let scale2 = lambda2.max(0.0).sqrt();

    Ok(points
        .iter()
        .enumerate()
        .map(|(i, p)| ProjectedPoint {
            x: u1[i] * scale1,
            y: u2[i] * scale2,
            label: p.label.clone(),
            kind: p.kind,
        })
        .collect())
}

/// Largest eigenpair of a symmetric PSD matrix, orthogonal to `deflate`.
///
/// The returned vector has unit length and its largest-magnitude entry is
/// positive; a zero vector is returned when no variance remains.
fn dominant_eigenpair(matrix: &[Vec<f64>], deflate: &[&[f64]]) -> (f64, Vec<f64>) {
    let n = matrix.len();

    // Fixed, non-constant start: the centered Gram matrix annihilates the
    // all-ones vector.
    let mut v: Vec<f64> = (0..n)
        .map(|i| ((i as f64 + 1.0) * 0.618_033_988_75).fract() - 0.5)
        .collect();
    orthogonalize(&mut v, deflate);
    if !normalize(&mut v) {
        return (0.0, vec![0.0; n]);
    }

    let mut lambda = 0.0;
    for _ in 0..MAX_ITERATIONS {
        let mut next: Vec<f64> = matrix
            .iter()
            .map(|row| row.iter().zip(&v).map(|(a, b)| a * b).sum())
            .collect();
        orthogonalize(&mut next, deflate);

        let next_lambda: f64 = next.iter().zip(&v).map(|(a, b)| a * b).sum();
        if !normalize(&mut next) {
            return (0.0, vec![0.0; n]);
        }

        let change: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).powi(2)).sum();
        v = next;
        lambda = next_lambda;
        if change < TOLERANCE {
            break;
        }
    }

    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        for x in v.iter_mut() {
            *x = -*x;
        }
    }

    (lambda, v)
}

fn orthogonalize(v: &mut [f64], basis: &[&[f64]]) {
    for b in basis {
        let projection: f64 = v.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        for (x, y) in v.iter_mut().zip(b.iter()) {
            *x -= projection * y;
        }
    }
}

fn normalize(v: &mut [f64]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm < 1e-12 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

//! Cosine similarity over dense embeddings.

use ndarray::{Array1, Array2, Axis};

/// Cosine similarity in [-1, 1]; zero-norm inputs score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Stack vectors into a row matrix with every row scaled to unit length.
///
/// All vectors must share `dim`; callers validate this beforehand.
pub fn unit_rows(vectors: &[Vec<f32>], dim: usize) -> Array2<f32> {
    let mut matrix = Array2::<f32>::zeros((vectors.len(), dim));
    for (mut row, vector) in matrix.axis_iter_mut(Axis(0)).zip(vectors) {
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.assign(&Array1::from_iter(vector.iter().map(|v| v / norm)));
        }
    }
    matrix
}

/// Pairwise cosine similarities: `out[i][j] = cosine(rows[i], cols[j])`.
pub fn cosine_matrix(rows: &[Vec<f32>], cols: &[Vec<f32>], dim: usize) -> Array2<f32> {
    let left = unit_rows(rows, dim);
    let right = unit_rows(cols, dim);
    left.dot(&right.t()).mapv(|v| v.clamp(-1.0, 1.0))
}

/// Scale a vector to unit length in place.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

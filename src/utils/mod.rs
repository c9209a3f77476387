pub mod stats;
pub mod validation;

use tracing::warn;

/// Dense matrices past this many cells still get built, with a warning.
pub const DENSE_CELL_WARNING: usize = 25_000_000;

/// Warns before a `rows × cols` dense allocation that crosses
/// [`DENSE_CELL_WARNING`]; returns whether it did.
pub fn warn_if_dense(what: &str, rows: usize, cols: usize) -> bool {
    let large = rows.saturating_mul(cols) > DENSE_CELL_WARNING;
    if large {
        warn!(
            "Allocating a dense {} x {} {}; memory grows with every cell",
            rows, cols, what
        );
    }
    large
}

/// Cosine similarity of two dense vectors; zero vectors score 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

pub fn l2_norm(vector: &[f64]) -> f64 {
    vector.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scales `vector` to unit length in place; zero vectors are left untouched.
pub fn normalize_vector(vector: &mut [f64]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Weighted mean of `(value, weight)` pairs, or `None` when the weights sum to zero.
pub fn weighted_average(pairs: &[(f64, f64)]) -> Option<f64> {
    let (sum, total_weight) = pairs
        .iter()
        .fold((0.0, 0.0), |(sum, total), (value, weight)| {
            (sum + value * weight, total + weight)
        });

    if total_weight > 0.0 {
        Some(sum / total_weight)
    } else {
        None
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

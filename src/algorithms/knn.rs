use crate::algorithms::interactions::InteractionTable;
use crate::config::CollaborativeConfig;
use crate::error::Result;
use crate::utils::{warn_if_dense, weighted_average};
use ndarray::Array2;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::info;

/// Item-based neighbourhood model with cosine similarity over common raters.
///
/// A rating for `(user, item)` is the similarity-weighted mean of the user's
/// ratings on the `k` most similar items they rated, clamped to the rating
/// range seen in training.
#[derive(Debug, Clone)]
pub struct KnnModel {
    similarities: Array2<f64>,
    neighbors: usize,
    min_neighbors: usize,
    rating_range: (f64, f64),
    global_mean: f64,
}

impl KnnModel {
    pub fn fit(table: &InteractionTable, config: &CollaborativeConfig) -> Result<Self> {
        let items = table.item_count();
        warn_if_dense("item similarity matrix", items, items);

        let rows: Vec<Vec<f64>> = (0..items)
            .into_par_iter()
            .map(|a| {
                (0..items)
                    .map(|b| {
                        if a == b {
                            1.0
                        } else {
                            common_rater_cosine(table.item_ratings(a), table.item_ratings(b))
                        }
                    })
                    .collect()
            })
            .collect();

        let mut similarities = Array2::zeros((items, items));
        for (a, row) in rows.into_iter().enumerate() {
            for (b, sim) in row.into_iter().enumerate() {
                similarities[[a, b]] = sim;
            }
        }

        info!(
            "Fitted item neighbourhood model over {} items (k = {})",
            items, config.knn_neighbors
        );

        Ok(Self {
            similarities,
            neighbors: config.knn_neighbors.max(1),
            min_neighbors: config.knn_min_neighbors,
            rating_range: table.rating_range(),
            global_mean: table.global_mean(),
        })
    }

    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        self.similarities[[a, b]]
    }

    /// Estimated rating of `item` by `user`.
    pub fn predict(&self, table: &InteractionTable, user: usize, item: usize) -> f64 {
        let mut neighbors: Vec<(f64, f64)> = table
            .user_ratings(user)
            .iter()
            .filter(|(other, _)| *other != item)
            .map(|&(other, rating)| (rating, self.similarity(item, other)))
            .filter(|(_, sim)| *sim > 0.0)
            .collect();

        neighbors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        neighbors.truncate(self.neighbors);

        let estimate = if neighbors.len() < self.min_neighbors {
            None
        } else {
            weighted_average(&neighbors)
        };

        let (low, high) = self.rating_range;
        estimate.unwrap_or(self.global_mean).clamp(low, high)
    }

    /// Predicted ratings for every item the user has not rated.
    pub fn predict_unrated(&self, table: &InteractionTable, user: usize) -> Vec<(usize, f64)> {
        table
            .unrated_items(user)
            .into_par_iter()
            .map(|item| (item, self.predict(table, user, item)))
            .collect()
    }
}

/// Cosine over the users who rated both items; 0 without a common rater.
fn common_rater_cosine(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                norm_a += a[i].1 * a[i].1;
                norm_b += b[j].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

use crate::algorithms::interactions::InteractionTable;
use crate::error::{RecommenderError, Result};
use crate::utils::warn_if_dense;
use nalgebra::{DMatrix, DVector};
use std::cmp::Ordering;
use tracing::info;

/// Low-rank factorization of the mean-centred user × item matrix.
///
/// The full predicted-rating matrix `U · Σ · Vᵀ + user mean` is reconstructed
/// eagerly at fit time.
#[derive(Debug, Clone)]
pub struct SvdModel {
    predictions: DMatrix<f64>,
    rank: usize,
}

impl SvdModel {
    pub fn fit(table: &InteractionTable) -> Result<Self> {
        let (users, items) = (table.user_count(), table.item_count());
        let rank = users.min(items).saturating_sub(1);
        if rank == 0 {
            return Err(RecommenderError::degenerate(format!(
                "factorization needs at least 2 users and 2 items, got {} x {}",
                users, items
            )));
        }

        warn_if_dense("prediction matrix", users, items);

        let ratings = table.dense_matrix();
        let means = DVector::from_fn(users, |u, _| ratings.row(u).sum() / items as f64);
        let centered = DMatrix::from_fn(users, items, |u, i| ratings[(u, i)] - means[u]);

        let svd = centered.svd(true, true);
        let u = svd
            .u
            .ok_or_else(|| RecommenderError::degenerate("decomposition produced no left factors"))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| RecommenderError::degenerate("decomposition produced no right factors"))?;
        let sigma = svd.singular_values;

        let mut order: Vec<usize> = (0..sigma.len()).collect();
        order.sort_by(|a, b| sigma[*b].partial_cmp(&sigma[*a]).unwrap_or(Ordering::Equal));
        order.truncate(rank);

        let left = DMatrix::from_fn(users, rank, |r, c| u[(r, order[c])] * sigma[order[c]]);
        let right = DMatrix::from_fn(rank, items, |r, c| v_t[(order[r], c)]);

        let mut predictions = left * right;
        for u in 0..users {
            for i in 0..items {
                predictions[(u, i)] += means[u];
            }
        }

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(RecommenderError::degenerate(
                "factorization produced non-finite predictions",
            ));
        }

        info!("Fitted rank-{} factorization over {} users x {} items", rank, users, items);

        Ok(Self { predictions, rank })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn predicted(&self, user: usize, item: usize) -> f64 {
        self.predictions[(user, item)]
    }

    /// Predicted ratings for every item the user has not rated.
    pub fn predict_unrated(&self, table: &InteractionTable, user: usize) -> Vec<(usize, f64)> {
        table
            .unrated_items(user)
            .into_iter()
            .map(|item| (item, self.predicted(user, item)))
            .collect()
    }
}

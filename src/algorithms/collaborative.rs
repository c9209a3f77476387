use crate::algorithms::interactions::InteractionTable;
use crate::algorithms::knn::KnnModel;
use crate::algorithms::ranker::{rank, RankPolicy};
use crate::algorithms::svd::SvdModel;
use crate::algorithms::Trainable;
use crate::config::CollaborativeConfig;
use crate::error::Result;
use crate::models::{CollaborativeAlgorithm, CollaborativeRoles, Dataset, Recommendation, Value};
use crate::utils::cosine_similarity;
use rayon::prelude::*;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Estimator {
    Svd(SvdModel),
    Knn(KnnModel),
}

/// User–item preference model answering "what should this user see next".
#[derive(Debug, Clone)]
pub struct CollaborativeModel {
    table: InteractionTable,
    estimator: Estimator,
}

impl Trainable for CollaborativeModel {
    type Roles = CollaborativeRoles;
    type Settings = CollaborativeConfig;

    fn fit(
        dataset: &Dataset,
        roles: &CollaborativeRoles,
        config: &CollaborativeConfig,
    ) -> Result<Self> {
        let table = InteractionTable::from_dataset(dataset, roles)?;
        debug!(
            "Interaction table: {} users, {} items, {} ratings",
            table.user_count(),
            table.item_count(),
            table.interactions()
        );

        let estimator = match roles.algorithm {
            CollaborativeAlgorithm::Svd => Estimator::Svd(SvdModel::fit(&table)?),
            CollaborativeAlgorithm::Knn => Estimator::Knn(KnnModel::fit(&table, config)?),
        };

        Ok(Self { table, estimator })
    }
}

impl CollaborativeModel {
    pub fn algorithm(&self) -> CollaborativeAlgorithm {
        match self.estimator {
            Estimator::Svd(_) => CollaborativeAlgorithm::Svd,
            Estimator::Knn(_) => CollaborativeAlgorithm::Knn,
        }
    }

    pub fn table(&self) -> &InteractionTable {
        &self.table
    }

    /// Top predicted ratings among items the user has not rated yet.
    pub fn recommend_for_user(&self, user: &Value, limit: usize) -> Result<Vec<Recommendation>> {
        let user = self.table.user_index(user)?;
        let candidates = match &self.estimator {
            Estimator::Svd(model) => model.predict_unrated(&self.table, user),
            Estimator::Knn(model) => model.predict_unrated(&self.table, user),
        };

        Ok(self.ranked(candidates, limit))
    }

    /// Items whose zero-filled rating vectors point the same way as the first
    /// item whose label contains `needle`.
    pub fn similar_items(&self, needle: &str, limit: usize) -> Result<Vec<Recommendation>> {
        let target = self.table.find_item(needle)?;
        let target_vector = self.table.item_vector(target);

        let candidates: Vec<(usize, f64)> = (0..self.table.item_count())
            .into_par_iter()
            .filter(|&item| item != target)
            .map(|item| {
                (
                    item,
                    cosine_similarity(&target_vector, &self.table.item_vector(item)),
                )
            })
            .collect();

        Ok(self.ranked(candidates, limit))
    }

    fn ranked(&self, candidates: Vec<(usize, f64)>, limit: usize) -> Vec<Recommendation> {
        rank(candidates, &RankPolicy::collaborative(), limit, |item| {
            self.table.item_label(*item).to_string()
        })
        .into_iter()
        .map(|ranked| ranked.into_recommendation())
        .collect()
    }
}

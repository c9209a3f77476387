use crate::error::{RecommenderError, Result};
use crate::models::{CollaborativeRoles, Dataset, Value};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Bidirectional mapping between raw identifiers and dense zero-based indices,
/// assigned in first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl IdIndex {
    pub fn insert(&mut self, id: &str) -> usize {
        if let Some(&index) = self.positions.get(id) {
            return index;
        }
        let index = self.ids.len();
        self.ids.push(id.to_string());
        self.positions.insert(id.to_string(), index);
        index
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sparse user–item ratings observed in the training rows.
#[derive(Debug, Clone)]
pub struct InteractionTable {
    users: IdIndex,
    items: IdIndex,
    item_labels: Vec<String>,
    by_user: Vec<Vec<(usize, f64)>>,
    by_item: Vec<Vec<(usize, f64)>>,
    rating_range: (f64, f64),
    global_mean: f64,
    interactions: usize,
}

impl InteractionTable {
    /// Reads the user, item and rating columns. Ratings must all be numeric;
    /// repeated `(user, item)` pairs are averaged.
    pub fn from_dataset(dataset: &Dataset, roles: &CollaborativeRoles) -> Result<Self> {
        let user_col = dataset.require_column(&roles.user_column)?;
        let item_col = dataset.require_column(&roles.item_column)?;
        let rating_col = dataset.require_column(&roles.rating_column)?;
        let label_col = roles
            .label_column
            .as_deref()
            .map(|c| dataset.require_column(c))
            .transpose()?;

        let mut users = IdIndex::default();
        let mut items = IdIndex::default();
        let mut labels: Vec<Option<String>> = Vec::new();
        let mut cells: HashMap<(usize, usize), (f64, usize)> = HashMap::new();

        for (row_index, row) in dataset.rows().iter().enumerate() {
            let rating = row[rating_col].as_f64().ok_or_else(|| {
                RecommenderError::configuration(format!(
                    "rating column '{}' holds non-numeric value '{}' at row {}",
                    roles.rating_column, row[rating_col], row_index
                ))
            })?;
            let user = users.insert(&identifier(&row[user_col], &roles.user_column, row_index)?);
            let item = items.insert(&identifier(&row[item_col], &roles.item_column, row_index)?);

            if item == labels.len() {
                labels.push(None);
            }
            if let Some(c) = label_col {
                if labels[item].is_none() && !row[c].is_null() {
                    labels[item] = Some(row[c].to_string());
                }
            }

            let cell = cells.entry((user, item)).or_insert((0.0, 0));
            cell.0 += rating;
            cell.1 += 1;
        }

        if cells.is_empty() {
            return Err(RecommenderError::degenerate("no user-item interactions to fit"));
        }

        let mut by_user = vec![Vec::new(); users.len()];
        let mut by_item = vec![Vec::new(); items.len()];
        let (mut min, mut max, mut total) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);

        let mut cells: Vec<((usize, usize), (f64, usize))> = cells.into_iter().collect();
        cells.sort_by_key(|(key, _)| *key);

        for &((user, item), (sum, count)) in &cells {
            let rating = sum / count as f64;
            by_user[user].push((item, rating));
            by_item[item].push((user, rating));
            min = min.min(rating);
            max = max.max(rating);
            total += rating;
        }

        let item_labels = labels
            .into_iter()
            .enumerate()
            .map(|(item, label)| label.unwrap_or_else(|| items.id(item).to_string()))
            .collect();

        Ok(Self {
            users,
            items,
            item_labels,
            by_user,
            by_item,
            rating_range: (min, max),
            global_mean: total / cells.len() as f64,
            interactions: cells.len(),
        })
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn interactions(&self) -> usize {
        self.interactions
    }

    /// Dense index of a raw user identifier, or `UnknownEntity`.
    pub fn user_index(&self, user: &Value) -> Result<usize> {
        let id = user.to_string();
        self.users
            .get(&id)
            .ok_or_else(|| RecommenderError::unknown("user", id))
    }

    pub fn item_id(&self, item: usize) -> &str {
        self.items.id(item)
    }

    pub fn item_label(&self, item: usize) -> &str {
        &self.item_labels[item]
    }

    /// First item whose label contains `needle`, case-insensitively.
    pub fn find_item(&self, needle: &str) -> Result<usize> {
        let needle = needle.trim().to_lowercase();
        self.item_labels
            .iter()
            .position(|label| !needle.is_empty() && label.to_lowercase().contains(&needle))
            .ok_or_else(|| RecommenderError::unknown("item", needle))
    }

    /// `(item, rating)` pairs of a user, sorted by item.
    pub fn user_ratings(&self, user: usize) -> &[(usize, f64)] {
        &self.by_user[user]
    }

    /// `(user, rating)` pairs of an item, sorted by user.
    pub fn item_ratings(&self, item: usize) -> &[(usize, f64)] {
        &self.by_item[item]
    }

    /// A stored rating of 0 reads as "no rating", the same as a missing cell
    /// in the dense matrix.
    pub fn has_rated(&self, user: usize, item: usize) -> bool {
        let ratings = &self.by_user[user];
        ratings
            .binary_search_by_key(&item, |(i, _)| *i)
            .map(|at| ratings[at].1 != 0.0)
            .unwrap_or(false)
    }

    /// Candidate items for a user, ascending: unobserved or rated 0.
    pub fn unrated_items(&self, user: usize) -> Vec<usize> {
        (0..self.item_count())
            .filter(|&item| !self.has_rated(user, item))
            .collect()
    }

    pub fn rating_range(&self) -> (f64, f64) {
        self.rating_range
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    /// Users × items matrix with 0 for "no rating".
    pub fn dense_matrix(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.user_count(), self.item_count());
        for (user, ratings) in self.by_user.iter().enumerate() {
            for &(item, rating) in ratings {
                matrix[(user, item)] = rating;
            }
        }
        matrix
    }

    /// Zero-filled rating column of an item over all users.
    pub fn item_vector(&self, item: usize) -> Vec<f64> {
        let mut vector = vec![0.0; self.user_count()];
        for &(user, rating) in &self.by_item[item] {
            vector[user] = rating;
        }
        vector
    }
}

fn identifier(value: &Value, column: &str, row: usize) -> Result<String> {
    if value.is_null() {
        return Err(RecommenderError::configuration(format!(
            "column '{}' is empty at row {}",
            column, row
        )));
    }
    Ok(value.to_string())
}

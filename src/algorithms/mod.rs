pub mod collaborative;
pub mod content;
pub mod features;
pub mod interactions;
pub mod knn;
pub mod ranker;
pub mod svd;
pub mod tfidf;

use crate::config::{CollaborativeConfig, Config, ContentConfig};
use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::utils::validation::validate_compile_spec;
use collaborative::CollaborativeModel;
use content::ContentModel;
use tracing::info;

/// Query capability shared by both algorithm families.
pub trait RecommendationAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;
    fn recommend(&self, query: &QueryInput, limit: usize) -> Result<Vec<Recommendation>>;
}

/// Fitting capability. Each family trains from its own column roles and
/// settings; a failed fit yields no model at all.
pub trait Trainable: RecommendationAlgorithm + Sized {
    type Roles;
    type Settings;

    fn fit(dataset: &Dataset, roles: &Self::Roles, settings: &Self::Settings) -> Result<Self>;
}

impl RecommendationAlgorithm for ContentModel {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn recommend(&self, query: &QueryInput, limit: usize) -> Result<Vec<Recommendation>> {
        match query {
            QueryInput::Attributes { inputs } => self.recommend_for_inputs(inputs, limit),
            _ => Err(RecommenderError::configuration(
                "content-based models answer attribute queries only",
            )),
        }
    }
}

impl RecommendationAlgorithm for CollaborativeModel {
    fn name(&self) -> &'static str {
        self.algorithm().as_str()
    }

    fn recommend(&self, query: &QueryInput, limit: usize) -> Result<Vec<Recommendation>> {
        match query {
            QueryInput::User { user_id } => self.recommend_for_user(user_id, limit),
            QueryInput::SimilarItems { item } => self.similar_items(item, limit),
            QueryInput::Attributes { .. } => Err(RecommenderError::configuration(
                "collaborative models answer user or similar-item queries",
            )),
        }
    }
}

/// A fitted model of either family; never switches family after fitting.
#[derive(Debug, Clone)]
pub enum FittedModel {
    Content(ContentModel),
    Collaborative(CollaborativeModel),
}

impl FittedModel {
    fn algorithm(&self) -> &dyn RecommendationAlgorithm {
        match self {
            FittedModel::Content(model) => model,
            FittedModel::Collaborative(model) => model,
        }
    }
}

impl RecommendationAlgorithm for FittedModel {
    fn name(&self) -> &'static str {
        self.algorithm().name()
    }

    fn recommend(&self, query: &QueryInput, limit: usize) -> Result<Vec<Recommendation>> {
        self.algorithm().recommend(query, limit)
    }
}

/// Handle moving from unfit to fit exactly once.
#[derive(Debug, Clone)]
pub struct Recommender {
    spec: CompileSpec,
    content: ContentConfig,
    collaborative: CollaborativeConfig,
    model: Option<FittedModel>,
    summary: Option<CompileSummary>,
}

impl Recommender {
    pub fn new(spec: CompileSpec, config: &Config) -> Self {
        Self {
            spec,
            content: config.content.clone(),
            collaborative: config.collaborative.clone(),
            model: None,
            summary: None,
        }
    }

    pub fn spec(&self) -> &CompileSpec {
        &self.spec
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn summary(&self) -> Option<&CompileSummary> {
        self.summary.as_ref()
    }

    /// Fits against `dataset`. A fitted recommender cannot be refitted.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<CompileSummary> {
        if self.is_fitted() {
            return Err(RecommenderError::configuration(
                "recommender is already fitted; compile a new one instead",
            ));
        }
        validate_compile_spec(dataset, &self.spec)?;

        let (model, summary) = match &self.spec {
            CompileSpec::ContentBased(roles) => {
                let model = ContentModel::fit(dataset, roles, &self.content)?;
                let summary = CompileSummary {
                    system_type: self.spec.system_type().to_string(),
                    algorithm: model.name().to_string(),
                    selected_columns: self.spec.query_columns(),
                    training_rows: model.training_rows(),
                    vocabulary_size: Some(model.vocabulary_size()),
                    users: None,
                    items: None,
                };
                (FittedModel::Content(model), summary)
            }
            CompileSpec::Collaborative(roles) => {
                let model = CollaborativeModel::fit(dataset, roles, &self.collaborative)?;
                let summary = CompileSummary {
                    system_type: self.spec.system_type().to_string(),
                    algorithm: model.name().to_string(),
                    selected_columns: self.spec.query_columns(),
                    training_rows: dataset.len(),
                    vocabulary_size: None,
                    users: Some(model.table().user_count()),
                    items: Some(model.table().item_count()),
                };
                (FittedModel::Collaborative(model), summary)
            }
        };

        info!(
            "Compiled {} recommender ({}) over {} rows",
            summary.system_type, summary.algorithm, summary.training_rows
        );

        self.model = Some(model);
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn recommend(&self, query: &QueryInput, limit: usize) -> Result<Vec<Recommendation>> {
        self.model
            .as_ref()
            .ok_or(RecommenderError::NotFitted)?
            .recommend(query, limit)
    }
}

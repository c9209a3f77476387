use crate::algorithms::features::FeatureBuilder;
use crate::algorithms::ranker::{rank, RankPolicy};
use crate::algorithms::tfidf::{SparseVector, TfidfVectorizer};
use crate::algorithms::Trainable;
use crate::config::ContentConfig;
use crate::error::Result;
use crate::models::{ContentRoles, Dataset, Recommendation, Value};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// TF-IDF index over the input columns of every training row.
///
/// Immutable once fitted; queries only read it.
#[derive(Debug, Clone)]
pub struct ContentModel {
    builder: FeatureBuilder,
    vectorizer: TfidfVectorizer,
    vectors: Vec<SparseVector>,
    labels: Vec<String>,
    details: Vec<String>,
    similarity_threshold: f64,
}

impl Trainable for ContentModel {
    type Roles = ContentRoles;
    type Settings = ContentConfig;

    fn fit(dataset: &Dataset, roles: &ContentRoles, config: &ContentConfig) -> Result<Self> {
        let builder = FeatureBuilder::new(roles.input_columns.clone())?;
        let corpus = builder.build(dataset)?;
        let output = dataset.require_column(&roles.output_column)?;

        let mut vectorizer = TfidfVectorizer::new(config);
        let vectors = vectorizer.fit_transform(corpus.documents())?;

        let labels = dataset.column_values(output).map(Value::to_string).collect();
        let inputs: Vec<(usize, &String)> = roles
            .input_columns
            .iter()
            .map(|c| dataset.require_column(c).map(|i| (i, c)))
            .collect::<Result<_>>()?;
        let details = dataset
            .rows()
            .iter()
            .map(|row| {
                inputs
                    .iter()
                    .map(|(i, name)| format!("{}: {}", name, row[*i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect();

        info!(
            "Fitted content model over {} rows with {} features",
            vectors.len(),
            vectorizer.vocabulary_size()
        );

        Ok(Self {
            builder,
            vectorizer,
            vectors,
            labels,
            details,
            similarity_threshold: config.similarity_threshold,
        })
    }
}

impl ContentModel {
    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    pub fn training_rows(&self) -> usize {
        self.vectors.len()
    }

    pub fn input_columns(&self) -> &[String] {
        self.builder.input_columns()
    }

    /// Cosine similarity of the query against every training row, in row order.
    pub fn similarities(&self, inputs: &HashMap<String, Value>) -> Result<Vec<(usize, f64)>> {
        let document = self.builder.document_for(inputs);
        let query = self.vectorizer.transform(&document)?;
        debug!("Content query '{}' hit {} features", document, query.entries().len());

        Ok(self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(row, vector)| (row, query.cosine(vector).max(0.0)))
            .collect())
    }

    pub fn recommend_for_inputs(
        &self,
        inputs: &HashMap<String, Value>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let scores = self.similarities(inputs)?;
        let policy = RankPolicy::content(self.similarity_threshold);

        Ok(rank(scores, &policy, limit, |row| self.labels[*row].clone())
            .into_iter()
            .map(|ranked| {
                let details = self.details[ranked.key].clone();
                ranked.into_recommendation().with_details(details)
            })
            .collect())
    }
}

use crate::error::{RecommenderError, Result};
use crate::models::{Dataset, Value};
use std::collections::HashMap;

/// One lowercase document per training row, in dataset row order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCorpus {
    documents: Vec<String>,
}

impl TextCorpus {
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Turns the selected input columns of a row into a single text document.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBuilder {
    input_columns: Vec<String>,
}

impl FeatureBuilder {
    pub fn new(input_columns: Vec<String>) -> Result<Self> {
        if input_columns.is_empty() {
            return Err(RecommenderError::configuration(
                "at least one input column is required",
            ));
        }
        Ok(Self { input_columns })
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    /// Builds the training corpus. The dataset is only read.
    pub fn build(&self, dataset: &Dataset) -> Result<TextCorpus> {
        let indices = self
            .input_columns
            .iter()
            .map(|c| dataset.require_column(c))
            .collect::<Result<Vec<_>>>()?;

        let documents = dataset
            .rows()
            .iter()
            .map(|row| render_document(indices.iter().map(|&c| &row[c])))
            .collect();

        Ok(TextCorpus { documents })
    }

    /// Builds a query document the same way training documents are built.
    /// Absent columns contribute nothing; unknown keys are ignored.
    pub fn document_for(&self, inputs: &HashMap<String, Value>) -> String {
        render_document(self.input_columns.iter().filter_map(|c| inputs.get(c)))
    }
}

fn render_document<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .filter(|v| !v.is_null())
        .map(|v| v.to_string().to_lowercase())
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

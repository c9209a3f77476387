use crate::error::{RecommenderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// A single tabular cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for cells that already hold a number.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric coercion: finite numbers pass through, text is parsed, null and
    /// non-finite values are absent.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v).filter(|v| v.is_finite()),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{:.1}", v)
            }
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// Wire shape of an uploaded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecords {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// An immutable batch of rows sharing one column set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DatasetRecords", into = "DatasetRecords")]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(RecommenderError::configuration(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(RecommenderError::configuration(format!(
                    "row {} has {} values, expected {}",
                    index,
                    row.len(),
                    columns.len()
                )));
            }
        }

        Ok(Self { columns, rows })
    }

    /// Builds a dataset from keyed rows; every row must carry the same keys.
    pub fn from_maps(maps: Vec<BTreeMap<String, Value>>) -> Result<Self> {
        let columns: Vec<String> = match maps.first() {
            Some(first) => first.keys().cloned().collect(),
            None => return Self::new(Vec::new(), Vec::new()),
        };

        let mut rows = Vec::with_capacity(maps.len());
        for (index, mut map) in maps.into_iter().enumerate() {
            if map.len() != columns.len() || columns.iter().any(|c| !map.contains_key(c)) {
                return Err(RecommenderError::configuration(format!(
                    "row {} does not share the dataset column set",
                    index
                )));
            }
            rows.push(
                columns
                    .iter()
                    .map(|c| map.remove(c).unwrap_or(Value::Null))
                    .collect(),
            );
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            RecommenderError::configuration(format!("column '{}' is not in the dataset", name))
        })
    }

    pub fn value(&self, row: usize, column: usize) -> &Value {
        &self.rows[row][column]
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[column])
    }
}

impl TryFrom<DatasetRecords> for Dataset {
    type Error = RecommenderError;

    fn try_from(records: DatasetRecords) -> Result<Self> {
        Dataset::new(records.columns, records.rows)
    }
}

impl From<Dataset> for DatasetRecords {
    fn from(dataset: Dataset) -> Self {
        DatasetRecords {
            columns: dataset.columns,
            rows: dataset.rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRoles {
    pub input_columns: Vec<String>,
    pub output_column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborativeAlgorithm {
    #[default]
    Svd,
    Knn,
}

impl CollaborativeAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborativeAlgorithm::Svd => "svd",
            CollaborativeAlgorithm::Knn => "knn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeRoles {
    pub user_column: String,
    pub item_column: String,
    pub rating_column: String,
    /// Friendlier display column for items, e.g. a title.
    #[serde(default)]
    pub label_column: Option<String>,
    #[serde(default)]
    pub algorithm: CollaborativeAlgorithm,
}

/// Algorithm family plus column roles, chosen once per compile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "system_type", rename_all = "snake_case")]
pub enum CompileSpec {
    ContentBased(ContentRoles),
    Collaborative(CollaborativeRoles),
}

impl CompileSpec {
    pub fn system_type(&self) -> &'static str {
        match self {
            CompileSpec::ContentBased(_) => "content_based",
            CompileSpec::Collaborative(_) => "collaborative",
        }
    }

    /// Columns a caller fills in when querying the compiled model.
    pub fn query_columns(&self) -> Vec<String> {
        match self {
            CompileSpec::ContentBased(roles) => roles.input_columns.clone(),
            CompileSpec::Collaborative(roles) => vec![roles.user_column.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryInput {
    /// New item attributes, answered by a content-based model.
    Attributes { inputs: HashMap<String, Value> },
    /// A known user, answered by a collaborative model.
    User { user_id: Value },
    /// Items co-rated like the first item whose label contains `item`.
    SimilarItems { item: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub query: QueryInput,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub label: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Recommendation {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
            details: None,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// What a compile produced, returned to the caller in place of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileSummary {
    pub system_type: String,
    pub algorithm: String,
    pub selected_columns: Vec<String>,
    pub training_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
}

/// Returned when a dataset is uploaded into a new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub columns: Vec<String>,
    pub rows: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub session_id: Uuid,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

use thiserror::Error;

/// Failures surfaced by fitting or querying a recommender.
///
/// Every variant is terminal for the current request only: a failed fit
/// leaves no model behind and a failed query leaves the fitted model as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    /// Invalid column roles, non-numeric ratings, or a bad request shape.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A query reached a recommender that was never successfully fitted.
    #[error("model has not been fitted")]
    NotFitted,

    /// A query referenced an identifier absent from the training data.
    #[error("unknown {entity}: {id}")]
    UnknownEntity { entity: &'static str, id: String },

    /// Empty, rank-deficient or otherwise unusable numeric input.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),
}

impl RecommenderError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn unknown(entity: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownEntity {
            entity,
            id: id.into(),
        }
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::NumericDegeneracy(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entity_message_names_identifier() {
        let err = RecommenderError::unknown("user", "42");
        assert_eq!(err.to_string(), "unknown user: 42");
    }
}

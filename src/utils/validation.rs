use crate::config::RecommendationConfig;
use crate::error::{RecommenderError, Result};
use crate::models::*;
use std::collections::HashSet;

/// Checks column roles against the dataset before any fitting work starts.
pub fn validate_compile_spec(dataset: &Dataset, spec: &CompileSpec) -> Result<()> {
    match spec {
        CompileSpec::ContentBased(roles) => validate_content_roles(dataset, roles),
        CompileSpec::Collaborative(roles) => validate_collaborative_roles(dataset, roles),
    }
}

pub fn validate_content_roles(dataset: &Dataset, roles: &ContentRoles) -> Result<()> {
    if roles.input_columns.is_empty() {
        return Err(RecommenderError::configuration(
            "content-based models need at least one input column",
        ));
    }

    let mut seen = HashSet::new();
    for column in &roles.input_columns {
        if !seen.insert(column.as_str()) {
            return Err(RecommenderError::configuration(format!(
                "input column '{}' selected twice",
                column
            )));
        }
        dataset.require_column(column)?;
    }

    if roles.output_column.is_empty() {
        return Err(RecommenderError::configuration(
            "content-based models need an output column",
        ));
    }
    dataset.require_column(&roles.output_column)?;

    Ok(())
}

pub fn validate_collaborative_roles(dataset: &Dataset, roles: &CollaborativeRoles) -> Result<()> {
    let required = [
        ("user", &roles.user_column),
        ("item", &roles.item_column),
        ("rating", &roles.rating_column),
    ];

    for (role, column) in required {
        if column.is_empty() {
            return Err(RecommenderError::configuration(format!(
                "collaborative models need a {} column",
                role
            )));
        }
        dataset.require_column(column)?;
    }

    let distinct: HashSet<&str> = required.iter().map(|(_, c)| c.as_str()).collect();
    if distinct.len() != required.len() {
        return Err(RecommenderError::configuration(
            "user, item and rating columns must be distinct",
        ));
    }

    if let Some(label) = &roles.label_column {
        dataset.require_column(label)?;
    }

    Ok(())
}

/// Resolves the requested result count; `0` is valid and yields no results.
pub fn resolve_limit(requested: Option<usize>, config: &RecommendationConfig) -> Result<usize> {
    let limit = requested.unwrap_or(config.default_limit);
    if limit > config.max_limit {
        return Err(RecommenderError::configuration(format!(
            "limit {} exceeds the maximum of {}",
            limit, config.max_limit
        )));
    }
    Ok(limit)
}

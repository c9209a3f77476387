//! Read-only dataset statistics consumed by the visualisation layer.
//!
//! Nothing here renders; the summary carries the numbers a plotting front end
//! needs for distribution, correlation, missing-data and scatter views.

use crate::models::{Dataset, Value};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub numeric_columns: Vec<String>,
    pub missing: Vec<MissingData>,
    pub distributions: Vec<Distribution>,
    pub correlation: Option<CorrelationMatrix>,
    pub scatter: Option<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingData {
    pub column: String,
    pub null_count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub histogram: Vec<HistogramBin>,
}

/// Pearson coefficients; `None` where a pair has no variance or too few rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub x_column: String,
    pub y_column: String,
    pub points: Vec<(f64, f64)>,
}

pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let numeric: Vec<usize> = (0..dataset.columns().len())
        .filter(|&c| is_numeric_column(dataset, c))
        .collect();

    let numeric_columns: Vec<String> = numeric
        .iter()
        .map(|&c| dataset.columns()[c].clone())
        .collect();

    let columns: Vec<Vec<Option<f64>>> = numeric
        .iter()
        .map(|&c| dataset.column_values(c).map(Value::as_f64).collect())
        .collect();

    let distributions = numeric_columns
        .iter()
        .zip(columns.iter())
        .filter_map(|(name, values)| distribution(name, values))
        .collect();

    let correlation = if numeric_columns.is_empty() {
        None
    } else {
        Some(CorrelationMatrix {
            columns: numeric_columns.clone(),
            values: correlation_matrix(&columns)
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
        })
    };

    let scatter = match (columns.first(), columns.get(1)) {
        (Some(xs), Some(ys)) => Some(ScatterSeries {
            x_column: numeric_columns[0].clone(),
            y_column: numeric_columns[1].clone(),
            points: xs
                .iter()
                .zip(ys.iter())
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect(),
        }),
        _ => None,
    };

    DatasetSummary {
        rows: dataset.len(),
        numeric_columns,
        missing: missing_data(dataset),
        distributions,
        correlation,
        scatter,
    }
}

/// A column is numeric when it has values and every non-null one is a number.
pub fn is_numeric_column(dataset: &Dataset, column: usize) -> bool {
    let mut any = false;
    for value in dataset.column_values(column) {
        match value {
            Value::Null => {}
            Value::Int(_) | Value::Float(_) => any = true,
            Value::Text(_) => return false,
        }
    }
    any
}

pub fn missing_data(dataset: &Dataset) -> Vec<MissingData> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let null_count = dataset.column_values(c).filter(|v| v.is_null()).count();
            let percent = if dataset.is_empty() {
                0.0
            } else {
                null_count as f64 / dataset.len() as f64 * 100.0
            };
            MissingData {
                column: name.clone(),
                null_count,
                percent,
            }
        })
        .collect()
}

fn distribution(column: &str, values: &[Option<f64>]) -> Option<Distribution> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let count = present.len();
    let mean = crate::utils::mean(&present)?;

    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let std_dev = if count > 1 {
        let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    Some(Distribution {
        column: column.to_string(),
        count,
        mean,
        std_dev,
        min,
        max,
        histogram: histogram(&present, min, max),
    })
}

fn histogram(values: &[f64], min: f64, max: f64) -> Vec<HistogramBin> {
    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / HISTOGRAM_BINS as f64;
    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == HISTOGRAM_BINS {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in values {
        let index = (((value - min) / width) as usize).min(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }

    bins
}

/// Pairwise-complete Pearson correlation between columns.
fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Array2<Option<f64>> {
    let n = columns.len();
    let mut matrix = Array2::from_elem((n, n), None);

    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i], &columns[j]);
            matrix[[i, j]] = r;
            matrix[[j, i]] = r;
        }
    }

    matrix
}

fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["title".into(), "year".into(), "rating".into()],
            vec![
                vec![Value::from("A"), Value::Int(1990), Value::Float(2.0)],
                vec![Value::from("B"), Value::Int(2000), Value::Float(4.0)],
                vec![Value::from("C"), Value::Int(2010), Value::Null],
                vec![Value::Null, Value::Int(2020), Value::Float(8.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_columns_and_missing_counts() {
        let summary = summarize(&sample());
        assert_eq!(summary.numeric_columns, vec!["year", "rating"]);

        let rating = summary.missing.iter().find(|m| m.column == "rating").unwrap();
        assert_eq!(rating.null_count, 1);
        assert!((rating.percent - 25.0).abs() < 1e-9);

        let title = summary.missing.iter().find(|m| m.column == "title").unwrap();
        assert_eq!(title.null_count, 1);
    }

    #[test]
    fn test_distribution_and_histogram() {
        let summary = summarize(&sample());
        let year = &summary.distributions[0];
        assert_eq!(year.count, 4);
        assert_eq!(year.min, 1990.0);
        assert_eq!(year.max, 2020.0);
        assert!((year.mean - 2005.0).abs() < 1e-9);
        assert_eq!(year.histogram.len(), HISTOGRAM_BINS);
        assert_eq!(year.histogram.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_correlation_uses_complete_pairs() {
        let summary = summarize(&sample());
        let correlation = summary.correlation.unwrap();
        assert!((correlation.values[0][0].unwrap() - 1.0).abs() < 1e-9);
        let r = correlation.values[0][1].unwrap();
        assert!(r > 0.9 && r <= 1.0);
        assert_eq!(correlation.values[0][1], correlation.values[1][0]);
    }

    #[test]
    fn test_scatter_skips_incomplete_rows() {
        let scatter = summarize(&sample()).scatter.unwrap();
        assert_eq!(scatter.x_column, "year");
        assert_eq!(scatter.y_column, "rating");
        assert_eq!(scatter.points.len(), 3);
    }

    #[test]
    fn test_no_scatter_with_single_numeric_column() {
        let dataset = Dataset::new(
            vec!["name".into(), "score".into()],
            vec![vec![Value::from("a"), Value::Int(1)]],
        )
        .unwrap();
        let summary = summarize(&dataset);
        assert!(summary.scatter.is_none());
        assert_eq!(summary.correlation.unwrap().values, vec![vec![None]]);
    }
}

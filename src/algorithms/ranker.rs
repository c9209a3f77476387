use crate::models::Recommendation;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Filtering rules applied between raw scoring and truncation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankPolicy {
    /// Candidates scoring below this are noise, not recommendations.
    pub min_score: Option<f64>,
    /// Emit each label at most once, keeping its best-ranked candidate.
    pub dedupe_labels: bool,
}

impl RankPolicy {
    pub fn content(similarity_threshold: f64) -> Self {
        Self {
            min_score: Some(similarity_threshold),
            dedupe_labels: true,
        }
    }

    /// Predicted ratings may legitimately be low, so nothing is floored.
    pub fn collaborative() -> Self {
        Self {
            min_score: None,
            dedupe_labels: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<K> {
    pub key: K,
    pub label: String,
    pub score: f64,
}

impl<K> Ranked<K> {
    pub fn into_recommendation(self) -> Recommendation {
        Recommendation::new(self.label, self.score)
    }
}

/// Orders candidates by descending score and applies `policy` until `limit`
/// results are collected.
///
/// The sort is stable, so equal scores keep their input order. Non-finite
/// scores are never eligible. `limit == 0` yields an empty list.
pub fn rank<K, F>(
    candidates: Vec<(K, f64)>,
    policy: &RankPolicy,
    limit: usize,
    mut label_of: F,
) -> Vec<Ranked<K>>
where
    F: FnMut(&K) -> String,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut eligible: Vec<(K, f64)> = candidates
        .into_iter()
        .filter(|(_, score)| score.is_finite())
        .filter(|(_, score)| policy.min_score.map_or(true, |floor| *score >= floor))
        .collect();

    eligible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut emitted = HashSet::new();
    let mut ranked = Vec::with_capacity(limit.min(eligible.len()));

    for (key, score) in eligible {
        let label = label_of(&key);
        if policy.dedupe_labels && !emitted.insert(label.clone()) {
            continue;
        }

        ranked.push(Ranked { key, label, score });
        if ranked.len() >= limit {
            break;
        }
    }

    ranked
}

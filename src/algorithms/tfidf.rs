//! TF-IDF vector space over a text corpus.
//!
//! ```text
//! tfidf(t, d) = tf(t, d) × idf(t)
//! tf(t, d)    = occurrences of term t in document d
//! idf(t)      = ln((1 + n) / (1 + df(t))) + 1
//! ```
//!
//! Rows are L2-normalised so cosine similarity reduces to a dot product.

use crate::config::ContentConfig;
use crate::error::{RecommenderError, Result};
use crate::utils::normalize_vector;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sparse row of `(feature index, weight)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn from_counts(counts: HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(usize, f64)> = counts.into_iter().filter(|(_, w)| *w != 0.0).collect();
        entries.sort_by_key(|(index, _)| *index);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a_index, a_weight) = self.entries[i];
            let (b_index, b_weight) = other.entries[j];
            match a_index.cmp(&b_index) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; 0 when either side is all-zero.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let denominator = self.norm() * other.norm();
        if denominator == 0.0 {
            0.0
        } else {
            (self.dot(other) / denominator).clamp(-1.0, 1.0)
        }
    }

    fn normalize(&mut self) {
        let mut weights: Vec<f64> = self.entries.iter().map(|(_, w)| *w).collect();
        normalize_vector(&mut weights);
        for (entry, weight) in self.entries.iter_mut().zip(weights) {
            entry.1 = weight;
        }
    }
}

#[derive(Debug, Clone)]
struct FittedVocabulary {
    terms: HashMap<String, usize>,
    idf: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    ngram_range: (usize, usize),
    strip_accents: bool,
    stop_words: bool,
    fitted: Option<FittedVocabulary>,
}

impl TfidfVectorizer {
    pub fn new(config: &ContentConfig) -> Self {
        let min_n = config.ngram_range.0.max(1);
        Self {
            max_features: config.max_features,
            ngram_range: (min_n, config.ngram_range.1.max(min_n)),
            strip_accents: config.strip_accents,
            stop_words: config.stop_words,
            fitted: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.terms.len())
    }

    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.fitted.as_ref()?.terms.get(term).copied()
    }

    /// Learns vocabulary and IDF weights, returning one row per document.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseVector>> {
        if documents.is_empty() {
            return Err(RecommenderError::degenerate("cannot fit TF-IDF on an empty corpus"));
        }

        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| self.analyze(d.as_ref())).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let unique: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(RecommenderError::degenerate(
                "empty vocabulary: documents contain only stop words or short tokens",
            ));
        }

        let mut ranked: Vec<(&str, usize)> = doc_freq.into_iter().collect();
        if ranked.len() > self.max_features {
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            ranked.truncate(self.max_features);
        }
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = documents.len() as f64;
        let idf = ranked
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        let terms = ranked
            .iter()
            .enumerate()
            .map(|(index, (term, _))| (term.to_string(), index))
            .collect();

        self.fitted = Some(FittedVocabulary { terms, idf });

        analyzed.iter().map(|terms| self.weigh(terms)).collect()
    }

    /// Projects a document into the fitted space; unseen terms are dropped.
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        self.weigh(&self.analyze(document))
    }

    fn weigh(&self, terms: &[String]) -> Result<SparseVector> {
        let fitted = self.fitted.as_ref().ok_or(RecommenderError::NotFitted)?;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in terms {
            if let Some(&index) = fitted.terms.get(term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        for (index, weight) in counts.iter_mut() {
            *weight *= fitted.idf[*index];
        }

        let mut vector = SparseVector::from_counts(counts);
        vector.normalize();
        Ok(vector)
    }

    /// Tokens and n-grams of a document, stop words removed before n-gram generation.
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let tokens = self.tokenize(document);
        let (min_n, max_n) = self.ngram_range;

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    fn tokenize(&self, document: &str) -> Vec<String> {
        let lowered = document.to_lowercase();
        let text = if self.strip_accents {
            strip_accents(&lowered)
        } else {
            lowered
        };

        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .filter(|token| !(self.stop_words && is_stop_word(token)))
            .map(str::to_string)
            .collect()
    }
}

/// Decomposes characters and drops combining marks ("café" → "cafe").
pub fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

pub fn is_stop_word(token: &str) -> bool {
    static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORDS
        .get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
        .contains(token)
}

pub const ENGLISH_STOP_WORDS: &[&str] = &[
    // articles and pronouns
    "a", "an", "the", "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you",
    "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her",
    "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    // questions
    "what", "which", "who", "whom", "whose", "why", "when", "where", "how",
    // prepositions
    "about", "above", "across", "after", "against", "along", "among", "around", "at",
    "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "down",
    "during", "for", "from", "in", "inside", "into", "near", "of", "off", "on", "onto", "out",
    "outside", "over", "through", "throughout", "to", "toward", "under", "until", "up",
    "upon", "with", "within", "without",
    // conjunctions
    "and", "as", "because", "but", "if", "or", "since", "so", "than", "that", "though",
    "unless", "while", "nor", "yet",
    // auxiliaries
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "would", "should", "could", "ought", "can", "may", "might",
    "must", "will", "shall",
    // determiners and adverbs
    "all", "any", "both", "each", "every", "few", "more", "most", "much", "neither", "no",
    "none", "not", "other", "same", "several", "some", "such", "very", "too", "only", "own",
    "then", "there", "these", "this", "those", "just", "now", "here", "again", "also",
    "even", "ever", "further", "once", "whether",
];

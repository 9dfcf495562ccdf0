//! Vector space ranking.
//!
//! Document term weights are `tf * idf` with `tf = freq / max_freq(doc)` and
//! `idf = log10(N / df)`. They are computed once per index, together with the
//! document norms, and reused by every query. Query weights use the expanded
//! query weights normalized by the query's largest one.

use crate::index::{DocId, InvertedIndex};
use crate::proximity::{dampening_factor, minimal_span, UNBOUNDED_SPAN};
use crate::query::Query;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VectorModel {
    /// term → document → weight, only nonzero weights.
    weights: HashMap<String, HashMap<DocId, f64>>,
    norms: Vec<f64>,
    num_docs: u32,
}

/// `log10(N / df)`, 0 for terms in no document.
pub fn idf(index: &InvertedIndex, term: &str) -> f64 {
    let df = index.document_frequency(term);
    if df == 0 {
        return 0.0;
    }
    (index.num_docs() as f64 / df as f64).log10()
}

impl VectorModel {
    pub fn build(index: &InvertedIndex) -> Self {
        let mut weights: HashMap<String, HashMap<DocId, f64>> = HashMap::new();
        let mut norms = vec![0.0f64; index.num_docs()];
        for (term, postings) in &index.vocabulary {
            let term_idf = idf(index, term);
            for (doc, positions) in postings {
                let max = index.max_frequency(*doc);
                if max == 0 {
                    continue;
                }
                let w = positions.len() as f64 / max as f64 * term_idf;
                if w == 0.0 {
                    continue;
                }
                norms[*doc as usize] += w * w;
                weights.entry(term.clone()).or_default().insert(*doc, w);
            }
        }
        for n in norms.iter_mut() {
            *n = n.sqrt();
        }
        tracing::info!(terms = weights.len(), num_docs = norms.len(), "computed document vectors");
        Self { weights, norms, num_docs: index.num_docs() as u32 }
    }

    /// True when the model was computed over an index of the same size.
    pub fn fits(&self, index: &InvertedIndex) -> bool {
        self.num_docs as usize == index.num_docs() && self.norms.len() == index.num_docs()
    }

    pub fn weight(&self, term: &str, doc: DocId) -> f64 {
        self.weights
            .get(term)
            .and_then(|d| d.get(&doc))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn norm(&self, doc: DocId) -> f64 {
        self.norms.get(doc as usize).copied().unwrap_or(0.0)
    }

    /// Sum of a term's weight over every document containing it.
    pub fn word_relevance(&self, term: &str) -> f64 {
        self.weights.get(term).map(|d| d.values().sum()).unwrap_or(0.0)
    }

    /// Nonzero query weights keyed by vocabulary term.
    pub fn query_vector<'q>(&self, index: &InvertedIndex, query: &'q Query) -> HashMap<&'q str, f64> {
        if query.most_repeated == 0.0 {
            return HashMap::new();
        }
        query
            .expanded()
            .iter()
            .map(|(term, w)| (term.as_str(), w / query.most_repeated * idf(index, term)))
            .filter(|(_, w)| *w != 0.0)
            .collect()
    }

    /// Cosine similarity; NaN when either vector is null.
    pub fn similarity(&self, query_vector: &HashMap<&str, f64>, query_norm: f64, doc: DocId) -> f64 {
        let dot: f64 = query_vector
            .iter()
            .map(|(term, w)| w * self.weight(term, doc))
            .sum();
        dot / (query_norm * self.norm(doc))
    }

    /// Eligible documents with a defined, nonzero score, best first.
    pub fn rank(&self, index: &InvertedIndex, query: &Query) -> Vec<(DocId, f64)> {
        let vector = self.query_vector(index, query);
        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        let mut scored: Vec<(DocId, f64)> = index
            .documents()
            .filter(|&doc| query.admits(index, doc))
            .map(|doc| {
                let score = self.similarity(&vector, norm, doc) * inverse_proximity(index, query, doc);
                (doc, score)
            })
            .filter(|(_, score)| score.is_finite() && *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        scored
    }
}

/// `1 / Π (floor(log5(span)) + 1)` over the query's proximity groups.
pub fn inverse_proximity(index: &InvertedIndex, query: &Query, doc: DocId) -> f64 {
    query
        .proximity
        .iter()
        .map(|group| {
            let lists: Vec<&[u32]> = group.iter().map(|term| index.positions(term, doc)).collect();
            let span = minimal_span(&lists).unwrap_or(UNBOUNDED_SPAN);
            1.0 / dampening_factor(span) as f64
        })
        .product()
}

//! Query operators and term expansion.
//!
//! Operators, on whitespace separated tokens:
//! - `!word` excludes documents containing `word`, and drops it from scoring
//! - `^word` keeps only documents containing `word`
//! - `a ~ b` and `a ~~ b ~~ c` ask for the terms to appear close together
//! - leading `*`s multiply a term's weight by `e` per star
//!
//! Every remaining term is related to the whole vocabulary through identity,
//! shared stem, spelling similarity or synonymy.

use crate::fuzzy;
use crate::index::{DocId, InvertedIndex};
use crate::stemmer::StemCache;
use crate::synonyms::Synonyms;
use crate::tokenizer::trim_punctuation;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Affinity of two distinct terms sharing a stem.
pub const STEM_AFFINITY: f64 = std::f64::consts::E / 3.0;
/// Affinity of two terms listed as synonyms.
pub const SYNONYM_AFFINITY: f64 = std::f64::consts::PI / 10.0;
/// Query terms shorter than this are never matched by spelling.
pub const MIN_FUZZY_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerm {
    pub text: String,
    /// Occurrences in the query, priority boost applied.
    pub weight: f64,
    /// Vocabulary term → affinity, for every nonzero affinity.
    pub suggestions: BTreeMap<String, f64>,
}

/// Operators and raw term weights, before looking at any index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    pub exclusions: BTreeSet<String>,
    pub inclusions: BTreeSet<String>,
    pub proximity: BTreeSet<BTreeSet<String>>,
    /// (term, weight) in order of first appearance.
    pub terms: Vec<(String, f64)>,
}

fn push_trimmed(group: &mut BTreeSet<String>, raw: &str) {
    let term = trim_punctuation(raw);
    if !term.is_empty() {
        group.insert(term.to_string());
    }
}

pub fn parse(text: &str) -> ParsedQuery {
    let lowered = text.to_lowercase();
    let raw: Vec<&str> = lowered.split_whitespace().collect();
    let mut parsed = ParsedQuery::default();

    for i in 1..raw.len().saturating_sub(1) {
        if raw[i] != "~" {
            continue;
        }
        let (prev, next) = (trim_punctuation(raw[i - 1]), trim_punctuation(raw[i + 1]));
        if !prev.is_empty() && !next.is_empty() {
            parsed.proximity.insert([prev.to_string(), next.to_string()].into_iter().collect());
        }
    }

    let mut i = 1;
    while i + 1 < raw.len() {
        if raw[i] != "~~" {
            i += 1;
            continue;
        }
        let mut group = BTreeSet::new();
        push_trimmed(&mut group, raw[i - 1]);
        while i + 1 < raw.len() && raw[i] == "~~" {
            push_trimmed(&mut group, raw[i + 1]);
            i += 2;
        }
        if group.len() > 1 {
            parsed.proximity.insert(group);
        }
    }

    for word in &raw {
        let term = trim_punctuation(word);
        if term.is_empty() {
            continue;
        }
        if word.starts_with('!') {
            parsed.exclusions.insert(term.to_string());
        }
        if word.starts_with('^') {
            parsed.inclusions.insert(term.to_string());
        }
    }

    let mut stars: HashMap<String, i32> = HashMap::new();
    for word in &raw {
        let term = trim_punctuation(word);
        if term.chars().count() <= 1 || parsed.exclusions.contains(term) {
            continue;
        }
        let boost = word
            .chars()
            .take_while(|c| matches!(c, '*' | '^'))
            .filter(|c| *c == '*')
            .count() as i32;
        *stars.entry(term.to_string()).or_insert(0) += boost;
        match parsed.terms.iter_mut().find(|(t, _)| t == term) {
            Some((_, count)) => *count += 1.0,
            None => parsed.terms.push((term.to_string(), 1.0)),
        }
    }
    for (term, weight) in parsed.terms.iter_mut() {
        *weight *= (stars[term.as_str()] as f64).exp();
    }
    parsed
}

fn related(term: &str, term_stem: &str, word: &str, stems: &StemCache, synonyms: &Synonyms) -> f64 {
    if term == word {
        return 1.0;
    }
    if term_stem == stems.stem(word) {
        return STEM_AFFINITY;
    }
    if term.chars().count() >= MIN_FUZZY_LEN {
        let similarity = fuzzy::similarity(term, word);
        if similarity > 0.0 {
            return similarity;
        }
    }
    if synonyms.related(term, word) {
        return SYNONYM_AFFINITY;
    }
    0.0
}

/// How related a query term is to a vocabulary term, in [0, 1].
pub fn affinity(term: &str, word: &str, stems: &StemCache, synonyms: &Synonyms) -> f64 {
    related(term, &stems.stem(term), word, stems, synonyms)
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub text: String,
    pub exclusions: BTreeSet<String>,
    pub inclusions: BTreeSet<String>,
    pub proximity: BTreeSet<BTreeSet<String>>,
    pub terms: Vec<QueryTerm>,
    expanded: HashMap<String, f64>,
    /// Largest expanded weight, 0 for an empty query.
    pub most_repeated: f64,
}

impl Query {
    pub fn new(text: &str, index: &InvertedIndex, stems: &StemCache, synonyms: &Synonyms) -> Self {
        let parsed = parse(text);
        let mut expanded: HashMap<String, f64> = HashMap::new();
        let mut terms = Vec::with_capacity(parsed.terms.len());

        for (term, weight) in parsed.terms {
            let mut suggestions = BTreeMap::new();
            if index.is_stop_word(&term) {
                suggestions.insert(term.clone(), 1.0);
            } else {
                let term_stem = stems.stem(&term);
                for word in index.words() {
                    let a = related(&term, &term_stem, word, stems, synonyms);
                    if a > 0.0 {
                        suggestions.insert(word.to_string(), a);
                    }
                }
            }
            for (word, a) in &suggestions {
                *expanded.entry(word.clone()).or_insert(0.0) += weight * a;
            }
            terms.push(QueryTerm { text: term, weight, suggestions });
        }

        let most_repeated = expanded.values().copied().fold(0.0, f64::max);
        tracing::debug!(
            query = text,
            terms = terms.len(),
            expanded = expanded.len(),
            "expanded query"
        );
        Self {
            text: text.to_string(),
            exclusions: parsed.exclusions,
            inclusions: parsed.inclusions,
            proximity: parsed.proximity,
            terms,
            expanded,
            most_repeated,
        }
    }

    /// Accumulated weight of a vocabulary term, 0 if unrelated to the query.
    pub fn weight(&self, word: &str) -> f64 {
        self.expanded.get(word).copied().unwrap_or(0.0)
    }

    pub fn expanded(&self) -> &HashMap<String, f64> {
        &self.expanded
    }

    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.iter().map(|t| t.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Inclusion/exclusion filter.
    pub fn admits(&self, index: &InvertedIndex, doc: DocId) -> bool {
        self.inclusions.iter().all(|w| index.contains(w, doc))
            && self.exclusions.iter().all(|w| !index.contains(w, doc))
    }
}

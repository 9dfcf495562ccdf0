use crate::source::SourceDocument;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type DocId = u32;

/// Ascending token positions of one term, keyed by document.
pub type Postings = BTreeMap<DocId, Vec<u32>>;

/// Share of documents above which a term counts as a stop word.
pub const STOP_WORD_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub name: String,
    pub path: Option<String>,
    pub modified: Option<i64>,
    /// Full original text, kept for snippet extraction.
    pub text: String,
    pub token_count: u32,
    /// Highest occurrence count among non-stopword terms longer than one character.
    pub max_frequency: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub vocabulary: BTreeMap<String, Postings>,
    pub docs: Vec<DocMeta>, // indexed by DocId
    pub stop_words: BTreeSet<String>,
    /// True when built from scratch in this process, false when restored from cache.
    #[serde(skip)]
    pub changed: bool,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(docs: Vec<SourceDocument>) -> Self {
        let mut index = Self::new();
        for doc in docs {
            index.add_document(doc);
        }
        index.finalize();
        index.changed = true;
        tracing::info!(
            num_docs = index.docs.len(),
            num_terms = index.vocabulary.len(),
            stop_words = index.stop_words.len(),
            "built inverted index"
        );
        index
    }

    fn add_document(&mut self, doc: SourceDocument) -> DocId {
        let doc_id = self.docs.len() as DocId;
        let tokens = tokenize(&doc.text);
        for (term, pos) in &tokens {
            self.vocabulary
                .entry(term.clone())
                .or_default()
                .entry(doc_id)
                .or_default()
                .push(*pos as u32);
        }
        self.docs.push(DocMeta {
            name: doc.name,
            path: doc.path.map(|p| p.display().to_string()),
            modified: doc.modified,
            text: doc.text,
            token_count: tokens.len() as u32,
            max_frequency: 0,
        });
        doc_id
    }

    /// Stop words first, then the per-document TF denominators which depend on them.
    fn finalize(&mut self) {
        let n = self.docs.len();
        self.stop_words = self
            .vocabulary
            .iter()
            .filter(|(term, postings)| {
                term.chars().count() > 1 && n > 0 && postings.len() as f64 / n as f64 > STOP_WORD_RATIO
            })
            .map(|(term, _)| term.clone())
            .collect();

        let mut max_freq: HashMap<DocId, u32> = HashMap::new();
        for (term, postings) in &self.vocabulary {
            if term.chars().count() <= 1 || self.stop_words.contains(term) {
                continue;
            }
            for (doc_id, positions) in postings {
                let slot = max_freq.entry(*doc_id).or_insert(0);
                *slot = (*slot).max(positions.len() as u32);
            }
        }
        for (doc_id, meta) in self.docs.iter_mut().enumerate() {
            meta.max_frequency = max_freq.get(&(doc_id as DocId)).copied().unwrap_or(0);
        }
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.vocabulary.keys().map(String::as_str)
    }

    pub fn documents(&self) -> impl Iterator<Item = DocId> {
        0..self.docs.len() as DocId
    }

    pub fn documents_with<'a>(&'a self, term: &str) -> impl Iterator<Item = DocId> + 'a {
        self.vocabulary.get(term).into_iter().flat_map(|p| p.keys().copied())
    }

    pub fn positions(&self, term: &str, doc: DocId) -> &[u32] {
        self.vocabulary
            .get(term)
            .and_then(|p| p.get(&doc))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn frequency(&self, term: &str, doc: DocId) -> u32 {
        self.positions(term, doc).len() as u32
    }

    pub fn contains(&self, term: &str, doc: DocId) -> bool {
        self.frequency(term, doc) > 0
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.vocabulary.get(term).map(|p| p.len() as u32).unwrap_or(0)
    }

    pub fn max_frequency(&self, doc: DocId) -> u32 {
        self.doc(doc).map(|d| d.max_frequency).unwrap_or(0)
    }

    pub fn is_stop_word(&self, term: &str) -> bool {
        self.stop_words.contains(term)
    }

    pub fn doc(&self, doc: DocId) -> Option<&DocMeta> {
        self.docs.get(doc as usize)
    }

    pub fn doc_id(&self, name: &str) -> Option<DocId> {
        self.docs.iter().position(|d| d.name == name).map(|i| i as DocId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DocumentSource, FixtureSource};

    fn build(docs: &[(&str, &str)]) -> InvertedIndex {
        InvertedIndex::build(FixtureSource::new(docs.iter().copied()).load().unwrap())
    }

    #[test]
    fn posting_lists_are_strictly_ascending() {
        let idx = build(&[("a", "uno dos uno tres uno dos"), ("b", "dos dos")]);
        for postings in idx.vocabulary.values() {
            for positions in postings.values() {
                assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
        assert_eq!(idx.positions("uno", 0), &[0, 2, 4]);
        assert_eq!(idx.positions("dos", 1), &[0, 1]);
    }

    #[test]
    fn frequencies_and_document_frequency() {
        let idx = build(&[("a", "Gato, gato perro"), ("b", "perro!")]);
        assert_eq!(idx.frequency("gato", 0), 2);
        assert_eq!(idx.frequency("gato", 1), 0);
        assert_eq!(idx.document_frequency("perro"), 2);
        assert_eq!(idx.document_frequency("pez"), 0);
        assert!(idx.positions("pez", 0).is_empty());
        assert_eq!(idx.documents_with("perro").collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn stop_words_and_max_frequency() {
        let idx = build(&[
            ("a", "el el el gato gato y"),
            ("b", "el perro y"),
            ("c", "el pez y y y y"),
        ]);
        assert!(idx.is_stop_word("el"));
        // single characters never become stop words
        assert!(!idx.is_stop_word("y"));
        assert_eq!(idx.max_frequency(0), 2);
        assert_eq!(idx.max_frequency(1), 1);
        // "y" is a single character, "el" a stop word
        assert_eq!(idx.max_frequency(2), 1);
    }

    #[test]
    fn document_statistics() {
        let idx = build(&[("a", "uno -- dos"), ("b", "")]);
        assert_eq!(idx.num_docs(), 2);
        assert_eq!(idx.doc(0).unwrap().token_count, 2);
        assert_eq!(idx.max_frequency(1), 0);
        assert_eq!(idx.doc_id("b"), Some(1));
        assert!(idx.changed);
    }
}

//! Search entry point: build-or-restore, then rank, snippet and suggest.

use crate::index::{DocMeta, InvertedIndex};
use crate::model::VectorModel;
use crate::persist::{self, IndexPaths};
use crate::query::Query;
use crate::snippet::snippet;
use crate::source::{DocumentSource, Fingerprint};
use crate::stemmer::StemCache;
use crate::suggest::suggest;
use crate::synonyms::Synonyms;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of results returned by [`SearchEngine::search`].
    pub top_k: usize,
    /// Snippet length in tokens.
    pub snippet_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 10, snippet_len: 75 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    pub name: String,
    pub snippet: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub items: Vec<SearchItem>,
    /// The query rewritten with the best candidate for each term.
    pub suggestion: String,
    /// Matching documents before truncation to `top_k`.
    pub total_hits: usize,
}

pub struct SearchEngine {
    index: InvertedIndex,
    model: VectorModel,
    stems: StemCache,
    synonyms: Synonyms,
    config: SearchConfig,
    cache: Option<IndexPaths>,
}

impl SearchEngine {
    /// Reuse the cache under `cache_dir` when it matches the live documents,
    /// rebuild and rewrite it otherwise. Only a failure to read the documents
    /// themselves is an error.
    pub fn open<P: AsRef<Path>>(
        source: &dyn DocumentSource,
        cache_dir: P,
        synonyms: Synonyms,
        config: SearchConfig,
    ) -> Result<Self> {
        Self::load(source, IndexPaths::new(cache_dir), synonyms, config, false)
    }

    /// Like [`SearchEngine::open`] but never reuses a cached index.
    pub fn rebuild<P: AsRef<Path>>(
        source: &dyn DocumentSource,
        cache_dir: P,
        synonyms: Synonyms,
        config: SearchConfig,
    ) -> Result<Self> {
        Self::load(source, IndexPaths::new(cache_dir), synonyms, config, true)
    }

    /// In-memory engine without any cache.
    pub fn from_index(index: InvertedIndex, synonyms: Synonyms, config: SearchConfig) -> Self {
        let model = VectorModel::build(&index);
        Self { index, model, stems: StemCache::new(), synonyms, config, cache: None }
    }

    fn load(
        source: &dyn DocumentSource,
        paths: IndexPaths,
        synonyms: Synonyms,
        config: SearchConfig,
        force: bool,
    ) -> Result<Self> {
        let fingerprint = source.fingerprint()?;
        let stems = match persist::load_stems(&paths) {
            Ok(entries) => StemCache::with_entries(entries),
            Err(err) => {
                tracing::warn!(error = %err, "stem store unavailable, starting empty");
                StemCache::new()
            }
        };

        let restored = if force {
            None
        } else {
            match persist::restore(&paths, &fingerprint) {
                Ok(index) => index,
                Err(err) => {
                    tracing::warn!(error = %err, "cached index unreadable, rebuilding");
                    None
                }
            }
        };

        let engine = match restored {
            Some(index) => {
                tracing::info!(source = %source.describe(), num_docs = index.num_docs(), "reusing cached index");
                let model = cached_model(&paths, &index);
                Self { index, model, stems, synonyms, config, cache: Some(paths) }
            }
            None => {
                tracing::info!(source = %source.describe(), force, "building index");
                let index = InvertedIndex::build(source.load()?);
                let model = VectorModel::build(&index);
                for word in index.words() {
                    stems.stem(word);
                }
                let engine = Self { index, model, stems, synonyms, config, cache: Some(paths) };
                engine.write_cache(fingerprint);
                engine
            }
        };
        Ok(engine)
    }

    fn write_cache(&self, fingerprint: Fingerprint) {
        let Some(paths) = &self.cache else { return };
        if let Err(err) = persist::save_all(paths, &self.index, &self.model, &self.stems, fingerprint) {
            tracing::warn!(error = %err, "failed to write cache");
        }
    }

    /// Expand `text` against this engine's index.
    pub fn query(&self, text: &str) -> Query {
        Query::new(text, &self.index, &self.stems, &self.synonyms)
    }

    pub fn search(&self, text: &str) -> SearchResult {
        self.search_top(text, self.config.top_k)
    }

    /// Search returning at most `k` items.
    pub fn search_top(&self, text: &str, k: usize) -> SearchResult {
        self.search_query(&self.query(text), k)
    }

    /// Search with an already expanded query, returning at most `k` items.
    pub fn search_query(&self, query: &Query, k: usize) -> SearchResult {
        let ranked = self.model.rank(&self.index, query);
        let total_hits = ranked.len();
        let items: Vec<SearchItem> = ranked
            .into_iter()
            .take(k)
            .filter_map(|(doc, score)| {
                let meta = self.index.doc(doc)?;
                Some(SearchItem {
                    name: meta.name.clone(),
                    snippet: snippet(&self.index, doc, query, self.config.snippet_len),
                    score,
                })
            })
            .collect();
        let suggestion = suggest(query, &self.model);
        tracing::debug!(query = %query.text, total_hits, returned = items.len(), %suggestion, "search");
        SearchResult { items, suggestion, total_hits }
    }

    pub fn document(&self, name: &str) -> Option<&DocMeta> {
        self.index.doc_id(name).and_then(|id| self.index.doc(id))
    }

    /// Persist stems memoized since startup. No-op without a cache directory.
    pub fn flush_stems(&self) -> Result<()> {
        match &self.cache {
            Some(paths) => persist::save_stems(paths, &self.stems),
            None => Ok(()),
        }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn model(&self) -> &VectorModel {
        &self.model
    }

    pub fn stems(&self) -> &StemCache {
        &self.stems
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

/// The cached model when it was written for `index`, a fresh one otherwise.
fn cached_model(paths: &IndexPaths, index: &InvertedIndex) -> VectorModel {
    match persist::load_model(paths) {
        Ok(model) if model.fits(index) => return model,
        Ok(_) => tracing::warn!("cached model does not match the index, recomputing"),
        Err(err) => tracing::warn!(error = %err, "cached model unreadable, recomputing"),
    }
    let model = VectorModel::build(index);
    if let Err(err) = persist::save_model(paths, &model) {
        tracing::warn!(error = %err, "failed to write model");
    }
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DirectorySource, FixtureSource};
    use std::fs;

    fn fixture() -> FixtureSource {
        FixtureSource::new(vec![
            ("gatos.txt", "el gato negro duerme en la casa"),
            ("perros.txt", "el perro ladra al gato en la calle"),
            ("peces.txt", "el pez nada en la pecera"),
        ])
    }

    fn engine(config: SearchConfig) -> SearchEngine {
        let index = InvertedIndex::build(fixture().load().unwrap());
        SearchEngine::from_index(index, Synonyms::empty(), config)
    }

    #[test]
    fn config_defaults() {
        let cfg: SearchConfig = serde_json::from_str(r#"{"top_k": 3}"#).unwrap();
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.snippet_len, 75);
    }

    #[test]
    fn search_returns_ranked_items_and_suggestion() {
        let engine = engine(SearchConfig::default());
        let result = engine.search("gatto negro");
        assert_eq!(result.suggestion, "gato negro");
        assert_eq!(result.items[0].name, "gatos.txt");
        assert_eq!(result.items[0].snippet, "el gato negro duerme en la casa");
        assert_eq!(result.total_hits, result.items.len());
    }

    #[test]
    fn top_k_truncates() {
        let engine = engine(SearchConfig { top_k: 1, ..SearchConfig::default() });
        let result = engine.search("gato");
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.total_hits, 2);
    }

    #[test]
    fn prepared_query_gives_the_same_result() {
        let engine = engine(SearchConfig::default());
        let query = engine.query("gatto");
        assert_eq!(engine.search_query(&query, 10), engine.search_top("gatto", 10));
        assert_eq!(engine.search_query(&query, 1).items.len(), 1);
    }

    #[test]
    fn empty_query_has_no_results() {
        let engine = engine(SearchConfig::default());
        let result = engine.search("   ");
        assert!(result.items.is_empty());
        assert_eq!(result.suggestion, "");
    }

    #[test]
    fn document_lookup_by_name() {
        let engine = engine(SearchConfig::default());
        assert_eq!(engine.document("peces.txt").unwrap().text, "el pez nada en la pecera");
        assert!(engine.document("nope.txt").is_none());
    }

    #[test]
    fn second_open_reuses_the_cache() {
        let docs = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("a.txt"), "el gato negro").unwrap();
        fs::write(docs.path().join("b.txt"), "el perro blanco").unwrap();
        let source = DirectorySource::new(docs.path());

        let first = SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();
        assert!(first.index().changed);
        assert!(!first.stems().is_empty());
        let expected = first.search("gato");
        drop(first);

        let second = SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();
        assert!(!second.index().changed);
        assert_eq!(second.stems().get("gato").as_deref(), Some("gat"));
        assert_eq!(second.search("gato"), expected);

        let forced = SearchEngine::rebuild(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();
        assert!(forced.index().changed);
    }

    #[test]
    fn changed_documents_trigger_a_rebuild() {
        let docs = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("a.txt"), "el gato negro").unwrap();
        let source = DirectorySource::new(docs.path());
        SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();

        fs::write(docs.path().join("b.txt"), "el perro blanco").unwrap();
        let engine = SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();
        assert!(engine.index().changed);
        assert_eq!(engine.index().num_docs(), 2);
    }

    #[test]
    fn corrupt_cache_falls_back_to_rebuild() {
        let docs = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("a.txt"), "el gato negro").unwrap();
        fs::write(docs.path().join("b.txt"), "el perro blanco").unwrap();
        let source = DirectorySource::new(docs.path());
        SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();
        fs::write(cache.path().join("index.bin"), b"not bincode").unwrap();

        let engine = SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).unwrap();
        assert!(engine.index().changed);
        assert_eq!(engine.search("gato").items.len(), 1);
    }

    #[test]
    fn missing_document_directory_is_an_error() {
        let cache = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(cache.path().join("nope"));
        assert!(SearchEngine::open(&source, cache.path(), Synonyms::empty(), SearchConfig::default()).is_err());
    }
}

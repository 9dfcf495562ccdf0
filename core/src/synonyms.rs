use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Static word → related words table.
#[derive(Debug, Default, Clone)]
pub struct Synonyms {
    table: HashMap<String, HashSet<String>>,
}

impl Synonyms {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(map: HashMap<String, Vec<String>>) -> Self {
        let table = map
            .into_iter()
            .map(|(word, related)| (word, related.into_iter().collect()))
            .collect();
        Self { table }
    }

    /// Read a JSON object of the form `{"word": ["related", ...]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("opening synonyms {}", path.display()))?;
        let map: HashMap<String, Vec<String>> = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parsing synonyms {}", path.display()))?;
        Ok(Self::from_map(map))
    }

    /// Like [`Synonyms::load`] but an unreadable table degrades to an empty one.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(s) => {
                tracing::info!(words = s.len(), "loaded synonym table");
                s
            }
            Err(err) => {
                tracing::warn!(error = %err, "synonym table unavailable, continuing without it");
                Self::empty()
            }
        }
    }

    /// True when both words are in the table and `b` is listed under `a`.
    pub fn related(&self, a: &str, b: &str) -> bool {
        if !self.table.contains_key(b) {
            return false;
        }
        self.table.get(a).is_some_and(|set| set.contains(b))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

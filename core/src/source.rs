//! Where documents come from.
//!
//! The index never touches storage itself: it consumes the list produced by a
//! [`DocumentSource`]. Two backends exist, a directory of `.txt` files and an
//! in-memory fixture used by tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Display name, unique within a source.
    pub name: String,
    pub path: Option<PathBuf>,
    /// Modification time in nanoseconds since the unix epoch, when known.
    pub modified: Option<i64>,
    pub text: String,
}

/// Hash of the live document set (names + modification times).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<i64>)>,
        S: AsRef<str>,
    {
        let mut lines: Vec<String> = entries
            .into_iter()
            .map(|(name, modified)| {
                let stamp = modified.map(|m| m.to_string()).unwrap_or_default();
                format!("{}\t{}\n", name.as_ref(), stamp)
            })
            .collect();
        lines.sort();
        let mut hasher = Sha1::new();
        for line in &lines {
            hasher.update(line.as_bytes());
        }
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait DocumentSource {
    /// Human readable origin, used in logs.
    fn describe(&self) -> String;

    /// Names and modification times, without reading any text.
    fn listing(&self) -> Result<Vec<(String, Option<i64>)>>;

    fn load(&self) -> Result<Vec<SourceDocument>>;

    fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(Fingerprint::from_entries(self.listing()?))
    }
}

/// Every `*.txt` file directly under a directory.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            anyhow::bail!("document directory {} does not exist", self.root.display());
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("txt"))
            .collect();
        files.sort();
        Ok(files)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn modified_nanos(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let since = modified.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(since.as_nanos()).ok()
}

impl DocumentSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn listing(&self) -> Result<Vec<(String, Option<i64>)>> {
        Ok(self
            .files()?
            .iter()
            .map(|p| (display_name(p), modified_nanos(p)))
            .collect())
    }

    fn load(&self) -> Result<Vec<SourceDocument>> {
        let mut docs = Vec::new();
        for path in self.files()? {
            let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            docs.push(SourceDocument {
                name: display_name(&path),
                modified: modified_nanos(&path),
                text: String::from_utf8_lossy(&bytes).into_owned(),
                path: Some(path),
            });
        }
        Ok(docs)
    }
}

/// In-memory documents, mostly for tests.
#[derive(Default)]
pub struct FixtureSource {
    docs: Vec<(String, String)>,
}

impl FixtureSource {
    pub fn new<I, N, T>(docs: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self { docs: docs.into_iter().map(|(n, t)| (n.into(), t.into())).collect() }
    }
}

impl DocumentSource for FixtureSource {
    fn describe(&self) -> String {
        format!("fixture ({} documents)", self.docs.len())
    }

    fn listing(&self) -> Result<Vec<(String, Option<i64>)>> {
        Ok(self.docs.iter().map(|(n, _)| (n.clone(), None)).collect())
    }

    fn load(&self) -> Result<Vec<SourceDocument>> {
        Ok(self
            .docs
            .iter()
            .map(|(name, text)| SourceDocument {
                name: name.clone(),
                path: None,
                modified: None,
                text: text.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ignores_listing_order() {
        let a = Fingerprint::from_entries(vec![("a.txt", Some(1)), ("b.txt", Some(2))]);
        let b = Fingerprint::from_entries(vec![("b.txt", Some(2)), ("a.txt", Some(1))]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 40);
    }

    #[test]
    fn fingerprint_tracks_timestamps() {
        let a = Fingerprint::from_entries(vec![("a.txt", Some(1))]);
        let b = Fingerprint::from_entries(vec![("a.txt", Some(2))]);
        assert_ne!(a, b);
    }

    #[test]
    fn directory_source_reads_only_txt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "segundo").unwrap();
        fs::write(dir.path().join("a.txt"), "primero").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        let docs = DirectorySource::new(dir.path()).load().unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(docs[0].text, "primero");
        assert!(docs[0].modified.is_some());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = DirectorySource::new(dir.path().join("nope"));
        assert!(src.load().is_err());
    }
}

use crate::model::VectorModel;
use crate::source::Fingerprint;
use crate::stemmer::StemCache;
use crate::InvertedIndex;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Bumped whenever the on-disk layout changes; older caches are rebuilt.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    pub fingerprint: Fingerprint,
}

impl MetaFile {
    pub fn new(num_docs: usize, fingerprint: Fingerprint) -> Self {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self { num_docs: num_docs as u32, created_at, version: CACHE_VERSION, fingerprint }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn model(&self) -> PathBuf { self.root.join("model.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn stems(&self) -> PathBuf { self.root.join("stems") }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.index(), &bincode::serialize(index)?)
}

/// The restored index reports `changed == false`.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let buf = read_bytes(&paths.index())?;
    let index = bincode::deserialize(&buf).context("decoding index.bin")?;
    Ok(index)
}

pub fn save_model(paths: &IndexPaths, model: &VectorModel) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.model(), &bincode::serialize(model)?)
}

pub fn load_model(paths: &IndexPaths) -> Result<VectorModel> {
    let buf = read_bytes(&paths.model())?;
    let model = bincode::deserialize(&buf).context("decoding model.bin")?;
    Ok(model)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

// No background flusher: every writer flushes before the handle is dropped.
fn open_stems(paths: &IndexPaths) -> Result<sled::Db> {
    sled::Config::new()
        .path(paths.stems())
        .flush_every_ms(None)
        .open()
        .context("opening stem store")
}

/// Append the memo to the on-disk store. Existing keys keep their value.
pub fn save_stems(paths: &IndexPaths, stems: &StemCache) -> Result<()> {
    create_dir_all(&paths.root)?;
    let db = open_stems(paths)?;
    for (term, stem) in stems.snapshot() {
        if !db.contains_key(term.as_bytes())? {
            db.insert(term.as_bytes(), stem.as_bytes())?;
        }
    }
    db.flush()?;
    Ok(())
}

pub fn load_stems(paths: &IndexPaths) -> Result<HashMap<String, String>> {
    let db = open_stems(paths)?;
    let mut entries = HashMap::new();
    for item in db.iter() {
        let (k, v) = item?;
        entries.insert(
            String::from_utf8_lossy(&k).into_owned(),
            String::from_utf8_lossy(&v).into_owned(),
        );
    }
    Ok(entries)
}

/// Restore the index if the cache was written for exactly `fingerprint`.
///
/// `Ok(None)` is a cache miss: no metadata, another layout version or a
/// different document set. Decoding failures are errors.
pub fn restore(paths: &IndexPaths, fingerprint: &Fingerprint) -> Result<Option<InvertedIndex>> {
    let meta = match load_meta(paths) {
        Ok(meta) => meta,
        Err(err) => {
            tracing::debug!(error = %err, "no usable cache metadata");
            return Ok(None);
        }
    };
    if meta.version != CACHE_VERSION || &meta.fingerprint != fingerprint {
        tracing::info!(
            cached = meta.fingerprint.as_str(),
            live = fingerprint.as_str(),
            version = meta.version,
            "cache is stale"
        );
        return Ok(None);
    }
    let index = load_index(paths)?;
    if index.num_docs() != meta.num_docs as usize {
        anyhow::bail!("index.bin holds {} documents, meta.json says {}", index.num_docs(), meta.num_docs);
    }
    Ok(Some(index))
}

/// Write index, model, stems and finally the metadata that validates them.
pub fn save_all(
    paths: &IndexPaths,
    index: &InvertedIndex,
    model: &VectorModel,
    stems: &StemCache,
    fingerprint: Fingerprint,
) -> Result<()> {
    save_index(paths, index)?;
    save_model(paths, model)?;
    save_stems(paths, stems)?;
    save_meta(paths, &MetaFile::new(index.num_docs(), fingerprint))?;
    tracing::info!(root = %paths.root.display(), num_docs = index.num_docs(), "cache written");
    Ok(())
}

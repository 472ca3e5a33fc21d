//! Permalink manifest, published with a temp-file → rename swap.
use anyhow::{Context, Result};
use serde::Serialize;
use std::{collections::BTreeMap, fs, io::Write, path::Path};
use tempfile::NamedTempFile;

/// Source path → permalink, in path order.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn insert(&mut self, source: String, permalink: String) {
        self.0.insert(source, permalink);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sources whose permalinks collide with an earlier source.
    pub fn collisions(&self) -> Vec<(&str, &str)> {
        let mut seen = BTreeMap::new();
        self.iter()
            .filter_map(|(source, link)| seen.insert(link, source).map(|_| (source, link)))
            .collect()
    }

    /// Write as pretty JSON. Readers never see a partial file.
    pub fn write(&self, out: &Path) -> Result<()> {
        let dir = match out.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir).context("create temp manifest")?;
        serde_json::to_writer_pretty(&mut tmp, self).context("serialize manifest")?;
        tmp.write_all(b"\n").context("write manifest")?;

        // Same directory, so the rename is atomic.
        tmp.persist(out).with_context(|| format!("rename manifest -> {}", out.display()))?;
        Ok(())
    }
}

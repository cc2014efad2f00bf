//! Build-or-load cache for finished graphs.
//!
//! Each entry is a directory named after the input fingerprint:
//!
//! ```text
//! <root>/<fingerprint>/graph.json     {points, links}
//! <root>/<fingerprint>/manifest.json  fingerprint, topology, report, created_at
//! ```
//!
//! Both files are written through `atomicwrites`, so a reader sees either
//! the previous file or the complete new one. The manifest is written last
//! and an entry without one is treated as absent.
//!
//! Concurrent builds of the same fingerprint are not serialized: both run to
//! completion and the last rename wins. Callers that must avoid duplicate
//! work have to coordinate themselves.

use crate::fingerprint::is_valid_fingerprint;
use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use cograph_core::{BuildOutput, BuildReport, Graph, Topology};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const GRAPH_FILE: &str = "graph.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Metadata stored next to a cached graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManifest {
    pub fingerprint: String,
    pub topology: Topology,
    pub points: usize,
    pub links: usize,
    pub report: BuildReport,
    pub created_at: DateTime<Utc>,
}

/// A graph served by the cache, with where it came from.
#[derive(Debug, Clone)]
pub struct CachedGraph {
    pub graph: Graph,
    pub manifest: CacheManifest,
    /// `false` when the graph was built by this call.
    pub from_cache: bool,
}

pub struct GraphCache {
    root: PathBuf,
}

impl GraphCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).with_context(|| format!("creating cache dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, fingerprint: &str) -> Result<PathBuf> {
        if !is_valid_fingerprint(fingerprint) {
            bail!("invalid fingerprint {:?}", fingerprint);
        }
        Ok(self.root.join(fingerprint))
    }

    /// Reads a cached entry, `None` if there is none.
    pub fn load(&self, fingerprint: &str) -> Result<Option<CachedGraph>> {
        let dir = self.entry_dir(fingerprint)?;
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(None);
        }
        let manifest: CacheManifest = read_json(&manifest_path)?;
        let graph: Graph = read_json(&dir.join(GRAPH_FILE))?;
        if manifest.fingerprint != fingerprint {
            return Err(anyhow!(
                "manifest fingerprint {} does not match entry {}",
                manifest.fingerprint,
                fingerprint
            ));
        }
        Ok(Some(CachedGraph {
            graph,
            manifest,
            from_cache: true,
        }))
    }

    /// Persists a finished build under `fingerprint`, replacing any entry.
    pub fn store(&self, fingerprint: &str, topology: Topology, output: &BuildOutput) -> Result<CacheManifest> {
        let dir = self.entry_dir(fingerprint)?;
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let manifest = CacheManifest {
            fingerprint: fingerprint.to_string(),
            topology,
            points: output.graph.points.len(),
            links: output.graph.links.len(),
            report: output.report.clone(),
            created_at: Utc::now(),
        };
        write_json(&dir.join(GRAPH_FILE), &output.graph)?;
        write_json(&dir.join(MANIFEST_FILE), &manifest)?;
        tracing::info!(
            fingerprint,
            points = manifest.points,
            links = manifest.links,
            "graph cached"
        );
        Ok(manifest)
    }

    /// Returns the cached graph for `fingerprint` unless `force` is set,
    /// otherwise runs `build`, persists its output and returns it.
    pub fn load_or_build<F>(&self, fingerprint: &str, topology: Topology, force: bool, build: F) -> Result<CachedGraph>
    where
        F: FnOnce() -> cograph_core::Result<BuildOutput>,
    {
        if !force {
            match self.load(fingerprint) {
                Ok(Some(cached)) => {
                    tracing::debug!(fingerprint, "cache hit");
                    return Ok(cached);
                }
                Ok(None) => tracing::debug!(fingerprint, "cache miss"),
                Err(e) => tracing::warn!(fingerprint, error = %e, "unreadable cache entry; rebuilding"),
            }
        }

        let output = build()?;
        let manifest = self.store(fingerprint, topology, &output)?;
        Ok(CachedGraph {
            graph: output.graph,
            manifest,
            from_cache: false,
        })
    }

    /// Removes an entry; returns whether one existed.
    pub fn invalidate(&self, fingerprint: &str) -> Result<bool> {
        let dir = self.entry_dir(fingerprint)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))?;
        Ok(true)
    }

    /// Fingerprints with a complete entry, sorted.
    pub fn entries(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_valid_fingerprint(&name) && entry.path().join(MANIFEST_FILE).exists() {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(&bytes))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

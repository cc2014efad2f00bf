use crate::cache::{CacheManifest, GraphCache};
use crate::error::{Error, Result};
use crate::fingerprint::fingerprint_file;
use crate::loader::JsonLinesSource;
use cograph_core::{BuildConfig, Graph, Identity, TracingProgress};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Serves graphs for data files under one directory.
///
/// A data file is named relative to the data directory; absolute names and
/// `..` components are rejected. The first request for a name builds the
/// graph (or loads it from the cache) and keeps it in memory; later requests
/// share the same `Arc<Graph>` until [`GraphStore::refresh`] or
/// [`GraphStore::evict`].
///
/// Two threads asking for the same unloaded name may both build it. The
/// cache write is atomic and the registry keeps whichever graph is inserted
/// last, so both callers still get a correct graph.
pub struct GraphStore {
    data_dir: PathBuf,
    cache: GraphCache,
    config: BuildConfig,
    graphs: RwLock<HashMap<String, Arc<Graph>>>,
}

impl GraphStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_dir: P, cache_dir: Q, config: BuildConfig) -> Result<Self> {
        config.validate()?;
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.is_dir() {
            return Err(Error::NotFound(data_dir.display().to_string()));
        }
        Ok(Self {
            data_dir,
            cache: GraphCache::new(cache_dir)?,
            config,
            graphs: RwLock::new(HashMap::new()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Maps a data file name to its path, rejecting anything that could
    /// leave the data directory.
    pub fn resolve(&self, data_file: &str) -> Result<PathBuf> {
        let name = Path::new(data_file);
        if data_file.is_empty() || !name.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::InvalidPath(data_file.to_string()));
        }
        let path = self.data_dir.join(name);
        if !path.is_file() {
            return Err(Error::NotFound(data_file.to_string()));
        }
        Ok(path)
    }

    /// The graph for `data_file`, built or loaded on first use.
    pub fn get(&self, data_file: &str) -> Result<Arc<Graph>> {
        if let Some(graph) = self.graphs.read().get(data_file) {
            return Ok(graph.clone());
        }
        self.load(data_file, false).map(|(graph, _)| graph)
    }

    /// Re-reads `data_file` and swaps in its graph. The cache is reused when
    /// the file is unchanged; `force` rebuilds regardless.
    pub fn refresh(&self, data_file: &str, force: bool) -> Result<(Arc<Graph>, CacheManifest)> {
        self.load(data_file, force)
    }

    fn load(&self, data_file: &str, force: bool) -> Result<(Arc<Graph>, CacheManifest)> {
        let path = self.resolve(data_file)?;
        let fingerprint = fingerprint_file(&path, &self.config)?;
        let source = JsonLinesSource::new(&path);
        let cached = self
            .cache
            .load_or_build(&fingerprint, self.config.topology(), force, || {
                self.config.build(&source, &Identity, &TracingProgress::default())
            })?;
        tracing::info!(
            data_file,
            from_cache = cached.from_cache,
            points = cached.manifest.points,
            links = cached.manifest.links,
            "graph ready"
        );

        let graph = Arc::new(cached.graph);
        self.graphs.write().insert(data_file.to_string(), graph.clone());
        Ok((graph, cached.manifest))
    }

    /// Drops the in-memory graph; the cache entry stays.
    pub fn evict(&self, data_file: &str) -> bool {
        self.graphs.write().remove(data_file).is_some()
    }

    /// Names currently held in memory, sorted.
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.graphs.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, GraphStore) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(data.join("nested")).unwrap();
        fs::write(
            data.join("tracks.jsonl"),
            concat!(
                r#"{"id": "t1", "tags": ["rock", "indie"]}"#,
                "\n",
                r#"{"id": "t2", "tags": ["rock", "indie"]}"#,
                "\n",
                r#"{"id": "t3", "tags": "rock|jazz"}"#,
                "\n",
            ),
        )
        .unwrap();
        fs::write(data.join("nested").join("one.jsonl"), r#"{"id": "x", "tags": ["a", "b"]}"#).unwrap();
        let store = GraphStore::new(&data, dir.path().join("cache"), BuildConfig::default()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_get_builds_once_and_shares() {
        let (_dir, store) = setup();
        let first = store.get("tracks.jsonl").unwrap();
        let second = store.get("tracks.jsonl").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.links.len(), 1);
        assert_eq!(store.loaded(), vec!["tracks.jsonl"]);
    }

    #[test]
    fn test_refresh_reads_from_cache() {
        let (_dir, store) = setup();
        store.get("tracks.jsonl").unwrap();
        assert!(store.evict("tracks.jsonl"));
        assert!(!store.evict("tracks.jsonl"));
        let (graph, manifest) = store.refresh("tracks.jsonl", false).unwrap();
        assert_eq!(graph.links.len(), manifest.links);
        assert_eq!(store.loaded(), vec!["tracks.jsonl"]);
    }

    #[test]
    fn test_nested_names_resolve() {
        let (_dir, store) = setup();
        assert!(store.get("nested/one.jsonl").is_ok());
    }

    #[test]
    fn test_rejects_traversal_and_missing() {
        let (_dir, store) = setup();
        assert!(matches!(store.get("../secret.jsonl"), Err(Error::InvalidPath(_))));
        assert!(matches!(store.get("/etc/passwd"), Err(Error::InvalidPath(_))));
        assert!(matches!(store.get(""), Err(Error::InvalidPath(_))));
        assert!(matches!(store.get("missing.jsonl"), Err(Error::NotFound(_))));
    }
}

//! Cache generations on disk and the cache-first serving policy.

use super::manifest::CacheManifest;
use super::source::AssetSource;
use futures::future::try_join_all;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Failures of the cache lifecycle.
#[derive(Debug, Error)]
pub enum CacheError {
    /// An asset fetch rejected during install; the whole generation is
    /// abandoned and nothing partial becomes visible.
    #[error("install of cache generation {generation:?} failed: {source}")]
    InstallFailed {
        generation: String,
        #[source]
        source: anyhow::Error,
    },
    /// A passthrough fetch failed with nothing cached to fall back on. This
    /// propagates to whoever issued the original request.
    #[error("passthrough fetch failed: {0}")]
    Fetch(#[source] anyhow::Error),
    /// Local cache storage failed.
    #[error("cache storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A directory of cache generations, one subdirectory per version.
///
/// Asset paths are percent-encoded into flat file names, so a cached body is
/// keyed by the exact request path that produced it.
pub struct OfflineCache {
    root: PathBuf,
}

impl OfflineCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the platform cache directory.
    pub fn default_root() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("qcalc"))
    }

    /// Fetch every manifest asset and store the set under the manifest's
    /// generation name.
    ///
    /// Fail-fast: if any fetch rejects, the install as a whole rejects and no
    /// trace of the generation is left behind. Bodies are staged into a
    /// hidden directory and renamed into place only once complete.
    pub async fn install<S: AssetSource>(
        &self,
        manifest: &CacheManifest,
        source: &S,
    ) -> Result<(), CacheError> {
        let fetches = manifest.assets.iter().map(|path| async move {
            let body = source.fetch(path).await?;
            Ok::<_, anyhow::Error>((path.as_str(), body))
        });
        let bodies = try_join_all(fetches)
            .await
            .map_err(|source| CacheError::InstallFailed {
                generation: manifest.version.clone(),
                source,
            })?;

        let staging = self.root.join(format!(".staging-{}", manifest.version));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;
        for (path, body) in &bodies {
            fs::write(staging.join(asset_file_name(path)), body)?;
        }

        let live = self.generation_dir(&manifest.version);
        if live.exists() {
            fs::remove_dir_all(&live)?;
        }
        fs::rename(&staging, &live)?;
        info!(
            generation = %manifest.version,
            assets = manifest.assets.len(),
            "installed cache generation"
        );
        Ok(())
    }

    /// Serve a request cache-first: a body cached under any existing
    /// generation is returned without touching the source; otherwise the
    /// request passes through to the source unmodified, and so does its
    /// error.
    pub async fn serve<S: AssetSource>(
        &self,
        path: &str,
        source: &S,
    ) -> Result<Vec<u8>, CacheError> {
        if let Some(body) = self.lookup(path)? {
            debug!(path, "cache hit");
            return Ok(body);
        }
        debug!(path, "cache miss, passing through");
        source.fetch(path).await.map_err(CacheError::Fetch)
    }

    /// Look a request up across all existing generations.
    pub fn lookup(&self, path: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let file_name = asset_file_name(path);
        for generation in self.generations()? {
            let file = self.generation_dir(&generation).join(&file_name);
            match fs::read(&file) {
                Ok(body) => return Ok(Some(body)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }

    /// Delete every generation other than `current`, including abandoned
    /// staging directories. Exactly one generation is live afterwards
    /// (assuming `current` was installed).
    pub fn activate(&self, current: &str) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if name.to_string_lossy() != current {
                fs::remove_dir_all(entry.path())?;
                info!(generation = %name.to_string_lossy(), "removed stale cache generation");
            }
        }
        Ok(())
    }

    /// Names of all installed generations, staging directories excluded.
    pub fn generations(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn generation_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn asset_file_name(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory source that counts how often each path is fetched.
    struct MapSource {
        assets: HashMap<String, Vec<u8>>,
        hits: Mutex<HashMap<String, usize>>,
    }

    impl MapSource {
        fn new(assets: &[(&str, &[u8])]) -> Self {
            Self {
                assets: assets
                    .iter()
                    .map(|(path, body)| (path.to_string(), body.to_vec()))
                    .collect(),
                hits: Mutex::new(HashMap::new()),
            }
        }

        fn hits(&self, path: &str) -> usize {
            self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    impl AssetSource for MapSource {
        async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
            *self.hits.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;
            self.assets
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no such asset: {path}"))
        }
    }

    fn manifest(version: &str, assets: &[&str]) -> CacheManifest {
        CacheManifest::new(version, assets.iter().copied())
    }

    #[tokio::test]
    async fn test_install_mirrors_all_assets() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[("./index.html", b"<html>"), ("./app.js", b"js")]);

        cache
            .install(&manifest("v1", &["./index.html", "./app.js"]), &source)
            .await
            .unwrap();

        assert_eq!(cache.generations().unwrap(), vec!["v1".to_string()]);
        assert_eq!(cache.lookup("./index.html").unwrap().unwrap(), b"<html>");
        assert_eq!(cache.lookup("./app.js").unwrap().unwrap(), b"js");
    }

    #[tokio::test]
    async fn test_failed_install_leaves_no_generation() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[("./index.html", b"<html>")]);

        let result = cache
            .install(&manifest("v1", &["./index.html", "./missing.css"]), &source)
            .await;

        assert!(matches!(
            result,
            Err(CacheError::InstallFailed { generation, .. }) if generation == "v1"
        ));
        // No partial cache is considered valid.
        assert!(cache.generations().unwrap().is_empty());
        assert!(cache.lookup("./index.html").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_generation() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[("./index.html", b"old")]);

        cache
            .install(&manifest("v1", &["./index.html"]), &source)
            .await
            .unwrap();
        let failed = cache
            .install(&manifest("v2", &["./index.html", "./gone.js"]), &source)
            .await;

        assert!(failed.is_err());
        assert_eq!(cache.generations().unwrap(), vec!["v1".to_string()]);
        assert_eq!(cache.lookup("./index.html").unwrap().unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_serve_is_cache_first() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[("./app.js", b"js")]);

        cache
            .install(&manifest("v1", &["./app.js"]), &source)
            .await
            .unwrap();
        let installs = source.hits("./app.js");

        let body = cache.serve("./app.js", &source).await.unwrap();
        assert_eq!(body, b"js");
        // A cached asset never reaches the source again.
        assert_eq!(source.hits("./app.js"), installs);
    }

    #[tokio::test]
    async fn test_uncached_request_passes_through() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[("./api/data", b"fresh")]);

        let body = cache.serve("./api/data", &source).await.unwrap();
        assert_eq!(body, b"fresh");
        assert_eq!(source.hits("./api/data"), 1);
    }

    #[tokio::test]
    async fn test_passthrough_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[]);

        let result = cache.serve("./nowhere", &source).await;
        assert!(matches!(result, Err(CacheError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_activate_removes_stale_generations() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path());
        let source = MapSource::new(&[("./index.html", b"<html>")]);

        for version in ["v1", "v2", "v3"] {
            cache
                .install(&manifest(version, &["./index.html"]), &source)
                .await
                .unwrap();
        }
        cache.activate("v3").unwrap();

        assert_eq!(cache.generations().unwrap(), vec!["v3".to_string()]);
        assert!(cache.lookup("./index.html").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_activate_on_missing_root_is_noop() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path().join("never-created"));
        cache.activate("v1").unwrap();
        assert!(cache.generations().unwrap().is_empty());
    }
}

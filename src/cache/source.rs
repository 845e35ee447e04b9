//! Where assets come from when they are not cached.

use anyhow::Context;
use std::path::PathBuf;

/// The upstream the cache mirrors and passes through to.
///
/// Fetching is the only suspension point in the cache lifecycle; whatever
/// timeout behavior the underlying transport has applies unchanged.
pub trait AssetSource {
    fn fetch(&self, path: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>>;
}

/// An asset source backed by a local directory (the deployed origin).
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let relative = path.trim_start_matches("./").trim_start_matches('/');
        if relative.is_empty() {
            anyhow::bail!("asset path {path:?} does not name a file");
        }
        let file = self.root.join(relative);
        std::fs::read(&file).with_context(|| format!("failed to fetch asset {path:?}"))
    }
}

//! The external contract of the offline cache: one version string plus the
//! asset paths to mirror.

use serde::{Deserialize, Serialize};

/// A named cache generation and the assets it must contain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Generation identity. Bumping this invalidates everything cached under
    /// previous versions once the new generation is activated.
    pub version: String,
    /// Asset paths to fetch and mirror, exactly as requested later.
    pub assets: Vec<String>,
}

impl CacheManifest {
    pub fn new(version: impl Into<String>, assets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            version: version.into(),
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }
}

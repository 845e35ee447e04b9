//! Versioned offline asset cache.
//!
//! Mirrors a fixed manifest of assets from an [`AssetSource`] into named
//! cache generations and serves them cache-first: a cached body is returned
//! without touching the source, anything else passes through unchanged.
//! Bumping the manifest version is the only invalidation mechanism.

mod manifest;
mod source;
mod store;

pub use manifest::CacheManifest;
pub use source::{AssetSource, DirSource};
pub use store::{CacheError, OfflineCache};

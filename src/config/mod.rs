//! Configuration loading.
//!
//! A single optional TOML file under the platform config directory. Every
//! field has a default, so a missing file yields a fully working setup.

use crate::cache::CacheManifest;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Haptic pulse strength passed to the feedback channel; 0 disables it.
    pub haptic_strength: u32,
    /// Override for the history log location.
    pub history_path: Option<PathBuf>,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Current cache generation name. Bump on asset changes.
    pub version: String,
    /// Asset paths mirrored at install time.
    pub assets: Vec<String>,
    /// Override for the cache storage root.
    pub root: Option<PathBuf>,
    /// Directory the assets are fetched from (the deployed origin).
    pub origin: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            haptic_strength: 0,
            history_path: None,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "calc-offline-v1".to_string(),
            assets: vec![
                "./index.html".to_string(),
                "./style.css".to_string(),
                "./script.js".to_string(),
                "./manifest.json".to_string(),
            ],
            root: None,
            origin: None,
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qcalc").join("config.toml"))
    }

    /// Load from the default location; a missing file is the default config.
    pub fn load() -> anyhow::Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The manifest that drives the offline cache lifecycle.
    pub fn cache_manifest(&self) -> CacheManifest {
        CacheManifest::new(self.cache.version.as_str(), self.cache.assets.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.haptic_strength, 0);
        let manifest = config.cache_manifest();
        assert_eq!(manifest.version, "calc-offline-v1");
        assert!(!manifest.assets.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            haptic_strength = 30

            [cache]
            version = "calc-offline-v2"
            "#,
        )
        .unwrap();
        assert_eq!(config.haptic_strength, 30);
        assert_eq!(config.cache.version, "calc-offline-v2");
        // Unspecified sections keep their defaults.
        assert_eq!(config.cache.assets.len(), 4);
        assert!(config.history_path.is_none());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<Config>("scientific_mode = true").is_err());
    }
}

//! Asset loading boundary.
//!
//! The compositor only knows the [`AssetLoader`] contract: resolve an opaque
//! identifier to a loaded asset, asynchronously and fallibly. Loaders never
//! touch compositor state; completion validation (generation tokens) is the
//! caller's job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::AssetsConfig;
use crate::error::AssetError;

/// Raw bytes of a resolved asset, ready to hand to the render backend
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    /// Identifier the asset was resolved from
    pub identifier: String,
    /// Undecoded model bytes
    pub data: Vec<u8>,
}

/// Resolves an asset identifier to a loaded asset.
///
/// Must be safely callable concurrently for different identifiers.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, identifier: &str) -> Result<LoadedAsset, AssetError>;
}

/// Loads model files from a directory on disk.
///
/// The directory is scanned once at construction; each file whose extension is
/// listed in the configuration is indexed under its stem.
#[derive(Debug)]
pub struct FileAssetLoader {
    base_dir: PathBuf,
    extensions: Vec<String>,
    assets: HashMap<String, PathBuf>,
}

impl FileAssetLoader {
    pub fn new(config: &AssetsConfig) -> Self {
        let base_dir = if config.dir.is_absolute() {
            config.dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&config.dir)
        };

        let mut loader = Self {
            base_dir,
            extensions: config.extensions.clone(),
            assets: HashMap::new(),
        };

        loader.scan_assets();
        loader
    }

    /// Scan the assets directory and cache available model files
    fn scan_assets(&mut self) {
        if !self.base_dir.exists() {
            tracing::warn!(
                "Assets directory does not exist: {}",
                self.base_dir.display()
            );
            return;
        }

        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read assets directory: {}", e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !self
                .extensions
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(extension))
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tracing::debug!("Indexed asset: {} -> {}", stem, path.display());
                self.assets.insert(stem.to_string(), path);
            }
        }

        tracing::info!(
            "Indexed {} assets from {}",
            self.assets.len(),
            self.base_dir.display()
        );
    }

    /// Identifiers this loader can resolve
    pub fn known_identifiers(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(|s| s.as_str())
    }

    pub fn has_asset(&self, identifier: &str) -> bool {
        self.assets.contains_key(identifier)
    }

    pub fn get_path(&self, identifier: &str) -> Option<&Path> {
        self.assets.get(identifier).map(|p| p.as_path())
    }

    /// Re-scan the assets directory
    pub fn reload(&mut self) {
        self.assets.clear();
        self.scan_assets();
    }
}

#[async_trait]
impl AssetLoader for FileAssetLoader {
    async fn load(&self, identifier: &str) -> Result<LoadedAsset, AssetError> {
        let path = self
            .assets
            .get(identifier)
            .ok_or_else(|| AssetError::NotFound(identifier.to_string()))?;

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AssetError::Decode(format!("{}: {}", path.display(), e)))?;

        if data.is_empty() {
            return Err(AssetError::Decode(format!(
                "{}: empty model file",
                path.display()
            )));
        }

        Ok(LoadedAsset {
            identifier: identifier.to_string(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_assets() -> (TempDir, AssetsConfig) {
        let dir = TempDir::new().unwrap();

        std::fs::write(dir.path().join("femalemodel.usdz"), b"model bytes").unwrap();
        std::fs::write(dir.path().join("blueshirt.usdz"), b"model bytes").unwrap();
        std::fs::write(dir.path().join("empty.usdz"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let mut config = AssetsConfig::default();
        config.dir = dir.path().to_path_buf();

        (dir, config)
    }

    #[test]
    fn test_scan_indexes_model_files_only() {
        let (_dir, config) = create_test_assets();
        let loader = FileAssetLoader::new(&config);

        assert!(loader.has_asset("femalemodel"));
        assert!(loader.has_asset("blueshirt"));
        assert!(!loader.has_asset("notes"));
    }

    #[tokio::test]
    async fn test_load_reads_bytes() {
        let (_dir, config) = create_test_assets();
        let loader = FileAssetLoader::new(&config);

        let asset = loader.load("blueshirt").await.unwrap();
        assert_eq!(asset.identifier, "blueshirt");
        assert_eq!(asset.data, b"model bytes");
    }

    #[tokio::test]
    async fn test_load_unknown_identifier() {
        let (_dir, config) = create_test_assets();
        let loader = FileAssetLoader::new(&config);

        let err = loader.load("missing").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_empty_file_is_decode_error() {
        let (_dir, config) = create_test_assets();
        let loader = FileAssetLoader::new(&config);

        let err = loader.load("empty").await.unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn test_missing_directory_indexes_nothing() {
        let mut config = AssetsConfig::default();
        config.dir = PathBuf::from("/definitely/not/here");
        let loader = FileAssetLoader::new(&config);

        assert_eq!(loader.known_identifiers().count(), 0);
    }
}

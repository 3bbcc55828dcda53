//! Avatar and garment catalog.
//!
//! Each avatar identifier has a fixed canonical scale/position installed on
//! switch; per-identifier constants live in a lookup table built from
//! configuration, not in branching code. The garment side is a plain
//! identifier -> display-name listing for the control surface.

use std::collections::HashMap;

use glam::Vec3;

use crate::config::CatalogConfig;

/// Canonical placement for an avatar identifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalTransform {
    pub scale: Vec3,
    pub position: Vec3,
}

impl CanonicalTransform {
    /// Baseline vertical position the pinch gesture offsets from
    pub fn baseline_y(&self) -> f32 {
        self.position.y
    }
}

impl Default for CanonicalTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            position: Vec3::ZERO,
        }
    }
}

/// Lookup tables for known avatars and garments
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    avatars: HashMap<String, CanonicalTransform>,
    garments: HashMap<String, String>,
}

impl Catalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        let avatars = config
            .avatars
            .iter()
            .map(|(id, defaults)| {
                (
                    id.clone(),
                    CanonicalTransform {
                        scale: Vec3::from_array(defaults.scale),
                        position: Vec3::from_array(defaults.position),
                    },
                )
            })
            .collect();

        Self {
            avatars,
            garments: config.garments.clone(),
        }
    }

    /// Canonical transform for an avatar identifier
    pub fn canonical(&self, identifier: &str) -> Option<&CanonicalTransform> {
        self.avatars.get(identifier)
    }

    pub fn is_known_avatar(&self, identifier: &str) -> bool {
        self.avatars.contains_key(identifier)
    }

    pub fn is_known_garment(&self, identifier: &str) -> bool {
        self.garments.contains_key(identifier)
    }

    pub fn garment_name(&self, identifier: &str) -> Option<&str> {
        self.garments.get(identifier).map(|s| s.as_str())
    }

    pub fn avatar_identifiers(&self) -> impl Iterator<Item = &str> {
        self.avatars.keys().map(|s| s.as_str())
    }

    pub fn garment_identifiers(&self) -> impl Iterator<Item = &str> {
        self.garments.keys().map(|s| s.as_str())
    }

    /// Catalog entries with no backing asset.
    ///
    /// Run at startup against the loader's known identifiers; callers log the
    /// result rather than abort, since assets may be provisioned later.
    pub fn missing_assets<'a>(
        &self,
        known: impl Iterator<Item = &'a str>,
    ) -> Vec<String> {
        let known: std::collections::HashSet<&str> = known.collect();
        let mut missing: Vec<String> = self
            .avatars
            .keys()
            .chain(self.garments.keys())
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect();
        missing.sort();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_default_config() {
        let catalog = Catalog::from_config(&CatalogConfig::default());

        let canonical = catalog.canonical("femalemodel").unwrap();
        assert_eq!(canonical.scale, Vec3::splat(0.011));
        assert_eq!(canonical.baseline_y(), -80.0);

        assert!(catalog.is_known_garment("blueshirt"));
        assert_eq!(catalog.garment_name("dress2"), Some("Long Dress"));
        assert!(catalog.canonical("unknown").is_none());
    }

    #[test]
    fn test_missing_assets() {
        let catalog = Catalog::from_config(&CatalogConfig::default());

        let known = ["femalemodel", "malemodel", "blueshirt"];
        let missing = catalog.missing_assets(known.into_iter());

        assert!(!missing.contains(&"femalemodel".to_string()));
        assert!(missing.contains(&"dress2".to_string()));
    }

    #[test]
    fn test_all_assets_present() {
        let catalog = Catalog::from_config(&CatalogConfig::default());
        let known: Vec<String> = catalog
            .avatar_identifiers()
            .chain(catalog.garment_identifiers())
            .map(String::from)
            .collect();

        let missing = catalog.missing_assets(known.iter().map(String::as_str));
        assert!(missing.is_empty());
    }
}

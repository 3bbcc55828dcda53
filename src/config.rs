//! Configuration parsing and management for StyleSync

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, StyleSyncError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gestures: GestureConfig,
    pub sliders: SliderConfig,
    pub catalog: CatalogConfig,
    pub assets: AssetsConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StyleSyncError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, StyleSyncError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, StyleSyncError> {
        // Try config paths in order
        let paths = [
            PathBuf::from("stylesync.toml"),
            PathBuf::from("config/default.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StyleSyncError> {
        if self.gestures.pinch_scale_min <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "gestures.pinch_scale_min".to_string(),
                message: "Pinch scale minimum must be greater than 0".to_string(),
            }
            .into());
        }

        if self.gestures.pinch_scale_min >= self.gestures.pinch_scale_max {
            return Err(ConfigError::InvalidValue {
                field: "gestures.pinch_scale_max".to_string(),
                message: "Pinch scale range is empty".to_string(),
            }
            .into());
        }

        if self.gestures.depth_min >= self.gestures.depth_max {
            return Err(ConfigError::InvalidValue {
                field: "gestures.depth_max".to_string(),
                message: "Depth range is empty".to_string(),
            }
            .into());
        }

        for (field, range) in [
            ("sliders.offset_x", &self.sliders.offset_x),
            ("sliders.offset_y", &self.sliders.offset_y),
            ("sliders.offset_z", &self.sliders.offset_z),
            ("sliders.tilt", &self.sliders.tilt),
            ("sliders.pitch", &self.sliders.pitch),
            ("sliders.scale", &self.sliders.scale),
            ("sliders.height", &self.sliders.height),
            ("sliders.weight", &self.sliders.weight),
        ] {
            if range.min > range.max {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Range [{}, {}] is empty", range.min, range.max),
                }
                .into());
            }
        }

        // The shipped pitch range is asymmetric while tilt's is symmetric; the
        // bounds are configuration, not contract, so surface it but accept it.
        let pitch = &self.sliders.pitch;
        if (pitch.min + pitch.max).abs() > f32::EPSILON {
            tracing::warn!(
                "sliders.pitch range [{}, {}] is asymmetric; verify this is intentional",
                pitch.min,
                pitch.max
            );
        }

        if !self.assets.dir.as_os_str().is_empty() && !self.assets.dir.exists() {
            tracing::warn!(
                "Assets directory does not exist: {}",
                self.assets.dir.display()
            );
        }

        if self.http.enabled && self.http.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// An inclusive clamp range for a slider or gesture channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp a value into this range
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Gesture sensitivity and clamp tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Yaw radians per horizontal drag point
    pub rotation_sensitivity: f32,
    /// Garment offset units per drag point (x/y plane)
    pub drag_sensitivity: f32,
    /// Garment depth units per vertical drag point (two-finger, dominant axis)
    pub drag_depth_sensitivity: f32,
    /// Minimum cumulative pinch scale
    pub pinch_scale_min: f32,
    /// Maximum cumulative pinch scale
    pub pinch_scale_max: f32,
    /// Nearest actor depth (z position)
    pub depth_min: f32,
    /// Farthest actor depth (z position)
    pub depth_max: f32,
    /// Depth change per unit of relative pinch growth
    pub depth_gain: f32,
    /// Vertical offset per unit of cumulative pinch growth
    pub vertical_gain: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            rotation_sensitivity: 0.01,
            drag_sensitivity: 0.5,
            drag_depth_sensitivity: 0.5,
            pinch_scale_min: 0.5,
            pinch_scale_max: 3.0,
            depth_min: -200.0,
            depth_max: 100.0,
            depth_gain: 60.0,
            vertical_gain: 40.0,
        }
    }
}

/// Clamp ranges for the manual transform sliders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    pub offset_x: Range,
    pub offset_y: Range,
    pub offset_z: Range,
    pub tilt: Range,
    pub pitch: Range,
    pub scale: Range,
    pub height: Range,
    pub weight: Range,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            offset_x: Range::new(-100.0, 200.0),
            offset_y: Range::new(-100.0, 300.0),
            offset_z: Range::new(-200.0, 200.0),
            tilt: Range::new(-0.8, 0.8),
            pitch: Range::new(-0.9, 9.8),
            scale: Range::new(0.1, 200.0),
            height: Range::new(0.5, 2.0),
            weight: Range::new(0.5, 2.0),
        }
    }
}

/// Canonical placement for one avatar identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarDefaults {
    /// Canonical per-axis scale applied on install
    pub scale: [f32; 3],
    /// Canonical position applied on install
    pub position: [f32; 3],
}

impl Default for AvatarDefaults {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// Known avatars and garments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Avatar identifier -> canonical transform defaults
    pub avatars: HashMap<String, AvatarDefaults>,
    /// Garment identifier -> display name
    pub garments: HashMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut avatars = HashMap::new();
        avatars.insert(
            "femalemodel".to_string(),
            AvatarDefaults {
                scale: [0.011, 0.011, 0.011],
                position: [0.0, -80.0, -60.0],
            },
        );
        avatars.insert(
            "malemodel".to_string(),
            AvatarDefaults {
                scale: [0.013, 0.013, 0.013],
                position: [0.0, -95.0, -60.0],
            },
        );

        let mut garments = HashMap::new();
        for (id, name) in [
            ("blueshirt", "Blue Shirt"),
            ("pantsdenim", "Denim Pants"),
            ("shirt1", "Casual Shirt"),
            ("tealshirt", "Teal Shirt"),
            ("Tommy_Hilfiger_Jacket", "Tommy Hilfiger Jacket"),
            ("bluedress1", "Blue Dress"),
            ("dress2", "Long Dress"),
        ] {
            garments.insert(id.to_string(), name.to_string());
        }

        Self { avatars, garments }
    }
}

/// Asset directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Base directory holding model files
    pub dir: PathBuf,
    /// File extensions probed when resolving an identifier
    pub extensions: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            extensions: vec!["usdz".to_string(), "glb".to_string(), "gltf".to_string()],
        }
    }
}

/// HTTP control surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [gestures]
            pinch_scale_max = 4.0

            [http]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.gestures.pinch_scale_max, 4.0);
        assert_eq!(config.http.port, 9000);
        // Untouched sections keep their defaults
        assert_eq!(config.sliders.tilt.max, 0.8);
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut config = Config::default();
        config.sliders.scale = Range::new(5.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_pinch_range_rejected() {
        let mut config = Config::default();
        config.gestures.pinch_scale_min = 3.0;
        config.gestures.pinch_scale_max = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_range_clamp() {
        let range = Range::new(-0.8, 0.8);
        assert_eq!(range.clamp(2.0), 0.8);
        assert_eq!(range.clamp(-2.0), -0.8);
        assert_eq!(range.clamp(0.3), 0.3);
    }

    #[test]
    fn test_default_catalog_entries() {
        let config = Config::default();
        assert!(config.catalog.avatars.contains_key("femalemodel"));
        assert_eq!(
            config.catalog.garments.get("blueshirt").map(String::as_str),
            Some("Blue Shirt")
        );
    }
}

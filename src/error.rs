//! Error types for StyleSync

use thiserror::Error;

/// Main error type for StyleSync
#[derive(Error, Debug)]
pub enum StyleSyncError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asset-loading errors returned by loader implementations
#[derive(Error, Debug, Clone)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to decode asset: {0}")]
    Decode(String),
}

/// Scene compositor errors
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Unknown avatar identifier: {0}")]
    UnknownAvatar(String),

    #[error("Unknown garment identifier: {0}")]
    UnknownGarment(String),

    #[error("Failed to build texture: {0}")]
    TextureBuild(String),

    #[error("No actor is loaded")]
    NoActor,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),
}

/// Result type alias for StyleSync operations
pub type Result<T> = std::result::Result<T, StyleSyncError>;

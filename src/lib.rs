//! StyleSync - Virtual Try-On Compositor Service
//!
//! The engine core of a virtual try-on application:
//! - Loads body and garment models asynchronously, with generation tokens
//!   guaranteeing rapid avatar switches never display a stale or duplicated
//!   load
//! - Maps touch gestures (drag, pinch, rotate) and sliders onto live actor
//!   and garment transforms
//! - Drives any rendering engine through a small primitive boundary, with an
//!   in-memory scene graph built in
//! - Exposes the whole inbound surface over HTTP with an SSE scene stream

pub mod assets;
pub mod config;
pub mod error;
pub mod render;
pub mod scene;
pub mod service;
pub mod web;

pub use config::Config;
pub use error::{Result, StyleSyncError};
pub use scene::{SceneCompositor, SceneSnapshot};
pub use service::CompositorHandle;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

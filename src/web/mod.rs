//! HTTP control surface
//!
//! Thin inbound adapter over the compositor handle: every endpoint forwards
//! to the service loop, which remains the single owner of scene state.

pub mod api;
pub mod routes;
pub mod sse;

use crate::scene::Catalog;
use crate::service::CompositorHandle;

pub use routes::create_router;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct ApiState {
    pub handle: CompositorHandle,
    pub catalog: Catalog,
}

impl ApiState {
    pub fn new(handle: CompositorHandle, catalog: Catalog) -> Self {
        Self { handle, catalog }
    }
}

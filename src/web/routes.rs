//! Route definitions for the HTTP control surface

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;

use super::{api, sse, ApiState};

/// Create the main router with all routes
pub fn create_router(state: ApiState, config: &HttpConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Observation
        .route("/api/status", get(api::get_status))
        .route("/api/scene", get(api::get_scene))
        .route("/api/catalog", get(api::get_catalog))
        .route("/api/stream", get(sse::scene_stream))
        // Actor and garment lifecycle
        .route("/api/actor", post(api::switch_actor))
        .route("/api/garment", post(api::set_garment))
        .route("/api/garment", delete(api::clear_garment))
        .route("/api/reset", post(api::reset))
        // Gesture input
        .route("/api/gesture/begin", post(api::begin_gesture))
        .route("/api/gesture/end", post(api::end_gesture))
        .route("/api/gesture/pan", post(api::pan))
        .route("/api/gesture/pinch", post(api::pinch))
        .route("/api/gesture/rotate", post(api::rotate))
        // Sliders
        .route("/api/garment/offset", post(api::set_garment_offset))
        .route("/api/garment/scale", post(api::set_garment_scale))
        .route("/api/garment/tilt", post(api::set_garment_tilt))
        .route("/api/garment/pitch", post(api::set_garment_pitch))
        .route("/api/actor/height", post(api::set_actor_height))
        .route("/api/actor/weight", post(api::set_actor_weight))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

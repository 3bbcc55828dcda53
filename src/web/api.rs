//! REST API endpoints

use axum::{extract::State, response::IntoResponse, Json};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::scene::Axis;

use super::ApiState;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        })
    }

    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
        })
    }
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub actor: Option<String>,
    pub actor_state: String,
    pub garment: Option<String>,
    pub garment_state: String,
    pub generation: u64,
    pub version: String,
}

/// Get current status
pub async fn get_status(State(state): State<ApiState>) -> impl IntoResponse {
    match state.handle.snapshot().await {
        Some(snapshot) => ApiResponse::success(StatusResponse {
            actor: snapshot.actor.identifier,
            actor_state: snapshot.actor.state,
            garment: snapshot.garment.identifier,
            garment_state: snapshot.garment.state,
            generation: snapshot.generation,
            version: crate::VERSION.to_string(),
        })
        .into_response(),
        None => ApiResponse::error("compositor unavailable").into_response(),
    }
}

/// Get the full committed scene snapshot
pub async fn get_scene(State(state): State<ApiState>) -> impl IntoResponse {
    match state.handle.snapshot().await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => ApiResponse::error("compositor unavailable").into_response(),
    }
}

/// Catalog listing: known avatars and garments
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub avatars: Vec<String>,
    pub garments: Vec<GarmentEntry>,
}

#[derive(Debug, Serialize)]
pub struct GarmentEntry {
    pub identifier: String,
    pub name: String,
}

pub async fn get_catalog(State(state): State<ApiState>) -> impl IntoResponse {
    let mut avatars: Vec<String> = state
        .catalog
        .avatar_identifiers()
        .map(String::from)
        .collect();
    avatars.sort();

    let mut garments: Vec<GarmentEntry> = state
        .catalog
        .garment_identifiers()
        .map(|id| GarmentEntry {
            identifier: id.to_string(),
            name: state.catalog.garment_name(id).unwrap_or(id).to_string(),
        })
        .collect();
    garments.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    ApiResponse::success(CatalogResponse { avatars, garments })
}

#[derive(Debug, Deserialize)]
pub struct SwitchActorRequest {
    pub identifier: String,
}

pub async fn switch_actor(
    State(state): State<ApiState>,
    Json(request): Json<SwitchActorRequest>,
) -> impl IntoResponse {
    state.handle.switch_actor(request.identifier).await;
    ApiResponse::<()>::ok()
}

#[derive(Debug, Deserialize)]
pub struct SetGarmentRequest {
    pub identifier: String,
    /// Optional base64-encoded image applied to the garment material
    #[serde(default)]
    pub texture: Option<String>,
}

pub async fn set_garment(
    State(state): State<ApiState>,
    Json(request): Json<SetGarmentRequest>,
) -> impl IntoResponse {
    let texture = match request.texture {
        Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(&encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                return ApiResponse::error(&format!("invalid texture encoding: {}", e))
                    .into_response();
            }
        },
        None => None,
    };

    state.handle.set_garment(request.identifier, texture).await;
    ApiResponse::<()>::ok().into_response()
}

pub async fn clear_garment(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.clear_garment().await;
    ApiResponse::<()>::ok()
}

pub async fn reset(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.reset().await;
    ApiResponse::<()>::ok()
}

#[derive(Debug, Deserialize)]
pub struct PanRequest {
    pub dx: f32,
    pub dy: f32,
    #[serde(default = "default_touch_count")]
    pub touch_count: u32,
}

fn default_touch_count() -> u32 {
    1
}

pub async fn pan(
    State(state): State<ApiState>,
    Json(request): Json<PanRequest>,
) -> impl IntoResponse {
    state
        .handle
        .pan(request.dx, request.dy, request.touch_count)
        .await;
    ApiResponse::<()>::ok()
}

#[derive(Debug, Deserialize)]
pub struct PinchRequest {
    pub factor: f32,
}

pub async fn pinch(
    State(state): State<ApiState>,
    Json(request): Json<PinchRequest>,
) -> impl IntoResponse {
    state.handle.pinch(request.factor).await;
    ApiResponse::<()>::ok()
}

#[derive(Debug, Deserialize)]
pub struct RotateRequest {
    pub delta: f32,
}

pub async fn rotate(
    State(state): State<ApiState>,
    Json(request): Json<RotateRequest>,
) -> impl IntoResponse {
    state.handle.rotate(request.delta).await;
    ApiResponse::<()>::ok()
}

pub async fn begin_gesture(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.begin_gesture().await;
    ApiResponse::<()>::ok()
}

pub async fn end_gesture(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.end_gesture().await;
    ApiResponse::<()>::ok()
}

#[derive(Debug, Deserialize)]
pub struct OffsetRequest {
    pub axis: Axis,
    pub value: f32,
}

pub async fn set_garment_offset(
    State(state): State<ApiState>,
    Json(request): Json<OffsetRequest>,
) -> impl IntoResponse {
    state
        .handle
        .set_garment_offset(request.axis, request.value)
        .await;
    ApiResponse::<()>::ok()
}

#[derive(Debug, Deserialize)]
pub struct ValueRequest {
    pub value: f32,
}

pub async fn set_garment_scale(
    State(state): State<ApiState>,
    Json(request): Json<ValueRequest>,
) -> impl IntoResponse {
    state.handle.set_garment_scale(request.value).await;
    ApiResponse::<()>::ok()
}

pub async fn set_garment_tilt(
    State(state): State<ApiState>,
    Json(request): Json<ValueRequest>,
) -> impl IntoResponse {
    state.handle.set_garment_tilt(request.value).await;
    ApiResponse::<()>::ok()
}

pub async fn set_garment_pitch(
    State(state): State<ApiState>,
    Json(request): Json<ValueRequest>,
) -> impl IntoResponse {
    state.handle.set_garment_pitch(request.value).await;
    ApiResponse::<()>::ok()
}

pub async fn set_actor_height(
    State(state): State<ApiState>,
    Json(request): Json<ValueRequest>,
) -> impl IntoResponse {
    state.handle.set_actor_height(request.value).await;
    ApiResponse::<()>::ok()
}

pub async fn set_actor_weight(
    State(state): State<ApiState>,
    Json(request): Json<ValueRequest>,
) -> impl IntoResponse {
    state.handle.set_actor_weight(request.value).await;
    ApiResponse::<()>::ok()
}

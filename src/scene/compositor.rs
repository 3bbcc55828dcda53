//! Scene compositor: actor/garment slot state machines, generation-token
//! validation of async load completions, and application of gesture and
//! slider input to the transform state.
//!
//! The compositor is synchronous and single-owner; the async service loop in
//! [`crate::service`] is the only caller. Mutations that need an asset load
//! return a [`LoadRequest`] for the service to spawn — completions come back
//! through `on_actor_loaded` / `on_garment_loaded`, tagged with the generation
//! the request was issued under.

use glam::{Quat, Vec3};
use serde::Serialize;

use super::catalog::Catalog;
use super::gesture::{self, PanTarget};
use super::transform::{ActorTransform, Axis, GarmentTransform, GestureAccumulator};
use crate::assets::LoadedAsset;
use crate::config::{GestureConfig, SliderConfig};
use crate::error::AssetError;
use crate::render::{EntityId, Material, RenderBackend, TextureImage};

/// Monotonically increasing switch-request token
pub type Generation = u64;

/// Load lifecycle of a scene slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading(Generation),
    Loaded,
    Failed,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading(_) => "loading",
            LoadState::Loaded => "ready",
            LoadState::Failed => "failed",
        }
    }
}

/// Which scene slot a load belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Actor,
    Garment,
}

/// An asset load the service must spawn on behalf of the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub slot: SlotKind,
    pub identifier: String,
    pub generation: Generation,
}

/// Committed scene state published to external observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub generation: Generation,
    pub actor: ActorSnapshot,
    pub garment: GarmentSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSnapshot {
    pub identifier: Option<String>,
    pub state: String,
    pub transform: ActorTransform,
    pub height: f32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GarmentSnapshot {
    pub identifier: Option<String>,
    pub state: String,
    pub transform: GarmentTransform,
    pub textured: bool,
}

#[derive(Debug)]
struct ActorSlot {
    identifier: Option<String>,
    state: LoadState,
    entity: Option<EntityId>,
    transform: ActorTransform,
    /// Canonical per-axis scale from the catalog, fixed per identifier
    canonical_scale: Vec3,
    /// Baseline y the pinch vertical offset is added to
    baseline_y: f32,
    /// Committed cumulative pinch factor
    pinch_scale: f32,
    height: f32,
    weight: f32,
}

impl ActorSlot {
    fn new() -> Self {
        Self {
            identifier: None,
            state: LoadState::Unloaded,
            entity: None,
            transform: ActorTransform::default(),
            canonical_scale: Vec3::ONE,
            baseline_y: 0.0,
            pinch_scale: 1.0,
            height: 1.0,
            weight: 1.0,
        }
    }
}

#[derive(Debug)]
struct GarmentSlot {
    identifier: Option<String>,
    state: LoadState,
    entity: Option<EntityId>,
    transform: GarmentTransform,
    texture_override: Option<Vec<u8>>,
}

impl GarmentSlot {
    fn new() -> Self {
        Self {
            identifier: None,
            state: LoadState::Unloaded,
            entity: None,
            transform: GarmentTransform::default(),
            texture_override: None,
        }
    }
}

/// Owns the actor and garment slots and every mutation applied to them
pub struct SceneCompositor {
    backend: Box<dyn RenderBackend>,
    catalog: Catalog,
    gestures: GestureConfig,
    sliders: SliderConfig,
    generation: Generation,
    anchor: EntityId,
    actor: ActorSlot,
    garment: GarmentSlot,
    accumulator: Option<GestureAccumulator>,
}

impl SceneCompositor {
    pub fn new(
        backend: Box<dyn RenderBackend>,
        catalog: Catalog,
        gestures: GestureConfig,
        sliders: SliderConfig,
    ) -> Self {
        let anchor = backend.create_anchor();
        Self {
            backend,
            catalog,
            gestures,
            sliders,
            generation: 0,
            anchor,
            actor: ActorSlot::new(),
            garment: GarmentSlot::new(),
            accumulator: None,
        }
    }

    // --- Actor / garment lifecycle -------------------------------------

    /// Request a switch to a new actor.
    ///
    /// Detaches the garment entity (keeping its identifier so it re-attaches
    /// once the new actor installs), bumps the generation, and returns the
    /// load for the service to spawn. The previous actor stays displayed
    /// until the new one installs.
    pub fn switch_actor(&mut self, identifier: &str) -> LoadRequest {
        if let Some(entity) = self.garment.entity.take() {
            self.backend.detach(entity);
        }
        self.garment.state = LoadState::Unloaded;

        self.generation += 1;
        let generation = self.generation;

        self.actor.identifier = Some(identifier.to_string());
        self.actor.state = LoadState::Loading(generation);

        tracing::info!("Switching actor to '{}' (generation {})", identifier, generation);

        LoadRequest {
            slot: SlotKind::Actor,
            identifier: identifier.to_string(),
            generation,
        }
    }

    /// Handle an actor load completion.
    ///
    /// A result tagged with a superseded generation is discarded silently;
    /// that is the expected outcome of a rapid switch, not a failure.
    pub fn on_actor_loaded(
        &mut self,
        identifier: &str,
        generation: Generation,
        result: Result<LoadedAsset, AssetError>,
    ) -> Option<LoadRequest> {
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale actor load '{}' (generation {} superseded by {})",
                identifier,
                generation,
                self.generation
            );
            return None;
        }

        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!("Actor load failed for '{}': {}", identifier, e);
                self.actor.state = LoadState::Failed;
                return None;
            }
        };

        // Replace the displayed actor
        if let Some(old) = self.actor.entity.take() {
            self.backend.detach(old);
        }
        let entity = self.backend.instantiate(&asset);
        self.backend.attach_child(self.anchor, entity);

        let canonical = match self.catalog.canonical(identifier) {
            Some(canonical) => *canonical,
            None => {
                tracing::warn!("No catalog entry for avatar '{}', using defaults", identifier);
                Default::default()
            }
        };

        self.actor.entity = Some(entity);
        self.actor.state = LoadState::Loaded;
        self.actor.canonical_scale = canonical.scale;
        self.actor.baseline_y = canonical.baseline_y();
        self.actor.pinch_scale = 1.0;
        self.actor.height = 1.0;
        self.actor.weight = 1.0;
        self.actor.transform = ActorTransform {
            scale: canonical.scale,
            position: canonical.position,
            rotation: Quat::IDENTITY,
        };
        self.accumulator = None;

        // Garment transform resets with the actor; its identifier survives so
        // the garment re-attaches to the new body.
        self.garment.transform = GarmentTransform::default();

        self.push_actor();
        tracing::info!("Actor '{}' installed (generation {})", identifier, generation);

        let pending = self.garment.identifier.clone()?;
        self.garment.state = LoadState::Loading(self.generation);
        Some(LoadRequest {
            slot: SlotKind::Garment,
            identifier: pending,
            generation: self.generation,
        })
    }

    /// Request a garment attach.
    ///
    /// While the actor is not ready the request is queued and issued as part
    /// of the actor install; otherwise the load is tagged with the actor's
    /// current generation and returned for the service to spawn.
    pub fn set_garment(
        &mut self,
        identifier: &str,
        texture_override: Option<Vec<u8>>,
    ) -> Option<LoadRequest> {
        self.garment.identifier = Some(identifier.to_string());
        self.garment.texture_override = texture_override;

        if self.actor.state != LoadState::Loaded {
            tracing::info!("Garment '{}' queued until an actor is ready", identifier);
            self.garment.state = LoadState::Unloaded;
            return None;
        }

        self.garment.state = LoadState::Loading(self.generation);
        tracing::info!("Loading garment '{}' (generation {})", identifier, self.generation);

        Some(LoadRequest {
            slot: SlotKind::Garment,
            identifier: identifier.to_string(),
            generation: self.generation,
        })
    }

    /// Handle a garment load completion
    pub fn on_garment_loaded(
        &mut self,
        identifier: &str,
        generation: Generation,
        result: Result<LoadedAsset, AssetError>,
    ) {
        let current = self.garment.identifier.as_deref();
        if generation != self.generation
            || self.actor.state != LoadState::Loaded
            || current != Some(identifier)
        {
            tracing::debug!(
                "Discarding stale garment load '{}' (generation {})",
                identifier,
                generation
            );
            return;
        }

        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!("Garment load failed for '{}': {}", identifier, e);
                if let Some(entity) = self.garment.entity.take() {
                    self.backend.detach(entity);
                }
                self.garment.state = LoadState::Failed;
                return;
            }
        };

        let Some(actor_entity) = self.actor.entity else {
            return;
        };

        if let Some(old) = self.garment.entity.take() {
            self.backend.detach(old);
        }
        let entity = self.backend.instantiate(&asset);
        self.backend.attach_child(actor_entity, entity);

        // Texture replacement is best-effort: a bad image keeps the asset's
        // own material and the attach proceeds.
        if let Some(bytes) = &self.garment.texture_override {
            match TextureImage::from_bytes(bytes) {
                Ok(texture) => self.backend.set_material(entity, Material::Texture(texture)),
                Err(e) => {
                    tracing::warn!("Texture build failed for '{}', using default material: {}", identifier, e);
                }
            }
        }

        self.garment.entity = Some(entity);
        self.garment.state = LoadState::Loaded;
        self.push_garment();
        tracing::info!("Garment '{}' attached (generation {})", identifier, generation);
    }

    /// Detach the garment immediately; no load involved
    pub fn clear_garment(&mut self) {
        if let Some(entity) = self.garment.entity.take() {
            self.backend.detach(entity);
        }
        self.garment.identifier = None;
        self.garment.texture_override = None;
        self.garment.state = LoadState::Unloaded;
        tracing::info!("Garment cleared");
    }

    /// Reset garment transform and actor body multipliers; no reloads
    pub fn reset(&mut self) {
        self.garment.transform = GarmentTransform::default();
        self.actor.height = 1.0;
        self.actor.weight = 1.0;
        self.refresh_actor_scale();
        self.push_actor();
        self.push_garment();
        tracing::info!("Transforms reset to defaults");
    }

    // --- Gesture input -------------------------------------------------

    /// Start a gesture session
    pub fn begin_gesture(&mut self) {
        self.accumulator = Some(GestureAccumulator::new(
            self.actor.pinch_scale,
            self.actor.transform.position.z,
        ));
    }

    /// End the gesture session: fold the accumulator into the transform
    /// state and recenter the actor horizontally
    pub fn end_gesture(&mut self) {
        if let Some(acc) = self.accumulator.take() {
            self.actor.pinch_scale = acc.current_scale;
        }
        self.actor.transform.position.x = 0.0;
        self.push_actor();
    }

    /// Pan tick. One finger rotates the actor; two or more move the garment.
    pub fn on_pan(&mut self, dx: f32, dy: f32, touch_count: u32) {
        match gesture::map_pan(dx, dy, touch_count, &self.gestures) {
            PanTarget::ActorYaw(rotation) => {
                self.actor.transform.rotation = self.actor.transform.rotation * rotation;
                self.push_actor();
            }
            PanTarget::GarmentOffset(delta) => {
                self.garment.transform.add_offset(delta, &self.sliders);
                self.push_garment();
            }
        }
    }

    /// Pinch tick: cumulative scale and depth, both clamped
    pub fn on_pinch(&mut self, factor: f32) {
        let pinch_scale = self.actor.pinch_scale;
        let depth = self.actor.transform.position.z;
        let acc = self
            .accumulator
            .get_or_insert_with(|| GestureAccumulator::new(pinch_scale, depth));

        let step = gesture::apply_pinch(acc, factor, &self.gestures);
        let current_scale = acc.current_scale;

        self.actor.transform.position.z = step.depth;
        self.actor.transform.position.y =
            self.actor.baseline_y + gesture::vertical_offset(current_scale, &self.gestures);
        self.refresh_actor_scale();
        self.push_actor();
    }

    /// Rotation-gesture tick: roll about the forward axis
    pub fn on_rotate(&mut self, delta: f32) {
        self.actor.transform.rotation =
            self.actor.transform.rotation * gesture::roll_from_rotation(delta);
        self.push_actor();
    }

    // --- Slider input --------------------------------------------------

    pub fn set_garment_offset(&mut self, axis: Axis, value: f32) {
        self.garment.transform.set_offset(axis, value, &self.sliders);
        self.push_garment();
    }

    pub fn set_garment_scale(&mut self, value: f32) {
        self.garment.transform.set_scale(value, &self.sliders);
        self.push_garment();
    }

    pub fn set_garment_tilt(&mut self, value: f32) {
        self.garment.transform.set_tilt(value, &self.sliders);
        self.push_garment();
    }

    pub fn set_garment_pitch(&mut self, value: f32) {
        self.garment.transform.set_pitch(value, &self.sliders);
        self.push_garment();
    }

    pub fn set_actor_height(&mut self, value: f32) {
        self.actor.height = self.sliders.height.clamp(value);
        self.refresh_actor_scale();
        self.push_actor();
    }

    pub fn set_actor_weight(&mut self, value: f32) {
        self.actor.weight = self.sliders.weight.clamp(value);
        self.refresh_actor_scale();
        self.push_actor();
    }

    // --- Observation ---------------------------------------------------

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            generation: self.generation,
            actor: ActorSnapshot {
                identifier: self.actor.identifier.clone(),
                state: self.actor.state.as_str().to_string(),
                transform: self.actor.transform,
                height: self.actor.height,
                weight: self.actor.weight,
            },
            garment: GarmentSnapshot {
                identifier: self.garment.identifier.clone(),
                state: self.garment.state.as_str().to_string(),
                transform: self.garment.transform,
                textured: self.garment.texture_override.is_some(),
            },
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn actor_state(&self) -> LoadState {
        self.actor.state
    }

    pub fn garment_state(&self) -> LoadState {
        self.garment.state
    }

    pub fn actor_identifier(&self) -> Option<&str> {
        self.actor.identifier.as_deref()
    }

    pub fn garment_identifier(&self) -> Option<&str> {
        self.garment.identifier.as_deref()
    }

    pub fn actor_transform(&self) -> &ActorTransform {
        &self.actor.transform
    }

    pub fn garment_transform(&self) -> &GarmentTransform {
        &self.garment.transform
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // --- Internal ------------------------------------------------------

    /// Effective cumulative pinch factor: the live accumulator during a
    /// gesture, the committed value otherwise
    fn effective_pinch(&self) -> f32 {
        self.accumulator
            .map(|acc| acc.current_scale)
            .unwrap_or(self.actor.pinch_scale)
    }

    fn refresh_actor_scale(&mut self) {
        let pinch = self.effective_pinch();
        self.actor.transform.scale = self.actor.canonical_scale
            * pinch
            * Vec3::new(self.actor.weight, self.actor.height, self.actor.weight);
    }

    fn push_actor(&self) {
        if let Some(entity) = self.actor.entity {
            self.backend.set_transform(
                entity,
                self.actor.transform.scale,
                self.actor.transform.position,
                self.actor.transform.rotation,
            );
        }
    }

    fn push_garment(&self) {
        if let Some(entity) = self.garment.entity {
            self.backend.set_transform(
                entity,
                Vec3::splat(self.garment.transform.scale),
                self.garment.transform.offset,
                self.garment.transform.rotation(),
            );
        }
    }
}

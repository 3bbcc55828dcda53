//! Rendering engine boundary.
//!
//! The compositor drives the scene through the [`RenderBackend`] trait and
//! never talks to a GPU directly. [`HeadlessBackend`] is the in-memory
//! implementation used by the service by default and by tests to observe the
//! committed scene graph.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use glam::{Quat, Vec3};

use crate::assets::LoadedAsset;
use crate::error::SceneError;

/// Handle to an entity in the render scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u64);

/// Decoded texture image (RGBA8)
#[derive(Clone)]
pub struct TextureImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureImage {
    /// Decode an encoded image buffer into RGBA8
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SceneError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| SceneError::TextureBuild(e.to_string()))?
            .to_rgba8();

        let (width, height) = decoded.dimensions();
        Ok(Self {
            pixels: decoded.into_raw(),
            width,
            height,
        })
    }
}

impl std::fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Material assigned to an entity
#[derive(Debug, Clone, Default)]
pub enum Material {
    /// The material baked into the asset
    #[default]
    Default,
    /// Asset material with the texture replaced
    Texture(TextureImage),
}

impl Material {
    pub fn is_textured(&self) -> bool {
        matches!(self, Material::Texture(_))
    }
}

/// Primitive operations the compositor needs from a rendering engine.
///
/// Implementations must be callable from the compositor's service task; all
/// methods take `&self` and synchronize internally.
pub trait RenderBackend: Send + Sync {
    /// Create an empty anchor entity at the scene root
    fn create_anchor(&self) -> EntityId;

    /// Create an entity from a loaded asset, initially unparented
    fn instantiate(&self, asset: &LoadedAsset) -> EntityId;

    /// Attach `child` under `parent`
    fn attach_child(&self, parent: EntityId, child: EntityId);

    /// Remove an entity and its descendants from the scene
    fn detach(&self, entity: EntityId);

    /// Set an entity's local transform
    fn set_transform(&self, entity: EntityId, scale: Vec3, position: Vec3, rotation: Quat);

    /// Replace an entity's material
    fn set_material(&self, entity: EntityId, material: Material);
}

#[derive(Debug, Clone)]
struct Node {
    /// Asset identifier this entity was instantiated from (None for anchors)
    source: Option<String>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    scale: Vec3,
    position: Vec3,
    rotation: Quat,
    material: Material,
}

impl Node {
    fn new(source: Option<String>) -> Self {
        Self {
            source,
            parent: None,
            children: Vec::new(),
            scale: Vec3::ONE,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            material: Material::Default,
        }
    }
}

#[derive(Debug, Default)]
struct Graph {
    nodes: HashMap<EntityId, Node>,
    next_id: u64,
}

impl Graph {
    fn insert(&mut self, node: Node) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn remove_subtree(&mut self, entity: EntityId) {
        if let Some(node) = self.nodes.remove(&entity) {
            if let Some(parent) = node.parent {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|c| *c != entity);
                }
            }
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

/// In-memory scene graph implementing [`RenderBackend`].
///
/// Cloning shares the underlying graph, so a test can keep a handle while the
/// compositor owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    graph: Arc<Mutex<Graph>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of live entities (anchors included)
    pub fn entity_count(&self) -> usize {
        self.graph.lock().unwrap().nodes.len()
    }

    /// Entities instantiated from the given asset identifier
    pub fn entities_from_asset(&self, identifier: &str) -> Vec<EntityId> {
        let graph = self.graph.lock().unwrap();
        let mut ids: Vec<EntityId> = graph
            .nodes
            .iter()
            .filter(|(_, node)| node.source.as_deref() == Some(identifier))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    pub fn parent_of(&self, entity: EntityId) -> Option<EntityId> {
        self.graph.lock().unwrap().nodes.get(&entity)?.parent
    }

    pub fn children_of(&self, entity: EntityId) -> Vec<EntityId> {
        self.graph
            .lock()
            .unwrap()
            .nodes
            .get(&entity)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// (scale, position, rotation) of an entity, if it exists
    pub fn transform_of(&self, entity: EntityId) -> Option<(Vec3, Vec3, Quat)> {
        let graph = self.graph.lock().unwrap();
        let node = graph.nodes.get(&entity)?;
        Some((node.scale, node.position, node.rotation))
    }

    pub fn material_of(&self, entity: EntityId) -> Option<Material> {
        self.graph
            .lock()
            .unwrap()
            .nodes
            .get(&entity)
            .map(|n| n.material.clone())
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.graph.lock().unwrap().nodes.contains_key(&entity)
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_anchor(&self) -> EntityId {
        self.graph.lock().unwrap().insert(Node::new(None))
    }

    fn instantiate(&self, asset: &LoadedAsset) -> EntityId {
        self.graph
            .lock()
            .unwrap()
            .insert(Node::new(Some(asset.identifier.clone())))
    }

    fn attach_child(&self, parent: EntityId, child: EntityId) {
        let mut graph = self.graph.lock().unwrap();
        if !graph.nodes.contains_key(&parent) {
            return;
        }
        if let Some(child_node) = graph.nodes.get_mut(&child) {
            let old_parent = child_node.parent.replace(parent);
            if let Some(old) = old_parent {
                if let Some(old_node) = graph.nodes.get_mut(&old) {
                    old_node.children.retain(|c| *c != child);
                }
            }
            if let Some(parent_node) = graph.nodes.get_mut(&parent) {
                parent_node.children.push(child);
            }
        }
    }

    fn detach(&self, entity: EntityId) {
        self.graph.lock().unwrap().remove_subtree(entity);
    }

    fn set_transform(&self, entity: EntityId, scale: Vec3, position: Vec3, rotation: Quat) {
        let mut graph = self.graph.lock().unwrap();
        if let Some(node) = graph.nodes.get_mut(&entity) {
            node.scale = scale;
            node.position = position;
            node.rotation = rotation;
        }
    }

    fn set_material(&self, entity: EntityId, material: Material) {
        let mut graph = self.graph.lock().unwrap();
        if let Some(node) = graph.nodes.get_mut(&entity) {
            node.material = material;
        }
    }
}

//! Scene compositor module
//!
//! Owns the actor/garment slots, the transform state, and the
//! gesture-to-transform mapping.

pub mod catalog;
pub mod compositor;
pub mod gesture;
pub mod transform;

pub use catalog::{Catalog, CanonicalTransform};
pub use compositor::{
    Generation, LoadRequest, LoadState, SceneCompositor, SceneSnapshot, SlotKind,
};
pub use transform::{ActorTransform, Axis, GarmentTransform, GestureAccumulator};

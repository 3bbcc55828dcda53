//! Authoritative transform state for the actor and the garment.
//!
//! Gestures and sliders are two producers of the same values; everything here
//! is plain data with clamped setters, mutated only by the scene compositor.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::SliderConfig;

/// Axis selector for the garment offset sliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Live transform of the displayed actor entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorTransform {
    pub scale: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for ActorTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Live transform of the attached garment entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarmentTransform {
    pub offset: Vec3,
    pub scale: f32,
    pub tilt: f32,
    pub pitch: f32,
}

impl Default for GarmentTransform {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            scale: 1.0,
            tilt: 0.0,
            pitch: 0.0,
        }
    }
}

impl GarmentTransform {
    /// Set one offset component, clamped to its configured range
    pub fn set_offset(&mut self, axis: Axis, value: f32, ranges: &SliderConfig) {
        match axis {
            Axis::X => self.offset.x = ranges.offset_x.clamp(value),
            Axis::Y => self.offset.y = ranges.offset_y.clamp(value),
            Axis::Z => self.offset.z = ranges.offset_z.clamp(value),
        }
    }

    /// Add a gesture delta to the offset, clamping each touched component
    pub fn add_offset(&mut self, delta: Vec3, ranges: &SliderConfig) {
        if delta.x != 0.0 {
            self.offset.x = ranges.offset_x.clamp(self.offset.x + delta.x);
        }
        if delta.y != 0.0 {
            self.offset.y = ranges.offset_y.clamp(self.offset.y + delta.y);
        }
        if delta.z != 0.0 {
            self.offset.z = ranges.offset_z.clamp(self.offset.z + delta.z);
        }
    }

    pub fn set_scale(&mut self, value: f32, ranges: &SliderConfig) {
        self.scale = ranges.scale.clamp(value);
    }

    pub fn set_tilt(&mut self, value: f32, ranges: &SliderConfig) {
        self.tilt = ranges.tilt.clamp(value);
    }

    pub fn set_pitch(&mut self, value: f32, ranges: &SliderConfig) {
        self.pitch = ranges.pitch.clamp(value);
    }

    /// Rotation composed from the pitch and tilt angles
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch) * Quat::from_rotation_z(self.tilt)
    }
}

/// Per-gesture-session pinch state.
///
/// Created at gesture start, updated on every pinch tick, folded into the
/// transform state when the gesture ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureAccumulator {
    /// Cumulative pinch factor
    pub current_scale: f32,
    /// Actor depth derived from the pinch
    pub current_depth: f32,
}

impl GestureAccumulator {
    pub fn new(current_scale: f32, current_depth: f32) -> Self {
        Self {
            current_scale,
            current_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garment_defaults() {
        let transform = GarmentTransform::default();
        assert_eq!(transform.offset, Vec3::ZERO);
        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.tilt, 0.0);
        assert_eq!(transform.pitch, 0.0);
    }

    #[test]
    fn test_offset_setter_clamps() {
        let ranges = SliderConfig::default();
        let mut transform = GarmentTransform::default();

        transform.set_offset(Axis::Y, 500.0, &ranges);
        assert_eq!(transform.offset.y, 300.0);

        transform.set_offset(Axis::X, -500.0, &ranges);
        assert_eq!(transform.offset.x, -100.0);

        transform.set_offset(Axis::Z, 50.0, &ranges);
        assert_eq!(transform.offset.z, 50.0);
    }

    #[test]
    fn test_angle_setters_clamp() {
        let ranges = SliderConfig::default();
        let mut transform = GarmentTransform::default();

        transform.set_tilt(-3.0, &ranges);
        assert_eq!(transform.tilt, -0.8);

        transform.set_pitch(20.0, &ranges);
        assert_eq!(transform.pitch, 9.8);

        transform.set_scale(0.0, &ranges);
        assert_eq!(transform.scale, 0.1);
    }

    #[test]
    fn test_add_offset_clamps_per_component() {
        let ranges = SliderConfig::default();
        let mut transform = GarmentTransform::default();
        transform.offset.y = 290.0;

        transform.add_offset(Vec3::new(5.0, 50.0, 0.0), &ranges);
        assert_eq!(transform.offset.x, 5.0);
        assert_eq!(transform.offset.y, 300.0);
    }

    #[test]
    fn test_rotation_identity_at_defaults() {
        let transform = GarmentTransform::default();
        assert_eq!(transform.rotation(), Quat::IDENTITY);
    }
}

//! Gesture-to-transform mapping.
//!
//! Pure functions from raw gesture deltas to transform deltas. The only state
//! involved is the per-session [`GestureAccumulator`] passed in by the caller;
//! sensitivities and clamp ranges come from [`GestureConfig`].

use glam::{Quat, Vec3};

use super::transform::GestureAccumulator;
use crate::config::GestureConfig;

/// What a pan gesture maps to, decided by touch-point count
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanTarget {
    /// One finger: rotate the actor about the vertical axis
    ActorYaw(Quat),
    /// Two or more fingers: move the garment
    GarmentOffset(Vec3),
}

/// Map a pan tick to either actor yaw or garment offset.
///
/// Touch-point count is the sole discriminator. Two-finger drags use a
/// dominant-axis policy: a mostly-vertical drag moves the garment in depth,
/// anything else moves it in the x/y plane.
pub fn map_pan(dx: f32, dy: f32, touch_count: u32, config: &GestureConfig) -> PanTarget {
    if touch_count >= 2 {
        let delta = if dy.abs() > dx.abs() {
            Vec3::new(0.0, 0.0, -dy * config.drag_depth_sensitivity)
        } else {
            Vec3::new(
                dx * config.drag_sensitivity,
                -dy * config.drag_sensitivity,
                0.0,
            )
        };
        PanTarget::GarmentOffset(delta)
    } else {
        PanTarget::ActorYaw(yaw_from_drag(dx, config))
    }
}

/// Yaw rotation for a horizontal drag delta. Unclamped; full rotation range.
pub fn yaw_from_drag(dx: f32, config: &GestureConfig) -> Quat {
    Quat::from_axis_angle(Vec3::Y, dx * config.rotation_sensitivity)
}

/// Roll rotation for a rotation-gesture delta
pub fn roll_from_rotation(delta: f32) -> Quat {
    Quat::from_axis_angle(Vec3::Z, delta)
}

/// Result of one pinch tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchStep {
    /// Growth relative to the previous tick; multiply the visual scale by this
    pub relative: f32,
    /// New cumulative scale after clamping
    pub scale: f32,
    /// New depth after clamping
    pub depth: f32,
}

/// Apply one pinch factor to the accumulator.
///
/// The cumulative scale is clamped first; the relative growth is derived from
/// the clamped value, so repeated pinches saturate at the bounds instead of
/// overshooting. Depth moves against the relative growth and clamps
/// independently.
pub fn apply_pinch(
    acc: &mut GestureAccumulator,
    factor: f32,
    config: &GestureConfig,
) -> PinchStep {
    let new_scale = (acc.current_scale * factor)
        .clamp(config.pinch_scale_min, config.pinch_scale_max);
    let relative = new_scale / acc.current_scale;

    acc.current_scale = new_scale;
    acc.current_depth = (acc.current_depth - (relative - 1.0) * config.depth_gain)
        .clamp(config.depth_min, config.depth_max);

    PinchStep {
        relative,
        scale: acc.current_scale,
        depth: acc.current_depth,
    }
}

/// Vertical offset added to the actor's baseline y for a cumulative scale
pub fn vertical_offset(current_scale: f32, config: &GestureConfig) -> f32 {
    (current_scale - 1.0) * config.vertical_gain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GestureConfig {
        GestureConfig::default()
    }

    #[test]
    fn test_one_finger_pan_is_yaw() {
        let target = map_pan(10.0, 0.0, 1, &config());
        match target {
            PanTarget::ActorYaw(q) => {
                let (axis, angle) = q.to_axis_angle();
                assert!((axis - Vec3::Y).length() < 1e-6);
                assert!((angle - 0.1).abs() < 1e-6);
            }
            PanTarget::GarmentOffset(_) => panic!("one-finger pan must target the actor"),
        }
    }

    #[test]
    fn test_two_finger_vertical_pan_moves_depth() {
        let target = map_pan(5.0, 40.0, 2, &config());
        match target {
            PanTarget::GarmentOffset(delta) => {
                assert_eq!(delta.x, 0.0);
                assert_eq!(delta.y, 0.0);
                assert_eq!(delta.z, -20.0);
            }
            PanTarget::ActorYaw(_) => panic!("two-finger pan must target the garment"),
        }
    }

    #[test]
    fn test_two_finger_horizontal_pan_moves_plane() {
        let target = map_pan(40.0, 5.0, 2, &config());
        match target {
            PanTarget::GarmentOffset(delta) => {
                assert_eq!(delta.x, 20.0);
                assert_eq!(delta.y, -2.5);
                assert_eq!(delta.z, 0.0);
            }
            PanTarget::ActorYaw(_) => panic!("two-finger pan must target the garment"),
        }
    }

    #[test]
    fn test_pinch_clamps_cumulative_scale() {
        let cfg = config();
        let mut acc = GestureAccumulator::new(1.0, 0.0);

        let step = apply_pinch(&mut acc, 2.0, &cfg);
        assert_eq!(step.scale, 2.0);
        assert_eq!(step.relative, 2.0);

        // Second doubling would reach 4.0; the configured max is 3.0
        let step = apply_pinch(&mut acc, 2.0, &cfg);
        assert_eq!(step.scale, 3.0);
        assert!((step.relative - 1.5).abs() < 1e-6);
        assert_eq!(acc.current_scale, 3.0);
    }

    #[test]
    fn test_pinch_clamps_at_minimum() {
        let cfg = config();
        let mut acc = GestureAccumulator::new(1.0, 0.0);

        for _ in 0..10 {
            apply_pinch(&mut acc, 0.5, &cfg);
        }
        assert_eq!(acc.current_scale, cfg.pinch_scale_min);
    }

    #[test]
    fn test_depth_stays_in_range() {
        let cfg = config();
        let mut acc = GestureAccumulator::new(1.0, 0.0);

        for _ in 0..50 {
            apply_pinch(&mut acc, 1.5, &cfg);
            assert!(acc.current_depth >= cfg.depth_min);
            assert!(acc.current_depth <= cfg.depth_max);
        }
        for _ in 0..50 {
            apply_pinch(&mut acc, 0.6, &cfg);
            assert!(acc.current_depth >= cfg.depth_min);
            assert!(acc.current_depth <= cfg.depth_max);
        }
    }

    #[test]
    fn test_saturated_pinch_leaves_depth_unchanged() {
        let cfg = config();
        let mut acc = GestureAccumulator::new(cfg.pinch_scale_max, -50.0);

        let step = apply_pinch(&mut acc, 2.0, &cfg);
        assert_eq!(step.relative, 1.0);
        assert_eq!(acc.current_depth, -50.0);
    }

    #[test]
    fn test_roll_axis_is_forward() {
        let (axis, angle) = roll_from_rotation(0.25).to_axis_angle();
        assert!((axis - Vec3::Z).length() < 1e-6);
        assert!((angle - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_offset_is_zero_at_unit_scale() {
        assert_eq!(vertical_offset(1.0, &config()), 0.0);
        assert_eq!(vertical_offset(1.5, &config()), 20.0);
    }
}

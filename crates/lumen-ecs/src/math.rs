//! Scalar helpers shared by the kinematic components.

use glam::Vec2;

/// Magnitudes at or below this value are treated as exactly zero.
pub const NEAR_ZERO_EPSILON: f32 = 0.001;

/// `true` if `value` is within [`NEAR_ZERO_EPSILON`] of zero.
#[inline]
pub fn near_zero(value: f32) -> bool {
    near_zero_within(value, NEAR_ZERO_EPSILON)
}

/// `true` if `value` is within `epsilon` of zero.
#[inline]
pub fn near_zero_within(value: f32, epsilon: f32) -> bool {
    value.abs() <= epsilon
}

/// Angle (radians, counter-clockwise from +X) of a 2D direction.
#[inline]
pub fn heading_angle(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x)
}

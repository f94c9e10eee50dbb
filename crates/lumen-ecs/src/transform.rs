//! Actor spatial state and its cached world matrix.
//!
//! Every setter marks the transform dirty; [`Transform::recompute`] rebuilds
//! the matrix (scale, then rotate, then translate) only when something
//! changed. 2D games use the x/y plane and rotate about +Z, with the
//! `*_2d` helpers converting between angles and quaternions.

use glam::{Mat4, Quat, Vec2, Vec3};

/// Position, uniform scale and orientation of an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    scale: f32,
    rotation: Quat,
    world: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: 1.0,
            rotation: Quat::IDENTITY,
            world: Mat4::IDENTITY,
            dirty: true,
        }
    }
}

impl Transform {
    /// Identity transform, flagged for recomputation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The x/y components of the position.
    pub fn position_2d(&self) -> Vec2 {
        self.position.truncate()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Set x/y, keeping the current z.
    pub fn set_position_2d(&mut self, position: Vec2) {
        self.set_position(position.extend(self.position.z));
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Negative scales are clamped to zero.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.max(0.0);
        self.dirty = true;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Heading about +Z in radians, derived from the forward axis.
    pub fn rotation_2d(&self) -> f32 {
        let forward = self.forward();
        forward.y.atan2(forward.x)
    }

    pub fn set_rotation_2d(&mut self, angle: f32) {
        self.set_rotation(Quat::from_rotation_z(angle));
    }

    /// +X rotated by the orientation.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn forward_2d(&self) -> Vec2 {
        self.forward().truncate()
    }

    /// +Y rotated by the orientation (the strafe axis).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The cached world matrix. Stale while [`is_dirty`](Self::is_dirty).
    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the world matrix if dirty. Returns `true` if it was rebuilt.
    pub fn recompute(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.world = Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.position,
        );
        true
    }
}

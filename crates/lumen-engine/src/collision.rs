//! Circle overlap tests.
//!
//! A [`CircleComponent`] stores only a base radius. Its [`Circle`] is built
//! from the owner's transform when asked for, so it always reflects the
//! current position and scale.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lumen_ecs::actor::Actor;
use lumen_ecs::component::Component;
use lumen_ecs::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// `true` if the circles touch or overlap.
pub fn intersect(a: &Circle, b: &Circle) -> bool {
    let radii = a.radius + b.radius;
    a.center.distance_squared(b.center) <= radii * radii
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleComponent {
    radius: f32,
}

impl CircleComponent {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn base_radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Base radius times the owner's scale.
    pub fn radius(&self, owner: &Transform) -> f32 {
        self.radius * owner.scale()
    }

    pub fn circle(&self, owner: &Transform) -> Circle {
        Circle::new(owner.position_2d(), self.radius(owner))
    }
}

impl Component for CircleComponent {}

/// The circle of `actor`'s first [`CircleComponent`], if it has one.
pub fn actor_circle(actor: &Actor) -> Option<Circle> {
    actor
        .component::<CircleComponent>()
        .map(|c| c.circle(actor.transform()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_circles_intersect() {
        let a = Circle::new(Vec2::ZERO, 1.0);
        let b = Circle::new(Vec2::new(3.0, 0.0), 2.0);
        let c = Circle::new(Vec2::new(3.1, 0.0), 2.0);
        assert!(intersect(&a, &b));
        assert!(!intersect(&a, &c));
        assert!(intersect(&a, &a));
    }

    #[test]
    fn radius_scales_with_owner() {
        let mut owner = Transform::new();
        owner.set_position_2d(Vec2::new(5.0, 5.0));
        owner.set_scale(1.5);
        let circle = CircleComponent::new(40.0).circle(&owner);
        assert_eq!(circle, Circle::new(Vec2::new(5.0, 5.0), 60.0));
    }
}

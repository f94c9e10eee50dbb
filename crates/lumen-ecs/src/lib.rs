//! Lumen ECS -- actors, components and the frame scheduler.
//!
//! An [`Actor`](actor::Actor) owns a transform, a lifecycle state, a list of
//! [`Component`](component::Component)s sorted by update order, and an
//! optional [`ActorBehavior`](actor::ActorBehavior). The
//! [`World`](world::World) owns every actor, defers actors spawned while it
//! is iterating, and destroys dead actors only after the iteration is over.
//! Actors are addressed by generational [`EntityId`](entity::EntityId)s, so a
//! destroyed actor's id fails every later lookup.
//!
//! # Quick Start
//!
//! ```
//! use lumen_ecs::prelude::*;
//! use glam::Vec2;
//!
//! struct Drift;
//!
//! impl ActorBehavior for Drift {
//!     fn update_actor(&mut self, actor: &mut Actor, _world: &mut World, dt: f32) {
//!         let p = actor.transform().position_2d();
//!         actor.transform_mut().set_position_2d(p + Vec2::new(10.0 * dt, 0.0));
//!     }
//! }
//!
//! let mut world = World::new();
//! let id = world.spawn_with_behavior(Drift);
//! world.update(0.5);
//! assert_eq!(world.get(id).unwrap().transform().position_2d(), Vec2::new(5.0, 0.0));
//! ```

#![deny(unsafe_code)]

pub mod actor;
pub mod component;
pub mod draw;
pub mod entity;
pub mod input;
pub mod math;
pub mod sorted;
pub mod transform;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by actor and component lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The id was destroyed or never allocated.
    #[error("actor {0:?} does not exist (stale or never allocated)")]
    StaleEntity(entity::EntityId),

    /// The actor is out of its slot because its own hooks are running.
    #[error("actor {0:?} is checked out by the running frame")]
    ActorCheckedOut(entity::EntityId),

    #[error("actor {entity:?} has no component {component}")]
    ComponentNotFound {
        entity: entity::EntityId,
        component: component::ComponentId,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::actor::{Actor, ActorBehavior, ActorContext, ActorState};
    pub use crate::component::{AsAny, Component, ComponentId, DEFAULT_UPDATE_ORDER};
    pub use crate::draw::{AssetId, DrawOrder, Drawable, RenderTarget};
    pub use crate::entity::EntityId;
    pub use crate::input::{ButtonState, InputState, Key};
    pub use crate::math::{near_zero, near_zero_within};
    pub use crate::transform::Transform;
    pub use crate::world::{HousekeepingReport, World};
    pub use crate::EcsError;
}

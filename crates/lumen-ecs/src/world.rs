//! The world: actor storage, the live/pending registries and the per-frame
//! housekeeping sweep.
//!
//! # Frame structure
//!
//! ```text
//! process_input(input)   every live actor, in live-list order
//! update_actors(dt)      every live actor, in live-list order
//! housekeeping()         promote pending -> live, destroy Dead actors
//! render(target)         optional, walks the draw list
//! ```
//!
//! While the live list is being iterated the world is *updating*: actors
//! spawned in that window go to the pending list and are neither visited nor
//! moved until housekeeping. Actors marked `Dead` stay in place until
//! housekeeping destroys them, after the iteration has finished.
//!
//! Each actor is *checked out* of its slot while its own hooks run, so that
//! those hooks can borrow the rest of the world mutably. Looking up a
//! checked-out actor reports [`EcsError::ActorCheckedOut`]; a
//! [`set_state`](World::set_state) aimed at it is deferred until it is
//! checked back in.
//!
//! # Example
//!
//! ```
//! use lumen_ecs::prelude::*;
//!
//! struct Fuse { remaining: f32 }
//!
//! impl ActorBehavior for Fuse {
//!     fn update_actor(&mut self, actor: &mut Actor, _world: &mut World, dt: f32) {
//!         self.remaining -= dt;
//!         if self.remaining <= 0.0 {
//!             actor.set_state(ActorState::Dead);
//!         }
//!     }
//! }
//!
//! let mut world = World::new();
//! let fuse = world.spawn_with_behavior(Fuse { remaining: 0.05 });
//! assert_eq!(world.update(0.03).destroyed, 0);
//! assert_eq!(world.update(0.03).destroyed, 1);
//! assert!(world.get(fuse).is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorBehavior, ActorState};
use crate::component::{Component, ComponentId};
use crate::draw::{DrawList, RenderTarget};
use crate::entity::{EntityAllocator, EntityId};
use crate::input::InputState;
use crate::EcsError;

// ---------------------------------------------------------------------------
// HousekeepingReport
// ---------------------------------------------------------------------------

/// What the last [`World::housekeeping`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingReport {
    /// Pending actors moved into the live list.
    pub promoted: usize,
    /// Dead actors destroyed.
    pub destroyed: usize,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Owns every actor and steps them once per frame.
pub struct World {
    allocator: EntityAllocator,
    /// Indexed by `EntityId::index`. `None` while free or checked out.
    slots: Vec<Option<Actor>>,
    live: Vec<EntityId>,
    pending: Vec<EntityId>,
    updating: bool,
    deferred_states: Vec<(EntityId, ActorState)>,
    draw_list: DrawList,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("live", &self.live)
            .field("pending", &self.pending)
            .field("updating", &self.updating)
            .field("drawables", &self.draw_list.len())
            .finish()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            slots: Vec::new(),
            live: Vec::new(),
            pending: Vec::new(),
            updating: false,
            deferred_states: Vec::new(),
            draw_list: DrawList::new(),
        }
    }

    // -- spawning -----------------------------------------------------------

    /// Create an actor with no behavior and register it.
    pub fn spawn(&mut self) -> EntityId {
        self.spawn_actor(None)
    }

    /// Create an actor driven by `behavior` and register it.
    pub fn spawn_with_behavior(&mut self, behavior: impl ActorBehavior) -> EntityId {
        self.spawn_actor(Some(Box::new(behavior)))
    }

    fn spawn_actor(&mut self, behavior: Option<Box<dyn ActorBehavior>>) -> EntityId {
        let id = self.allocator.allocate();
        let index = id.index() as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(Actor::new(id, behavior));
        self.register(id);
        id
    }

    fn register(&mut self, id: EntityId) {
        if self.updating {
            tracing::trace!(entity = %id, "spawned mid-frame, queued as pending");
            self.pending.push(id);
        } else {
            self.live.push(id);
        }
    }

    fn unregister(&mut self, id: EntityId) {
        if let Some(index) = self.pending.iter().position(|&p| p == id) {
            self.pending.remove(index);
        } else if let Some(index) = self.live.iter().position(|&l| l == id) {
            self.live.swap_remove(index);
        }
    }

    // -- lookup -------------------------------------------------------------

    fn check(&self, id: EntityId) -> Result<(), EcsError> {
        if self.allocator.is_alive(id) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(id))
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    pub fn get(&self, id: EntityId) -> Result<&Actor, EcsError> {
        self.check(id)?;
        self.slots
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(EcsError::ActorCheckedOut(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Actor, EcsError> {
        self.check(id)?;
        self.slots
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(EcsError::ActorCheckedOut(id))
    }

    /// Current lifecycle state of `id`, if it can be looked up.
    pub fn state(&self, id: EntityId) -> Result<ActorState, EcsError> {
        self.get(id).map(Actor::state)
    }

    /// Request a lifecycle change. Safe to call mid-frame: if the target is
    /// the actor currently running its hooks, the change lands when its
    /// hooks return.
    pub fn set_state(&mut self, id: EntityId, state: ActorState) -> Result<(), EcsError> {
        match self.get_mut(id) {
            Ok(actor) => {
                actor.set_state(state);
                Ok(())
            }
            Err(EcsError::ActorCheckedOut(_)) => {
                self.deferred_states.push((id, state));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Take the actor out of its slot for the duration of `f`.
    pub fn with_actor<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut Actor, &mut World) -> R,
    ) -> Result<R, EcsError> {
        let mut actor = self.checkout(id)?;
        let result = f(&mut actor, self);
        self.checkin(actor);
        Ok(result)
    }

    /// Attach a component to the actor `id`.
    pub fn add_component<C: Component>(
        &mut self,
        id: EntityId,
        component: C,
    ) -> Result<ComponentId, EcsError> {
        self.with_actor(id, |actor, world| actor.add_component(world, component))
    }

    /// Detach and drop a component of the actor `id`.
    pub fn remove_component(&mut self, id: EntityId, component: ComponentId) -> Result<(), EcsError> {
        self.with_actor(id, |actor, world| actor.remove_component(world, component))?
            .map(drop)
    }

    fn checkout(&mut self, id: EntityId) -> Result<Actor, EcsError> {
        self.check(id)?;
        self.slots
            .get_mut(id.index() as usize)
            .and_then(Option::take)
            .ok_or(EcsError::ActorCheckedOut(id))
    }

    fn checkin(&mut self, mut actor: Actor) {
        let id = actor.id();
        if !self.deferred_states.is_empty() {
            self.deferred_states.retain(|&(target, state)| {
                if target == id {
                    actor.set_state(state);
                    false
                } else {
                    true
                }
            });
        }
        if let Some(slot) = self.slots.get_mut(id.index() as usize) {
            *slot = Some(actor);
        }
    }

    /// Every stored actor: live ones first, then pending ones. Checked-out
    /// actors are skipped.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.live
            .iter()
            .chain(self.pending.iter())
            .filter_map(move |&id| self.slots.get(id.index() as usize)?.as_ref())
    }

    pub fn live_ids(&self) -> &[EntityId] {
        &self.live
    }

    pub fn pending_ids(&self) -> &[EntityId] {
        &self.pending
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of actors that exist, live or pending.
    pub fn actor_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// `true` while the live list is being iterated.
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    pub fn draw_list_mut(&mut self) -> &mut DrawList {
        &mut self.draw_list
    }

    // -- per-frame ----------------------------------------------------------

    /// Input phase: hand the snapshot to every live actor.
    pub fn process_input(&mut self, input: &InputState) {
        self.updating = true;
        for i in 0..self.live.len() {
            let id = self.live[i];
            if let Ok(mut actor) = self.checkout(id) {
                actor.process_input(self, input);
                self.checkin(actor);
            }
        }
        self.updating = false;
    }

    /// Update phase: run one frame of logic on every live actor.
    pub fn update_actors(&mut self, dt: f32) {
        self.updating = true;
        for i in 0..self.live.len() {
            let id = self.live[i];
            if let Ok(mut actor) = self.checkout(id) {
                actor.update(self, dt);
                self.checkin(actor);
            }
        }
        self.updating = false;
    }

    /// Promote pending actors, then destroy every dead live actor.
    pub fn housekeeping(&mut self) -> HousekeepingReport {
        debug_assert!(!self.updating, "housekeeping during iteration");
        let pending = std::mem::take(&mut self.pending);
        let promoted = pending.len();
        for id in pending {
            if let Ok(actor) = self.get_mut(id) {
                actor.compute_world_transform();
            }
            self.live.push(id);
        }

        let dead: Vec<EntityId> = self
            .live
            .iter()
            .copied()
            .filter(|&id| self.state(id) == Ok(ActorState::Dead))
            .collect();
        for &id in &dead {
            self.destroy(id);
        }

        HousekeepingReport {
            promoted,
            destroyed: dead.len(),
        }
    }

    /// Update phase followed by housekeeping.
    pub fn update(&mut self, dt: f32) -> HousekeepingReport {
        self.update_actors(dt);
        self.housekeeping()
    }

    /// Tear down an actor's components, unregister it and retire its id.
    fn destroy(&mut self, id: EntityId) {
        let Ok(mut actor) = self.checkout(id) else {
            return;
        };
        actor.teardown(self);
        self.unregister(id);
        self.allocator.deallocate(id);
        self.deferred_states.retain(|&(target, _)| target != id);
        tracing::debug!(entity = %id, "destroyed actor");
    }

    /// Draw every registered drawable in draw order.
    pub fn render(&self, target: &mut dyn RenderTarget) {
        for entry in self.draw_list.iter() {
            let Ok(actor) = self.get(entry.owner) else {
                continue;
            };
            let drawable = actor
                .component_by_id(entry.component)
                .and_then(|c| c.as_drawable());
            if let Some(drawable) = drawable {
                drawable.draw(actor.transform(), target);
            }
        }
    }

    /// Destroy every actor, live and pending.
    pub fn shutdown(&mut self) {
        assert!(!self.updating, "shutdown called while actors are updating");
        loop {
            let Some(id) = self.pending.last().or_else(|| self.live.last()).copied() else {
                break;
            };
            if self.get(id).is_err() {
                // Not destroyable from here; drop the registration.
                self.unregister(id);
                continue;
            }
            self.destroy(id);
        }
        self.deferred_states.clear();
    }
}

impl Drop for World {
    fn drop(&mut self) {
        if !self.updating {
            self.shutdown();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::actor::ActorContext;

    #[derive(Default)]
    struct Counter {
        updates: Rc<RefCell<u32>>,
    }

    impl Component for Counter {
        fn update(&mut self, _ctx: &mut ActorContext<'_>, _dt: f32) {
            *self.updates.borrow_mut() += 1;
        }
    }

    /// Spawns a child on its first update.
    struct Spawner {
        child: Rc<RefCell<Option<EntityId>>>,
    }

    impl ActorBehavior for Spawner {
        fn update_actor(&mut self, _actor: &mut Actor, world: &mut World, _dt: f32) {
            if self.child.borrow().is_some() {
                return;
            }
            let child = world.spawn();
            assert!(world.is_updating());
            world
                .get_mut(child)
                .unwrap()
                .transform_mut()
                .set_position_2d(Vec2::new(3.0, 4.0));
            *self.child.borrow_mut() = Some(child);
        }
    }

    /// Kills the target actor from inside its own frame.
    struct Assassin {
        target: EntityId,
    }

    impl ActorBehavior for Assassin {
        fn update_actor(&mut self, _actor: &mut Actor, world: &mut World, _dt: f32) {
            world.set_state(self.target, ActorState::Dead).unwrap();
        }
    }

    struct SelfTargeting;

    impl ActorBehavior for SelfTargeting {
        fn update_actor(&mut self, actor: &mut Actor, world: &mut World, _dt: f32) {
            assert!(matches!(
                world.get(actor.id()),
                Err(EcsError::ActorCheckedOut(_))
            ));
            world.set_state(actor.id(), ActorState::Paused).unwrap();
            assert_eq!(actor.state(), ActorState::Active, "deferred until checkin");
        }
    }

    #[test]
    fn spawn_outside_iteration_goes_live() {
        let mut world = World::new();
        let id = world.spawn();
        assert_eq!(world.live_ids(), [id]);
        assert_eq!(world.pending_count(), 0);
    }

    #[test]
    fn spawned_mid_frame_waits_for_housekeeping() {
        let mut world = World::new();
        let child = Rc::new(RefCell::new(None));
        world.spawn_with_behavior(Spawner {
            child: child.clone(),
        });

        world.update_actors(0.016);
        let child_id = child.borrow().unwrap();
        assert_eq!(world.pending_ids(), [child_id]);
        assert!(world.get(child_id).unwrap().transform().is_dirty());

        let report = world.housekeeping();
        assert_eq!(report.promoted, 1);
        assert_eq!(world.live_count(), 2);
        let transform = world.get(child_id).unwrap().transform();
        assert!(!transform.is_dirty(), "promotion recomputes the transform");
    }

    #[test]
    fn pending_actor_is_not_updated_in_its_spawn_frame() {
        let mut world = World::new();
        let counts = Rc::new(RefCell::new(0));
        let child = Rc::new(RefCell::new(None));
        world.spawn_with_behavior(Spawner {
            child: child.clone(),
        });
        world.update_actors(0.016);
        let child_id = child.borrow().unwrap();
        world
            .add_component(
                child_id,
                Counter {
                    updates: counts.clone(),
                },
            )
            .unwrap();
        world.update_actors(0.016);
        assert_eq!(*counts.borrow(), 0, "still pending");
        world.housekeeping();
        world.update_actors(0.016);
        assert_eq!(*counts.borrow(), 1);
    }

    #[test]
    fn dead_actors_survive_until_housekeeping() {
        let mut world = World::new();
        let victim = world.spawn();
        world.spawn_with_behavior(Assassin { target: victim });

        world.update_actors(0.016);
        assert_eq!(world.state(victim), Ok(ActorState::Dead));
        assert_eq!(world.live_count(), 2);

        let report = world.housekeeping();
        assert_eq!(report.destroyed, 1);
        assert_eq!(world.get(victim).unwrap_err(), EcsError::StaleEntity(victim));
        assert_eq!(world.live_count(), 1);

        let report = world.housekeeping();
        assert_eq!(report.destroyed, 0, "never destroyed twice");
    }

    #[test]
    fn state_change_on_checked_out_actor_is_deferred() {
        let mut world = World::new();
        let id = world.spawn_with_behavior(SelfTargeting);
        world.update(0.016);
        assert_eq!(world.state(id), Ok(ActorState::Paused));
    }

    #[test]
    fn stale_ids_fail_every_lookup() {
        let mut world = World::new();
        let id = world.spawn();
        world.set_state(id, ActorState::Dead).unwrap();
        world.update(0.016);
        let reused = world.spawn();
        assert_eq!(reused.index(), id.index());
        assert!(world.get(id).is_err());
        assert_eq!(
            world.set_state(id, ActorState::Active),
            Err(EcsError::StaleEntity(id))
        );
        assert!(world.with_actor(id, |_, _| ()).is_err());
        assert!(world.get(reused).is_ok());
    }

    #[test]
    fn shutdown_destroys_everything() {
        let mut world = World::new();
        for _ in 0..4 {
            world.spawn();
        }
        world.shutdown();
        assert_eq!(world.live_count(), 0);
        assert_eq!(world.actor_count(), 0);
    }

    #[test]
    fn actors_lists_live_then_pending() {
        let mut world = World::new();
        let a = world.spawn();
        let child = Rc::new(RefCell::new(None));
        let b = world.spawn_with_behavior(Spawner {
            child: child.clone(),
        });
        world.update_actors(0.016);
        let c = child.borrow().unwrap();
        let ids: Vec<EntityId> = world.actors().map(Actor::id).collect();
        assert_eq!(ids, [a, b, c]);
    }
}

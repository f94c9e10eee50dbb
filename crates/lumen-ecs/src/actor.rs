//! Actors: a transform, a lifecycle state, a sorted component list and an
//! optional behavior.
//!
//! Per frame an active actor runs [`Actor::process_input`] and then
//! [`Actor::update`]. The update pipeline is:
//!
//! 1. recompute the world transform if dirty,
//! 2. update every component in update order with the same `dt`,
//! 3. run the behavior's [`ActorBehavior::update_actor`] hook,
//! 4. recompute the world transform again.
//!
//! Components and behaviors observe a fresh world transform and any change
//! made in step 3 is visible in the same frame.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{AsAny, Component, ComponentId, ComponentList};
use crate::entity::EntityId;
use crate::input::InputState;
use crate::transform::Transform;
use crate::world::World;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ActorState
// ---------------------------------------------------------------------------

/// Lifecycle of an actor. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActorState {
    #[default]
    Active,
    Paused,
    Dead,
}

impl ActorState {
    /// The state after requesting `next`. Nothing leaves `Dead`.
    pub fn transition(self, next: ActorState) -> ActorState {
        match self {
            ActorState::Dead => ActorState::Dead,
            _ => next,
        }
    }
}

// ---------------------------------------------------------------------------
// ActorBehavior
// ---------------------------------------------------------------------------

/// Actor-specific per-frame logic that runs after the components.
///
/// While a hook runs the behavior is detached from the actor, so
/// [`Actor::behavior`] returns `None` for the actor being driven. Calling
/// [`Actor::set_behavior`] from inside a hook replaces the running behavior
/// once the hook returns.
pub trait ActorBehavior: AsAny {
    fn update_actor(&mut self, _actor: &mut Actor, _world: &mut World, _dt: f32) {}

    fn actor_input(&mut self, _actor: &mut Actor, _world: &mut World, _input: &InputState) {}
}

// ---------------------------------------------------------------------------
// ActorContext
// ---------------------------------------------------------------------------

/// The owner view handed to component hooks.
pub struct ActorContext<'a> {
    id: EntityId,
    transform: &'a mut Transform,
    state: &'a mut ActorState,
    world: &'a mut World,
}

impl<'a> ActorContext<'a> {
    pub fn new(
        id: EntityId,
        transform: &'a mut Transform,
        state: &'a mut ActorState,
        world: &'a mut World,
    ) -> Self {
        Self {
            id,
            transform,
            state,
            world,
        }
    }

    /// Id of the owning actor.
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn transform(&self) -> &Transform {
        self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        self.transform
    }

    pub fn state(&self) -> ActorState {
        *self.state
    }

    /// Request a lifecycle change for the owner. A dead owner stays dead.
    pub fn set_state(&mut self, state: ActorState) {
        *self.state = self.state.transition(state);
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// A positioned, stateful object owned by a [`World`].
pub struct Actor {
    id: EntityId,
    state: ActorState,
    transform: Transform,
    components: ComponentList,
    behavior: Option<Box<dyn ActorBehavior>>,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("transform", &self.transform)
            .field("components", &self.components.len())
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

impl Actor {
    pub(crate) fn new(id: EntityId, behavior: Option<Box<dyn ActorBehavior>>) -> Self {
        Self {
            id,
            state: ActorState::Active,
            transform: Transform::new(),
            components: ComponentList::new(),
            behavior,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Request a lifecycle change. A dead actor stays dead.
    pub fn set_state(&mut self, state: ActorState) {
        self.state = self.state.transition(state);
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn components(&self) -> &ComponentList {
        &self.components
    }

    // -- components ---------------------------------------------------------

    /// Attach a component, keeping the list sorted by update order, and run
    /// its `on_attach` hook.
    pub fn add_component<C: Component>(&mut self, world: &mut World, component: C) -> ComponentId {
        self.add_boxed_component(world, Box::new(component))
    }

    pub fn add_boxed_component(
        &mut self,
        world: &mut World,
        component: Box<dyn Component>,
    ) -> ComponentId {
        let id = self.components.insert(component);
        let Actor {
            id: owner,
            state,
            transform,
            components,
            ..
        } = self;
        if let Some(slot) = components.get_mut(id) {
            let mut ctx = ActorContext::new(*owner, transform, state, world);
            slot.component.on_attach(&mut ctx, id);
        }
        id
    }

    /// Run `on_detach` and remove the component, preserving the order of
    /// the rest.
    pub fn remove_component(
        &mut self,
        world: &mut World,
        id: ComponentId,
    ) -> Result<Box<dyn Component>, EcsError> {
        let Actor {
            id: owner,
            state,
            transform,
            components,
            ..
        } = self;
        let slot = components.get_mut(id).ok_or(EcsError::ComponentNotFound {
            entity: *owner,
            component: id,
        })?;
        let mut ctx = ActorContext::new(*owner, transform, state, world);
        slot.component.on_detach(&mut ctx, id);
        components.remove(id).ok_or(EcsError::ComponentNotFound {
            entity: *owner,
            component: id,
        })
    }

    /// First component of type `T` in update order.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components.find::<T>()
    }

    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.find_mut::<T>()
    }

    pub fn component_by_id(&self, id: ComponentId) -> Option<&dyn Component> {
        self.components.get(id).map(|slot| &*slot.component)
    }

    /// Run `f` on the first component of type `C` together with an owner
    /// context, for component methods that need one.
    pub fn with_component<C, R>(
        &mut self,
        world: &mut World,
        f: impl FnOnce(&mut C, &mut ActorContext<'_>) -> R,
    ) -> Option<R>
    where
        C: Component,
    {
        let Actor {
            id,
            state,
            transform,
            components,
            ..
        } = self;
        let component = components.find_mut::<C>()?;
        let mut ctx = ActorContext::new(*id, transform, state, world);
        Some(f(component, &mut ctx))
    }

    // -- behavior -----------------------------------------------------------

    pub fn behavior<B: ActorBehavior>(&self) -> Option<&B> {
        self.behavior
            .as_deref()
            .and_then(|b| b.as_any().downcast_ref::<B>())
    }

    pub fn behavior_mut<B: ActorBehavior>(&mut self) -> Option<&mut B> {
        self.behavior
            .as_deref_mut()
            .and_then(|b| b.as_any_mut().downcast_mut::<B>())
    }

    pub fn set_behavior(&mut self, behavior: impl ActorBehavior) {
        self.behavior = Some(Box::new(behavior));
    }

    fn run_behavior(&mut self, f: impl FnOnce(&mut dyn ActorBehavior, &mut Actor)) {
        let Some(mut behavior) = self.behavior.take() else {
            return;
        };
        f(behavior.as_mut(), self);
        if self.behavior.is_none() {
            self.behavior = Some(behavior);
        }
    }

    // -- per-frame ----------------------------------------------------------

    /// Recompute the world matrix if dirty and notify every component.
    pub fn compute_world_transform(&mut self) {
        if self.transform.recompute() {
            for slot in self.components.iter_mut() {
                slot.component.on_update_world_transform(&self.transform);
            }
        }
    }

    /// Run one frame of logic. No-op unless active.
    pub fn update(&mut self, world: &mut World, dt: f32) {
        if self.state != ActorState::Active {
            return;
        }
        self.compute_world_transform();
        {
            let Actor {
                id,
                state,
                transform,
                components,
                ..
            } = self;
            let mut ctx = ActorContext::new(*id, transform, state, world);
            for slot in components.iter_mut() {
                slot.component.update(&mut ctx, dt);
            }
        }
        self.run_behavior(|behavior, actor| behavior.update_actor(actor, world, dt));
        self.compute_world_transform();
    }

    /// Dispatch the input snapshot. No-op unless active.
    pub fn process_input(&mut self, world: &mut World, input: &InputState) {
        if self.state != ActorState::Active {
            return;
        }
        self.compute_world_transform();
        {
            let Actor {
                id,
                state,
                transform,
                components,
                ..
            } = self;
            let mut ctx = ActorContext::new(*id, transform, state, world);
            for slot in components.iter_mut() {
                slot.component.process_input(&mut ctx, input);
            }
        }
        self.run_behavior(|behavior, actor| behavior.actor_input(actor, world, input));
    }

    /// Detach every component, last in update order first.
    pub(crate) fn teardown(&mut self, world: &mut World) {
        while let Some(mut slot) = self.components.pop_last() {
            let mut ctx = ActorContext::new(self.id, &mut self.transform, &mut self.state, world);
            slot.component.on_detach(&mut ctx, slot.id);
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

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        order: i32,
        log: Log,
    }

    impl Component for Recorder {
        fn update_order(&self) -> i32 {
            self.order
        }

        fn update(&mut self, ctx: &mut ActorContext<'_>, _dt: f32) {
            let dirty = ctx.transform().is_dirty();
            self.log
                .borrow_mut()
                .push(format!("update {} dirty={dirty}", self.name));
        }

        fn process_input(&mut self, ctx: &mut ActorContext<'_>, _input: &InputState) {
            let dirty = ctx.transform().is_dirty();
            self.log
                .borrow_mut()
                .push(format!("input {} dirty={dirty}", self.name));
        }

        fn on_update_world_transform(&mut self, _transform: &Transform) {
            self.log.borrow_mut().push(format!("xform {}", self.name));
        }

        fn on_detach(&mut self, _ctx: &mut ActorContext<'_>, _id: ComponentId) {
            self.log.borrow_mut().push(format!("detach {}", self.name));
        }
    }

    struct Mover {
        log: Log,
    }

    impl ActorBehavior for Mover {
        fn update_actor(&mut self, actor: &mut Actor, _world: &mut World, _dt: f32) {
            self.log.borrow_mut().push("behavior".into());
            assert!(actor.behavior::<Mover>().is_none());
            actor.transform_mut().set_position_2d(Vec2::new(5.0, 5.0));
        }

        fn actor_input(&mut self, _actor: &mut Actor, _world: &mut World, _input: &InputState) {
            self.log.borrow_mut().push("behavior input".into());
        }
    }

    fn actor_with(log: &Log, world: &mut World) -> Actor {
        let mut actor = Actor::new(
            EntityId::new(0, 0),
            Some(Box::new(Mover { log: log.clone() })),
        );
        for (name, order) in [("late", 200), ("early", 10)] {
            actor.add_component(
                world,
                Recorder {
                    name,
                    order,
                    log: log.clone(),
                },
            );
        }
        actor
    }

    #[test]
    fn update_runs_components_then_behavior_with_fresh_transform() {
        let log = Log::default();
        let mut world = World::new();
        let mut actor = actor_with(&log, &mut world);

        actor.update(&mut world, 0.016);

        assert_eq!(
            *log.borrow(),
            [
                "xform early",
                "xform late",
                "update early dirty=false",
                "update late dirty=false",
                "behavior",
                "xform early",
                "xform late",
            ]
        );
        assert!(!actor.transform().is_dirty());
        assert!(actor.behavior::<Mover>().is_some(), "behavior restored");
    }

    #[test]
    fn input_sees_fresh_transform_then_runs_components_in_order() {
        let log = Log::default();
        let mut world = World::new();
        let mut actor = actor_with(&log, &mut world);
        actor.transform_mut().set_position_2d(Vec2::new(100.0, 50.0));
        actor.process_input(&mut world, &InputState::default());
        assert_eq!(
            *log.borrow(),
            [
                "xform early",
                "xform late",
                "input early dirty=false",
                "input late dirty=false",
                "behavior input",
            ]
        );
        let translation = actor.transform().world_transform().w_axis;
        assert_eq!(translation.truncate(), glam::Vec3::new(100.0, 50.0, 0.0));
    }

    #[test]
    fn paused_and_dead_actors_skip_the_frame() {
        let log = Log::default();
        let mut world = World::new();
        let mut actor = actor_with(&log, &mut world);
        actor.set_state(ActorState::Paused);
        actor.update(&mut world, 0.016);
        actor.process_input(&mut world, &InputState::default());
        assert!(log.borrow().is_empty());

        actor.set_state(ActorState::Dead);
        actor.set_state(ActorState::Active);
        assert_eq!(actor.state(), ActorState::Dead, "dead is terminal");
    }

    #[test]
    fn teardown_detaches_in_reverse_order() {
        let log = Log::default();
        let mut world = World::new();
        let mut actor = actor_with(&log, &mut world);
        actor.teardown(&mut world);
        assert_eq!(*log.borrow(), ["detach late", "detach early"]);
        assert!(actor.components().is_empty());
    }

    #[test]
    fn remove_component_detaches_and_reports_missing() {
        let log = Log::default();
        let mut world = World::new();
        let mut actor = Actor::new(EntityId::new(0, 0), None);
        let id = actor.add_component(
            &mut world,
            Recorder {
                name: "solo",
                order: 1,
                log: log.clone(),
            },
        );
        assert!(actor.remove_component(&mut world, id).is_ok());
        assert_eq!(*log.borrow(), ["detach solo"]);
        assert!(matches!(
            actor.remove_component(&mut world, id),
            Err(EcsError::ComponentNotFound { .. })
        ));
    }
}

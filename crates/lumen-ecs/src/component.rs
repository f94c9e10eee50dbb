//! The component capability trait and the per-actor sorted component list.
//!
//! A component is a unit of per-frame behavior owned by exactly one
//! [`Actor`](crate::actor::Actor). Every hook receives an
//! [`ActorContext`] that borrows the owner's transform, lifecycle state and
//! the surrounding [`World`](crate::world::World) for the duration of the
//! call. Components never hold a pointer back to their owner.
//!
//! # Example
//!
//! ```
//! use lumen_ecs::prelude::*;
//!
//! struct Spin { speed: f32 }
//!
//! impl Component for Spin {
//!     fn update(&mut self, ctx: &mut ActorContext<'_>, dt: f32) {
//!         let angle = ctx.transform().rotation_2d() + self.speed * dt;
//!         ctx.transform_mut().set_rotation_2d(angle);
//!     }
//! }
//!
//! let mut world = World::new();
//! let id = world.spawn();
//! world.add_component(id, Spin { speed: 1.0 }).unwrap();
//! world.update(0.5);
//! let angle = world.get(id).unwrap().transform().rotation_2d();
//! assert!((angle - 0.5).abs() < 1e-5);
//! ```

use std::any::Any;
use std::fmt;

use crate::actor::ActorContext;
use crate::draw::Drawable;
use crate::input::InputState;
use crate::sorted::insert_sorted_stable;
use crate::transform::Transform;

/// Update order used when a component does not override it.
pub const DEFAULT_UPDATE_ORDER: i32 = 100;

// ---------------------------------------------------------------------------
// AsAny
// ---------------------------------------------------------------------------

/// Downcasting support for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Identifies a component within its owning actor.
///
/// Ids come from a counter on the actor and are never reused by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Per-frame behavior attached to an actor. Every hook defaults to a no-op.
pub trait Component: AsAny {
    /// Lower orders run earlier. Read once, when the component is attached.
    fn update_order(&self) -> i32 {
        DEFAULT_UPDATE_ORDER
    }

    fn update(&mut self, _ctx: &mut ActorContext<'_>, _dt: f32) {}

    fn process_input(&mut self, _ctx: &mut ActorContext<'_>, _input: &InputState) {}

    /// Called whenever the owner's world transform is recomputed.
    fn on_update_world_transform(&mut self, _transform: &Transform) {}

    /// Called right after the component joins its owner's list.
    fn on_attach(&mut self, _ctx: &mut ActorContext<'_>, _id: ComponentId) {}

    /// Called right before the component leaves its owner's list, either on
    /// explicit removal or while the owner is being destroyed.
    fn on_detach(&mut self, _ctx: &mut ActorContext<'_>, _id: ComponentId) {}

    /// Components that render return themselves here.
    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }
}

// ---------------------------------------------------------------------------
// ComponentList
// ---------------------------------------------------------------------------

/// A component together with the bookkeeping its owner keeps for it.
pub struct ComponentSlot {
    pub id: ComponentId,
    pub update_order: i32,
    pub component: Box<dyn Component>,
}

impl ComponentSlot {
    /// Downcast the stored component.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        (*self.component).as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        (*self.component).as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("id", &self.id)
            .field("update_order", &self.update_order)
            .finish_non_exhaustive()
    }
}

/// Components of one actor, kept ascending by update order. Equal orders
/// keep their attachment order.
#[derive(Debug, Default)]
pub struct ComponentList {
    slots: Vec<ComponentSlot>,
    next_id: u32,
}

impl ComponentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component and return its freshly assigned id.
    pub fn insert(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        let slot = ComponentSlot {
            id,
            update_order: component.update_order(),
            component,
        };
        insert_sorted_stable(&mut self.slots, slot, |s| s.update_order);
        id
    }

    /// Remove a component, preserving the order of the others.
    pub fn remove(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let index = self.position(id)?;
        Some(self.slots.remove(index).component)
    }

    /// Remove the last component in update order.
    pub fn pop_last(&mut self) -> Option<ComponentSlot> {
        self.slots.pop()
    }

    pub fn position(&self, id: ComponentId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    pub fn get(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    /// First component of type `T` in update order.
    pub fn find<T: Component>(&self) -> Option<&T> {
        self.slots.iter().find_map(|s| s.downcast_ref::<T>())
    }

    pub fn find_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots.iter_mut().find_map(|s| s.downcast_mut::<T>())
    }

    /// Id of the first component of type `T`.
    pub fn find_id<T: Component>(&self) -> Option<ComponentId> {
        self.slots
            .iter()
            .find(|s| s.downcast_ref::<T>().is_some())
            .map(|s| s.id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComponentSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ComponentSlot> {
        self.slots.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged {
        order: i32,
        tag: &'static str,
    }

    impl Component for Tagged {
        fn update_order(&self) -> i32 {
            self.order
        }
    }

    struct Plain;

    impl Component for Plain {}

    fn tags(list: &ComponentList) -> Vec<&'static str> {
        list.iter()
            .filter_map(|s| s.downcast_ref::<Tagged>())
            .map(|t| t.tag)
            .collect()
    }

    #[test]
    fn list_sorts_by_update_order_stably() {
        let mut list = ComponentList::new();
        for (order, tag) in [(100, "sprite"), (10, "move"), (100, "circle"), (50, "ai")] {
            list.insert(Box::new(Tagged { order, tag }));
        }
        assert_eq!(tags(&list), ["move", "ai", "sprite", "circle"]);
    }

    #[test]
    fn default_order_is_one_hundred() {
        assert_eq!(Plain.update_order(), DEFAULT_UPDATE_ORDER);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut list = ComponentList::new();
        let a = list.insert(Box::new(Plain));
        assert!(list.remove(a).is_some());
        let b = list.insert(Box::new(Plain));
        assert_ne!(a, b);
        assert!(list.remove(a).is_none());
    }

    #[test]
    fn removal_preserves_relative_order() {
        let mut list = ComponentList::new();
        list.insert(Box::new(Tagged { order: 1, tag: "a" }));
        let b = list.insert(Box::new(Tagged { order: 1, tag: "b" }));
        list.insert(Box::new(Tagged { order: 1, tag: "c" }));
        list.remove(b);
        assert_eq!(tags(&list), ["a", "c"]);
    }

    #[test]
    fn typed_lookup_finds_first_match() {
        let mut list = ComponentList::new();
        list.insert(Box::new(Plain));
        let first = list.insert(Box::new(Tagged { order: 5, tag: "x" }));
        list.insert(Box::new(Tagged { order: 7, tag: "y" }));
        assert_eq!(list.find::<Tagged>().map(|t| t.tag), Some("x"));
        assert_eq!(list.find_id::<Tagged>(), Some(first));
        list.find_mut::<Tagged>().unwrap().tag = "z";
        assert_eq!(tags(&list), ["z", "y"]);
    }
}

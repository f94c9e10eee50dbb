//! Waypoint following on top of the direct movement model.
//!
//! A [`NavComponent`] walks a path laid out in an external [`PathGraph`]:
//! each node knows its position and the next hop toward the goal. When the
//! owner comes within the arrive radius of its current waypoint it advances
//! to that waypoint's next hop and turns to face it; the wrapped
//! [`MoveComponent`] then does the actual moving.

use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use lumen_ecs::actor::ActorContext;
use lumen_ecs::component::{Component, ComponentId};
use lumen_ecs::math::{heading_angle, near_zero, near_zero_within};
use lumen_ecs::transform::Transform;
use lumen_search::graph::NodeId;

use crate::movement::MoveComponent;

/// Default distance at which a waypoint counts as reached.
pub const DEFAULT_ARRIVE_RADIUS: f32 = 2.0;

/// A graph whose nodes carry positions and a precomputed next hop.
pub trait PathGraph {
    fn node_position(&self, node: NodeId) -> Option<Vec2>;

    /// The node to head for after reaching `node`, or `None` at the goal.
    fn next_hop(&self, node: NodeId) -> Option<NodeId>;
}

pub struct NavComponent {
    movement: MoveComponent,
    graph: Rc<dyn PathGraph>,
    next: Option<NodeId>,
    start: Option<NodeId>,
    arrive_radius: f32,
}

impl NavComponent {
    /// Follow paths in `graph` at `forward_speed` units per second.
    pub fn new(graph: Rc<dyn PathGraph>, forward_speed: f32) -> Self {
        let mut movement = MoveComponent::direct();
        movement.set_forward_speed(forward_speed);
        Self {
            movement,
            graph,
            next: None,
            start: None,
            arrive_radius: DEFAULT_ARRIVE_RADIUS,
        }
    }

    /// Begin the path at `start` once the component is attached.
    pub fn with_start(mut self, start: NodeId) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_arrive_radius(mut self, radius: f32) -> Self {
        self.arrive_radius = radius;
        self
    }

    pub fn movement(&self) -> &MoveComponent {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut MoveComponent {
        &mut self.movement
    }

    /// The waypoint currently headed for.
    pub fn next_node(&self) -> Option<NodeId> {
        self.next
    }

    /// Head for the node after `start` and face it.
    pub fn start_path(&mut self, transform: &mut Transform, start: NodeId) {
        self.next = self.graph.next_hop(start);
        self.face_next(transform);
    }

    /// Rotate so that forward points at `target`. No-op when already there.
    pub fn turn_to(transform: &mut Transform, target: Vec2) {
        let direction = target - transform.position_2d();
        if !near_zero(direction.length_squared()) {
            transform.set_rotation_2d(heading_angle(direction));
        }
    }

    fn face_next(&self, transform: &mut Transform) {
        if let Some(target) = self.next.and_then(|n| self.graph.node_position(n)) {
            Self::turn_to(transform, target);
        }
    }

    /// Advance the cursor if the current waypoint is reached, then move.
    pub fn step(&mut self, transform: &mut Transform, dt: f32) {
        if let Some(next) = self.next {
            match self.graph.node_position(next) {
                Some(target) => {
                    let distance = transform.position_2d().distance(target);
                    if near_zero_within(distance, self.arrive_radius) {
                        self.next = self.graph.next_hop(next);
                        self.face_next(transform);
                    }
                }
                None => {
                    tracing::warn!(node = next.0, "waypoint has no position, clearing path");
                    self.next = None;
                }
            }
        }
        self.movement.step(transform, dt);
    }
}

impl Component for NavComponent {
    fn update_order(&self) -> i32 {
        self.movement.update_order()
    }

    fn update(&mut self, ctx: &mut ActorContext<'_>, dt: f32) {
        self.step(ctx.transform_mut(), dt);
    }

    fn on_attach(&mut self, ctx: &mut ActorContext<'_>, _id: ComponentId) {
        if let Some(start) = self.start.take() {
            self.start_path(ctx.transform_mut(), start);
        }
    }
}

impl fmt::Debug for NavComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavComponent")
            .field("movement", &self.movement)
            .field("next", &self.next)
            .field("arrive_radius", &self.arrive_radius)
            .finish_non_exhaustive()
    }
}

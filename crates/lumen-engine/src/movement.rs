//! Kinematic movement components.
//!
//! [`MoveComponent`] integrates its owner's transform each frame with one of
//! two models:
//!
//! - [`Kinematics::Direct`]: externally driven forward, strafe and angular
//!   speeds applied straight to position and rotation.
//! - [`Kinematics::Force`]: forces accumulated during the frame are turned
//!   into acceleration, velocity and position with semi-implicit Euler, and
//!   the heading follows the velocity. The accumulated force is cleared
//!   after every step.
//!
//! Magnitudes within [`NEAR_ZERO_EPSILON`](lumen_ecs::math::NEAR_ZERO_EPSILON)
//! of zero are skipped entirely, so a stationary actor's transform is never
//! touched. An optional [`ScreenWrap`] re-enters actors that leave the
//! playfield just inside the opposite edge.
//!
//! [`InputComponent`] wraps a `MoveComponent` and sets its speeds, or
//! applies forces, from held keys.

use std::f32::consts::TAU;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use lumen_ecs::actor::ActorContext;
use lumen_ecs::component::Component;
use lumen_ecs::input::{InputState, Key};
use lumen_ecs::math::{heading_angle, near_zero};
use lumen_ecs::transform::Transform;

/// Movement runs before the default-ordered components so they observe
/// this frame's position.
pub const MOVE_UPDATE_ORDER: i32 = 10;

// ---------------------------------------------------------------------------
// ScreenWrap
// ---------------------------------------------------------------------------

/// Playfield bounds for arcade-style wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenWrap {
    pub min: Vec2,
    pub max: Vec2,
    /// How far inside the opposite edge a wrapped actor re-enters.
    pub inset: f32,
}

impl Default for ScreenWrap {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(1024.0, 768.0),
            inset: 2.0,
        }
    }
}

impl ScreenWrap {
    pub fn wrap(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(position.x, self.min.x, self.max.x, self.inset),
            wrap_axis(position.y, self.min.y, self.max.y, self.inset),
        )
    }
}

fn wrap_axis(value: f32, min: f32, max: f32, inset: f32) -> f32 {
    if value < min {
        max - inset
    } else if value > max {
        min + inset
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Kinematics
// ---------------------------------------------------------------------------

/// Speeds for the direct model. Angular speed is radians per second,
/// counter-clockwise positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectMotion {
    pub forward_speed: f32,
    pub strafe_speed: f32,
    pub angular_speed: f32,
}

/// State for the force-accumulation model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceMotion {
    mass: f32,
    velocity: Vec2,
    force: Vec2,
}

impl ForceMotion {
    /// # Panics
    ///
    /// Panics if `mass` is not positive and finite.
    pub fn new(mass: f32) -> Self {
        assert!(
            mass > 0.0 && mass.is_finite(),
            "mass must be positive and finite, got {mass}"
        );
        Self {
            mass,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Force accumulated since the last step.
    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn add_force(&mut self, force: Vec2) {
        self.force += force;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kinematics {
    Direct(DirectMotion),
    Force(ForceMotion),
}

// ---------------------------------------------------------------------------
// MoveComponent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MoveComponent {
    kinematics: Kinematics,
    wrap: Option<ScreenWrap>,
    update_order: i32,
}

impl MoveComponent {
    /// Direct model, all speeds zero.
    pub fn direct() -> Self {
        Self::from_kinematics(Kinematics::Direct(DirectMotion::default()))
    }

    /// Force model at rest.
    pub fn force(mass: f32) -> Self {
        Self::from_kinematics(Kinematics::Force(ForceMotion::new(mass)))
    }

    pub fn from_kinematics(kinematics: Kinematics) -> Self {
        Self {
            kinematics,
            wrap: None,
            update_order: MOVE_UPDATE_ORDER,
        }
    }

    pub fn with_screen_wrap(mut self, wrap: ScreenWrap) -> Self {
        self.wrap = Some(wrap);
        self
    }

    pub fn with_update_order(mut self, order: i32) -> Self {
        self.update_order = order;
        self
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    pub fn screen_wrap(&self) -> Option<&ScreenWrap> {
        self.wrap.as_ref()
    }

    // -- direct model -------------------------------------------------------

    /// Forward speed in the direct model, `0` in the force model.
    pub fn forward_speed(&self) -> f32 {
        match &self.kinematics {
            Kinematics::Direct(d) => d.forward_speed,
            Kinematics::Force(_) => 0.0,
        }
    }

    /// No-op in the force model.
    pub fn set_forward_speed(&mut self, speed: f32) {
        if let Kinematics::Direct(d) = &mut self.kinematics {
            d.forward_speed = speed;
        }
    }

    pub fn strafe_speed(&self) -> f32 {
        match &self.kinematics {
            Kinematics::Direct(d) => d.strafe_speed,
            Kinematics::Force(_) => 0.0,
        }
    }

    pub fn set_strafe_speed(&mut self, speed: f32) {
        if let Kinematics::Direct(d) = &mut self.kinematics {
            d.strafe_speed = speed;
        }
    }

    pub fn angular_speed(&self) -> f32 {
        match &self.kinematics {
            Kinematics::Direct(d) => d.angular_speed,
            Kinematics::Force(_) => 0.0,
        }
    }

    pub fn set_angular_speed(&mut self, speed: f32) {
        if let Kinematics::Direct(d) = &mut self.kinematics {
            d.angular_speed = speed;
        }
    }

    // -- force model --------------------------------------------------------

    /// Accumulate a force for the next step. No-op in the direct model.
    pub fn add_force(&mut self, force: Vec2) {
        if let Kinematics::Force(f) = &mut self.kinematics {
            f.add_force(force);
        }
    }

    /// Velocity in the force model, `Vec2::ZERO` in the direct model.
    pub fn velocity(&self) -> Vec2 {
        match &self.kinematics {
            Kinematics::Force(f) => f.velocity,
            Kinematics::Direct(_) => Vec2::ZERO,
        }
    }

    pub fn accumulated_force(&self) -> Vec2 {
        match &self.kinematics {
            Kinematics::Force(f) => f.force,
            Kinematics::Direct(_) => Vec2::ZERO,
        }
    }

    /// Zero every speed, the velocity and any accumulated force.
    pub fn stop(&mut self) {
        match &mut self.kinematics {
            Kinematics::Direct(d) => *d = DirectMotion::default(),
            Kinematics::Force(f) => {
                f.velocity = Vec2::ZERO;
                f.force = Vec2::ZERO;
            }
        }
    }

    // -- integration --------------------------------------------------------

    /// Advance `transform` by `dt` seconds.
    pub fn step(&mut self, transform: &mut Transform, dt: f32) {
        let moved = match &mut self.kinematics {
            Kinematics::Direct(motion) => step_direct(motion, transform, dt),
            Kinematics::Force(motion) => step_force(motion, transform, dt),
        };
        if moved {
            if let Some(wrap) = &self.wrap {
                transform.set_position_2d(wrap.wrap(transform.position_2d()));
            }
        }
    }
}

/// Returns whether the position changed.
fn step_direct(motion: &DirectMotion, transform: &mut Transform, dt: f32) -> bool {
    if !near_zero(motion.angular_speed) {
        let increment = Quat::from_axis_angle(Vec3::Z, motion.angular_speed * dt);
        transform.set_rotation(increment * transform.rotation());
    }

    let forward = !near_zero(motion.forward_speed);
    let strafe = !near_zero(motion.strafe_speed);
    if !forward && !strafe {
        return false;
    }
    let mut position = transform.position();
    if forward {
        position += transform.forward() * motion.forward_speed * dt;
    }
    if strafe {
        position += transform.right() * motion.strafe_speed * dt;
    }
    transform.set_position(position);
    true
}

fn step_force(motion: &mut ForceMotion, transform: &mut Transform, dt: f32) -> bool {
    let acceleration = motion.force / motion.mass;
    motion.velocity += acceleration * dt;
    motion.force = Vec2::ZERO;

    if near_zero(motion.velocity.length_squared()) {
        return false;
    }
    transform.set_position_2d(transform.position_2d() + motion.velocity * dt);
    transform.set_rotation_2d(heading_angle(motion.velocity));
    true
}

impl Component for MoveComponent {
    fn update_order(&self) -> i32 {
        self.update_order
    }

    fn update(&mut self, ctx: &mut ActorContext<'_>, dt: f32) {
        self.step(ctx.transform_mut(), dt);
    }
}

// ---------------------------------------------------------------------------
// InputComponent
// ---------------------------------------------------------------------------

/// Keys that drive an [`InputComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Key,
    pub back: Key,
    pub clockwise: Key,
    pub counter_clockwise: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: Key::W,
            back: Key::S,
            clockwise: Key::D,
            counter_clockwise: Key::A,
        }
    }
}

/// Limits applied by an [`InputComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    pub max_forward_speed: f32,
    pub max_angular_speed: f32,
    /// Force magnitude per held key in the force model.
    pub max_force: f32,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_forward_speed: 300.0,
            max_angular_speed: TAU,
            max_force: 100.0,
        }
    }
}

/// Keyboard-driven movement.
///
/// In the direct model held keys set the forward and angular speeds each
/// frame. In the force model they add a force along world axes: forward and
/// back along ±y, clockwise and counter-clockwise along ±x.
#[derive(Debug, Clone, PartialEq)]
pub struct InputComponent {
    movement: MoveComponent,
    bindings: KeyBindings,
    limits: InputLimits,
}

impl InputComponent {
    pub fn new(movement: MoveComponent, bindings: KeyBindings, limits: InputLimits) -> Self {
        Self {
            movement,
            bindings,
            limits,
        }
    }

    pub fn movement(&self) -> &MoveComponent {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut MoveComponent {
        &mut self.movement
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn limits(&self) -> &InputLimits {
        &self.limits
    }

    /// Apply one frame of held keys.
    pub fn apply_input(&mut self, input: &InputState) {
        let held = |key: Key| if input.keyboard.key_value(key) { 1.0 } else { 0.0 };
        let throttle = held(self.bindings.forward) - held(self.bindings.back);
        let turn = held(self.bindings.clockwise) - held(self.bindings.counter_clockwise);

        match self.movement.kinematics {
            Kinematics::Direct(_) => {
                self.movement
                    .set_forward_speed(throttle * self.limits.max_forward_speed);
                // Counter-clockwise is positive.
                self.movement
                    .set_angular_speed(-turn * self.limits.max_angular_speed);
            }
            Kinematics::Force(_) => {
                let force = Vec2::new(turn, throttle) * self.limits.max_force;
                self.movement.add_force(force);
            }
        }
    }
}

impl Component for InputComponent {
    fn update_order(&self) -> i32 {
        self.movement.update_order
    }

    fn update(&mut self, ctx: &mut ActorContext<'_>, dt: f32) {
        self.movement.step(ctx.transform_mut(), dt);
    }

    fn process_input(&mut self, _ctx: &mut ActorContext<'_>, input: &InputState) {
        self.apply_input(input);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn at(x: f32, y: f32) -> Transform {
        let mut t = Transform::new();
        t.set_position_2d(Vec2::new(x, y));
        t
    }

    #[test]
    fn direct_model_moves_along_forward() {
        let mut mover = MoveComponent::direct();
        mover.set_forward_speed(100.0);
        let mut t = at(10.0, 10.0);
        mover.step(&mut t, 0.5);
        assert!((t.position_2d() - Vec2::new(60.0, 10.0)).length() < 1e-4);

        t.set_rotation_2d(FRAC_PI_2);
        mover.step(&mut t, 0.5);
        assert!((t.position_2d() - Vec2::new(60.0, 60.0)).length() < 1e-3);
    }

    #[test]
    fn direct_model_turns_counter_clockwise_for_positive_speed() {
        let mut mover = MoveComponent::direct();
        mover.set_angular_speed(FRAC_PI_2);
        let mut t = Transform::new();
        mover.step(&mut t, 1.0);
        assert!((t.rotation_2d() - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(t.position_2d(), Vec2::ZERO);
    }

    #[test]
    fn force_model_integrates_and_faces_velocity() {
        let mut mover = MoveComponent::force(2.0);
        mover.add_force(Vec2::new(0.0, 40.0));
        let mut t = Transform::new();
        mover.step(&mut t, 0.5);
        // a = 20, v = 10, p = 5
        assert_eq!(mover.velocity(), Vec2::new(0.0, 10.0));
        assert!((t.position_2d() - Vec2::new(0.0, 5.0)).length() < 1e-5);
        assert!((t.rotation_2d() - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(mover.accumulated_force(), Vec2::ZERO);

        mover.step(&mut t, 0.5);
        assert_eq!(mover.velocity(), Vec2::new(0.0, 10.0), "velocity persists");
    }

    #[test]
    fn speed_setters_are_model_specific() {
        let mut force = MoveComponent::force(1.0);
        force.set_forward_speed(5.0);
        assert_eq!(force.forward_speed(), 0.0);

        let mut direct = MoveComponent::direct();
        direct.add_force(Vec2::ONE);
        assert_eq!(direct.accumulated_force(), Vec2::ZERO);
    }

    #[test]
    fn wrap_reenters_inside_opposite_edge() {
        let wrap = ScreenWrap::default();
        assert_eq!(wrap.wrap(Vec2::new(1030.0, 300.0)), Vec2::new(2.0, 300.0));
        assert_eq!(wrap.wrap(Vec2::new(-1.0, 300.0)), Vec2::new(1022.0, 300.0));
        assert_eq!(wrap.wrap(Vec2::new(50.0, 770.0)), Vec2::new(50.0, 2.0));
        assert_eq!(wrap.wrap(Vec2::new(50.0, -0.5)), Vec2::new(50.0, 766.0));
        assert_eq!(wrap.wrap(Vec2::new(1024.0, 0.0)), Vec2::new(1024.0, 0.0));
    }

    #[test]
    fn input_drives_direct_speeds() {
        let mut control = InputComponent::new(
            MoveComponent::direct(),
            KeyBindings::default(),
            InputLimits::default(),
        );
        let mut input = InputState::default();
        input.set_key(Key::W, true);
        input.set_key(Key::D, true);
        control.apply_input(&input);
        assert_eq!(control.movement().forward_speed(), 300.0);
        assert_eq!(control.movement().angular_speed(), -TAU);

        input.set_key(Key::S, true);
        input.set_key(Key::A, true);
        control.apply_input(&input);
        assert_eq!(control.movement().forward_speed(), 0.0);
        assert_eq!(control.movement().angular_speed(), 0.0);
    }

    #[test]
    fn input_adds_forces_along_world_axes() {
        let mut control = InputComponent::new(
            MoveComponent::force(1.0),
            KeyBindings::default(),
            InputLimits::default(),
        );
        let mut input = InputState::default();
        input.set_key(Key::W, true);
        input.set_key(Key::A, true);
        control.apply_input(&input);
        assert_eq!(
            control.movement().accumulated_force(),
            Vec2::new(-100.0, 100.0)
        );
    }

    #[test]
    #[should_panic(expected = "mass must be positive")]
    fn zero_mass_is_rejected() {
        let _ = MoveComponent::force(0.0);
    }
}

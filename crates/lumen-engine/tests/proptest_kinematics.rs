//! Property tests for the movement integrators and the circle predicate.
//!
//! Covers near-zero idempotence of both kinematic models, the per-step
//! force reset, wrap re-entry and symmetry of circle intersection.

use glam::{Vec2, Vec3};
use lumen_engine::prelude::*;
use proptest::prelude::*;

fn vec2(range: f32) -> impl Strategy<Value = Vec2> {
    (-range..range, -range..range).prop_map(|(x, y)| Vec2::new(x, y))
}

/// A magnitude small enough to count as zero.
fn negligible() -> impl Strategy<Value = f32> {
    -0.001f32..=0.001
}

fn transform_at(position: Vec2, angle: f32) -> Transform {
    let mut t = Transform::new();
    t.set_position_2d(position);
    t.set_rotation_2d(angle);
    t.recompute();
    t
}

proptest! {
    #[test]
    fn negligible_direct_speeds_leave_transform_untouched(
        position in vec2(500.0),
        angle in -3.0f32..3.0,
        forward in negligible(),
        strafe in negligible(),
        angular in negligible(),
        dt in 0.0f32..10.0,
    ) {
        let mut mover = MoveComponent::direct().with_screen_wrap(ScreenWrap::default());
        mover.set_forward_speed(forward);
        mover.set_strafe_speed(strafe);
        mover.set_angular_speed(angular);
        let mut t = transform_at(position, angle);
        let before = (t.position(), t.rotation());
        mover.step(&mut t, dt);
        prop_assert_eq!((t.position(), t.rotation()), before);
        prop_assert!(!t.is_dirty());
    }

    #[test]
    fn negligible_velocity_leaves_transform_untouched(
        position in vec2(500.0),
        angle in -3.0f32..3.0,
        vx in -0.02f32..0.02,
        vy in -0.02f32..0.02,
        dt in 0.0f32..10.0,
    ) {
        // |v|^2 stays at or below the epsilon.
        let velocity = Vec2::new(vx, vy);
        prop_assume!(velocity.length_squared() <= 0.001);
        let mut mover = MoveComponent::from_kinematics(Kinematics::Force({
            let mut motion = lumen_engine::movement::ForceMotion::new(1.0);
            motion.set_velocity(velocity);
            motion
        }));
        let mut t = transform_at(position, angle);
        let before = (t.position(), t.rotation());
        mover.step(&mut t, dt);
        prop_assert_eq!((t.position(), t.rotation()), before);
    }

    #[test]
    fn accumulated_force_resets_every_step(
        forces in prop::collection::vec(vec2(200.0), 1..5),
        mass in 0.5f32..5.0,
        dt in 0.001f32..0.05,
    ) {
        let mut mover = MoveComponent::force(mass);
        let mut t = Transform::new();
        let total: Vec2 = forces.iter().copied().sum();
        for f in &forces {
            mover.add_force(*f);
        }
        prop_assert_eq!(mover.accumulated_force(), total);
        mover.step(&mut t, dt);
        prop_assert_eq!(mover.accumulated_force(), Vec2::ZERO);
        let expected = total / mass * dt;
        prop_assert!((mover.velocity() - expected).length() <= 1e-3 * (1.0 + expected.length()));

        // Without new force the velocity carries on unchanged.
        let velocity = mover.velocity();
        mover.step(&mut t, dt);
        prop_assert_eq!(mover.velocity(), velocity);
    }

    #[test]
    fn wrapped_positions_stay_in_bounds(position in vec2(3000.0)) {
        let wrap = ScreenWrap::default();
        let p = wrap.wrap(position);
        prop_assert!(p.x >= wrap.min.x && p.x <= wrap.max.x);
        prop_assert!(p.y >= wrap.min.y && p.y <= wrap.max.y);
    }

    #[test]
    fn intersection_is_symmetric(
        a in vec2(100.0),
        b in vec2(100.0),
        ra in 0.0f32..50.0,
        rb in 0.0f32..50.0,
    ) {
        let a = Circle::new(a, ra);
        let b = Circle::new(b, rb);
        prop_assert_eq!(intersect(&a, &b), intersect(&b, &a));
        prop_assert!(intersect(&a, &a));
    }
}

#[test]
fn crossing_the_right_edge_reenters_near_the_left() {
    let mut world = World::new();
    let id = world.spawn();
    world
        .get_mut(id)
        .unwrap()
        .transform_mut()
        .set_position_2d(Vec2::new(1023.0, 300.0));
    let mut mover = MoveComponent::direct().with_screen_wrap(ScreenWrap::default());
    mover.set_forward_speed(100.0);
    world.add_component(id, mover).unwrap();

    world.update(0.1);
    let position = world.get(id).unwrap().transform().position();
    assert_eq!(position, Vec3::new(2.0, 300.0, 0.0));
}

#[test]
fn already_outside_actor_wraps_on_its_next_move() {
    let mut t = Transform::new();
    t.set_position_2d(Vec2::new(1024.1, 300.0));
    let mut mover = MoveComponent::direct().with_screen_wrap(ScreenWrap::default());
    mover.set_forward_speed(1.0);
    mover.step(&mut t, 0.016);
    assert_eq!(t.position_2d(), Vec2::new(2.0, 300.0));
}

#[test]
fn input_component_drives_a_force_ship_through_the_loop() {
    let mut world = World::new();
    let ship = world.spawn();
    world
        .add_component(
            ship,
            InputComponent::new(
                MoveComponent::force(1.0),
                KeyBindings::default(),
                InputLimits::default(),
            ),
        )
        .unwrap();
    let mut game = GameLoop::new(world, LoopConfig::default());
    let mut input = InputState::default();
    input.set_key(Key::W, true);
    game.frame(&input, 0.05);

    let actor = game.world().get(ship).unwrap();
    let movement = actor.component::<InputComponent>().unwrap().movement();
    // a = 100, v = 5, p = 0.25
    assert!((movement.velocity() - Vec2::new(0.0, 5.0)).length() < 1e-4);
    assert!((actor.transform().position_2d() - Vec2::new(0.0, 0.25)).length() < 1e-4);
    assert!((actor.transform().rotation_2d() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
}

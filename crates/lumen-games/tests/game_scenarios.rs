//! End-to-end scenarios for the reference games, run headless.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use lumen_engine::prelude::*;
use lumen_games::prelude::*;
use lumen_games::tower_defense::TowerFire;

const DT: f32 = 1.0 / 60.0;

fn still_rocks() -> AsteroidsConfig {
    AsteroidsConfig {
        asteroid_count: 0,
        asteroid_speed: 0.0,
        ..Default::default()
    }
}

fn scripted_input(frame: u32) -> InputState {
    let mut input = InputState::default();
    input.set_key(Key::W, frame % 90 < 30);
    input.set_key(Key::A, frame % 50 < 10);
    input.set_key(Key::Space, frame % 20 == 0);
    input
}

#[test]
fn same_seed_and_inputs_give_the_same_hash() {
    let run = |seed: u64| {
        let mut game = Asteroids::headless(AsteroidsConfig {
            seed,
            ..Default::default()
        });
        for frame in 0..180 {
            game.frame(&scripted_input(frame), DT);
        }
        game.snapshot()
    };
    let a = run(11);
    let b = run(11);
    assert_eq!(a, b);
    assert_ne!(a.hash, run(12).hash);
}

#[test]
fn tower_defense_is_deterministic() {
    let run = || {
        let mut game = TowerDefense::headless(TowerDefenseConfig::default());
        game.build_tower(Cell::new(2, 2)).unwrap();
        game.build_tower(Cell::new(8, 4)).unwrap();
        game.game_mut().run_frames(300, &InputState::default(), DT);
        game.snapshot().hash
    };
    assert_eq!(run(), run());
}

#[test]
fn laser_destroys_asteroid_and_itself() {
    let mut game = Asteroids::headless(still_rocks());
    let rock = game.spawn_asteroid(Vec2::new(512.0, 600.0), 0.0);

    let mut fire = InputState::default();
    fire.set_key(Key::Space, true);
    game.frame(&fire, DT);
    assert_eq!(game.laser_count(), 1);

    let idle = InputState::default();
    for _ in 0..30 {
        game.frame(&idle, DT);
    }
    assert!(!game.world().is_alive(rock));
    assert_eq!(game.asteroid_count(), 0);
    assert_eq!(game.laser_count(), 0);
    assert!(!game.ship_is_dead());
}

#[test]
fn ship_dies_on_contact_and_respawns() {
    let mut game = Asteroids::headless(still_rocks());
    let rock = game.spawn_asteroid(Vec2::new(520.0, 400.0), 0.0);
    let idle = InputState::default();

    game.frame(&idle, DT);
    assert!(game.ship_is_dead());
    let sprite = game
        .world()
        .get(game.ship())
        .unwrap()
        .component::<SpriteComponent>()
        .unwrap();
    assert!(sprite.texture().is_none(), "wreck is not drawn");

    // Dead ships cannot fire.
    let mut fire = InputState::default();
    fire.set_key(Key::Space, true);
    game.frame(&fire, DT);
    assert_eq!(game.laser_count(), 0);

    game.game_mut()
        .world_mut()
        .set_state(rock, ActorState::Dead)
        .unwrap();
    for _ in 0..130 {
        game.frame(&idle, DT);
    }
    assert!(!game.ship_is_dead());
    let ship = game.world().get(game.ship()).unwrap();
    assert_eq!(ship.transform().position_2d(), Vec2::new(512.0, 384.0));
    assert!((ship.transform().rotation_2d() - FRAC_PI_2).abs() < 1e-5);
    assert_eq!(
        ship.component::<SpriteComponent>().unwrap().texture().map(|t| t.name.as_str()),
        Some("Assets/Ship.png")
    );
}

#[test]
fn thrust_swaps_the_ship_texture() {
    let mut game = Asteroids::headless(still_rocks());
    let mut thrust = InputState::default();
    thrust.set_key(Key::W, true);
    game.frame(&thrust, DT);

    let ship = game.world().get(game.ship()).unwrap();
    let texture = ship.component::<SpriteComponent>().unwrap().texture().unwrap();
    assert_eq!(texture.name, "Assets/ShipWithThrust.png");
    assert!(ship.transform().position_2d().y > 384.0);
}

#[test]
fn enemy_walks_the_path_and_dies_at_the_end() {
    let mut game = TowerDefense::headless(TowerDefenseConfig::default());
    let idle = InputState::default();
    game.frame(&idle, DT);
    let enemy = game
        .snapshot()
        .actors
        .iter()
        .find(|a| a.kind == "enemy")
        .map(|a| a.id)
        .unwrap();

    game.game_mut().run_frames(200, &idle, DT);
    let position = game.world().get(enemy).unwrap().transform().position_2d();
    assert!((position.y - 384.0).abs() < 1e-3);
    assert!(position.x > 450.0 && position.x < 560.0);

    game.game_mut().run_frames(220, &idle, DT);
    assert!(!game.world().is_alive(enemy));
}

#[test]
fn tower_shoots_the_nearest_enemy_in_range() {
    let mut game = TowerDefense::headless(TowerDefenseConfig::default());
    let tower = game.build_tower(Cell::new(2, 2)).unwrap();
    assert_eq!(game.tower_count(), 1);

    // Nothing can reach the end tile in this many frames.
    game.game_mut().run_frames(240, &InputState::default(), DT);

    let ai = game
        .world()
        .get(tower)
        .unwrap()
        .component::<AIComponent>()
        .unwrap();
    assert!(ai.state::<TowerFire>("Fire").unwrap().shots() >= 1);
    let killed = game.enemies_spawned() as usize - game.enemy_count();
    assert!(killed >= 1, "spawned {}, alive {}", game.enemies_spawned(), game.enemy_count());
}

#[test]
fn enemies_route_around_towers() {
    // Harmless towers, so every missing enemy walked off the end.
    let mut game = TowerDefense::headless(TowerDefenseConfig {
        attack_range: 0.0,
        ..Default::default()
    });
    game.build_tower(Cell::new(5, 3)).unwrap();
    assert_eq!(
        game.build_tower(Cell::new(5, 3)).unwrap_err(),
        TowerError::Occupied
    );
    let blocked = game.grid().node_at(Cell::new(5, 3)).unwrap();
    assert!(!game.grid().path().contains(&blocked));

    let idle = InputState::default();
    game.game_mut().run_frames(480, &idle, DT);
    assert!(game.enemies_spawned() >= 5);
    assert!(game.enemy_count() < game.enemies_spawned() as usize);
}

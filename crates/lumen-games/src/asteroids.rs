//! An asteroids game built only from engine components.
//!
//! The ship is force driven through an [`InputComponent`] and wraps around
//! the screen like the asteroids do. Fire spawns lasers mid-frame; they join
//! the world on the next frame through the pending queue. Collisions are
//! circle tests between actors found by their behavior type.
//!
//! ```
//! use lumen_games::asteroids::{Asteroids, AsteroidsConfig};
//! use lumen_engine::prelude::*;
//!
//! let mut game = Asteroids::headless(AsteroidsConfig { seed: 7, ..Default::default() });
//! assert_eq!(game.asteroid_count(), 20);
//! game.frame(&InputState::default(), 1.0 / 60.0);
//! ```

use std::f32::consts::{FRAC_PI_2, TAU};
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use lumen_ecs::actor::{Actor, ActorBehavior, ActorState};
use lumen_ecs::entity::EntityId;
use lumen_ecs::input::{InputState, Key};
use lumen_ecs::math::near_zero;
use lumen_ecs::world::{HousekeepingReport, World};
use lumen_engine::assets::{AssetCache, AssetLoader, StaticTextureLoader, Texture};
use lumen_engine::audio::{AudioComponent, AudioSystem, HeadlessAudio};
use lumen_engine::collision::{actor_circle, intersect, CircleComponent};
use lumen_engine::game_loop::{GameLoop, LoopConfig};
use lumen_engine::movement::{InputComponent, InputLimits, KeyBindings, MoveComponent, ScreenWrap};
use lumen_engine::sprite::SpriteComponent;

use crate::snapshot::WorldSnapshot;

pub const SHIP_TEXTURE: &str = "Assets/Ship.png";
pub const SHIP_THRUST_TEXTURE: &str = "Assets/ShipWithThrust.png";
pub const ASTEROID_TEXTURE: &str = "Assets/Asteroid.png";
pub const LASER_TEXTURE: &str = "Assets/Laser.png";
pub const LASER_SOUND: &str = "Laser";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidsConfig {
    /// Seed for asteroid placement.
    pub seed: u64,
    pub asteroid_count: usize,
    pub asteroid_speed: f32,
    pub asteroid_radius: f32,
    pub ship_radius: f32,
    pub ship_mass: f32,
    pub ship_spawn: Vec2,
    pub ship_limits: InputLimits,
    pub bindings: KeyBindings,
    pub fire_key: Key,
    pub laser_speed: f32,
    pub laser_radius: f32,
    /// Seconds before an unspent laser disappears.
    pub laser_lifetime: f32,
    /// Seconds between shots.
    pub laser_cooldown: f32,
    /// Seconds a destroyed ship waits before respawning.
    pub respawn_delay: f32,
    pub bounds: ScreenWrap,
}

impl Default for AsteroidsConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            asteroid_count: 20,
            asteroid_speed: 150.0,
            asteroid_radius: 40.0,
            ship_radius: 40.0,
            ship_mass: 1.0,
            ship_spawn: Vec2::new(512.0, 384.0),
            ship_limits: InputLimits::default(),
            bindings: KeyBindings::default(),
            fire_key: Key::Space,
            laser_speed: 800.0,
            laser_radius: 11.0,
            laser_lifetime: 1.0,
            laser_cooldown: 0.5,
            respawn_delay: 2.0,
            bounds: ScreenWrap::default(),
        }
    }
}

/// Texture handles shared by every actor of a kind. Missing textures stay
/// `None` and their sprites draw nothing.
#[derive(Debug, Clone, Default)]
pub struct AsteroidsTextures {
    pub ship: Option<Rc<Texture>>,
    pub ship_thrust: Option<Rc<Texture>>,
    pub asteroid: Option<Rc<Texture>>,
    pub laser: Option<Rc<Texture>>,
}

impl AsteroidsTextures {
    pub fn load(cache: &mut AssetCache<Texture>, loader: &mut dyn AssetLoader<Texture>) -> Self {
        let mut get = |name: &str| cache.get_or_load(name, &mut *loader).ok();
        Self {
            ship: get(SHIP_TEXTURE),
            ship_thrust: get(SHIP_THRUST_TEXTURE),
            asteroid: get(ASTEROID_TEXTURE),
            laser: get(LASER_TEXTURE),
        }
    }

    /// A loader that knows every texture the game uses.
    pub fn headless_loader() -> StaticTextureLoader {
        StaticTextureLoader::new()
            .with_texture(SHIP_TEXTURE, 64, 64)
            .with_texture(SHIP_THRUST_TEXTURE, 64, 64)
            .with_texture(ASTEROID_TEXTURE, 86, 86)
            .with_texture(LASER_TEXTURE, 22, 22)
    }
}

// ---------------------------------------------------------------------------
// Behaviors
// ---------------------------------------------------------------------------

/// Marks an actor as an asteroid.
#[derive(Debug, Default)]
pub struct Asteroid;

impl ActorBehavior for Asteroid {}

/// First live asteroid overlapping `actor`'s circle.
fn hit_asteroid(actor: &Actor, world: &World) -> Option<EntityId> {
    let circle = actor_circle(actor)?;
    world
        .actors()
        .filter(|a| a.state() != ActorState::Dead && a.behavior::<Asteroid>().is_some())
        .find(|a| actor_circle(a).is_some_and(|other| intersect(&circle, &other)))
        .map(Actor::id)
}

#[derive(Debug)]
pub struct Laser {
    remaining: f32,
}

impl Laser {
    pub fn new(lifetime: f32) -> Self {
        Self {
            remaining: lifetime,
        }
    }
}

impl ActorBehavior for Laser {
    fn update_actor(&mut self, actor: &mut Actor, world: &mut World, dt: f32) {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            actor.set_state(ActorState::Dead);
            return;
        }
        if let Some(asteroid) = hit_asteroid(actor, world) {
            tracing::debug!(laser = %actor.id(), %asteroid, "laser hit asteroid");
            if let Err(err) = world.set_state(asteroid, ActorState::Dead) {
                tracing::warn!(%asteroid, error = %err, "could not kill target");
            }
            actor.set_state(ActorState::Dead);
        }
    }
}

#[derive(Debug)]
pub struct Ship {
    config: AsteroidsConfig,
    textures: AsteroidsTextures,
    cooldown: f32,
    reset_timer: f32,
    dead: bool,
}

impl Ship {
    pub fn new(config: AsteroidsConfig, textures: AsteroidsTextures) -> Self {
        let reset_timer = config.respawn_delay;
        Self {
            config,
            textures,
            cooldown: 0.0,
            reset_timer,
            dead: false,
        }
    }

    /// Destroyed and waiting to respawn.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    fn set_texture(actor: &mut Actor, texture: Option<Rc<Texture>>) {
        if let Some(sprite) = actor.component_mut::<SpriteComponent>() {
            sprite.set_texture(texture);
        }
    }

    fn die(&mut self, actor: &mut Actor) {
        tracing::info!(ship = %actor.id(), "ship destroyed");
        self.dead = true;
        Self::set_texture(actor, None);
    }

    fn revive(&mut self, actor: &mut Actor) {
        self.reset_timer = self.config.respawn_delay;
        self.cooldown = 0.0;
        self.dead = false;
        let transform = actor.transform_mut();
        transform.set_position_2d(self.config.ship_spawn);
        transform.set_rotation_2d(FRAC_PI_2);
        if let Some(control) = actor.component_mut::<InputComponent>() {
            control.movement_mut().stop();
        }
        Self::set_texture(actor, self.textures.ship.clone());
        tracing::info!(ship = %actor.id(), "ship respawned");
    }
}

impl ActorBehavior for Ship {
    fn actor_input(&mut self, actor: &mut Actor, world: &mut World, input: &InputState) {
        if self.dead || self.cooldown > 0.0 || !input.keyboard.key_value(self.config.fire_key) {
            return;
        }
        let transform = actor.transform();
        spawn_laser(
            world,
            &self.config,
            &self.textures,
            transform.position_2d(),
            transform.rotation_2d(),
        );
        actor.with_component::<AudioComponent, _>(world, |audio, ctx| {
            audio.play_event(ctx.transform(), LASER_SOUND)
        });
        self.cooldown = self.config.laser_cooldown;
    }

    fn update_actor(&mut self, actor: &mut Actor, world: &mut World, dt: f32) {
        if self.reset_timer <= 0.0 {
            self.revive(actor);
        } else if self.dead {
            self.reset_timer -= dt;
            return;
        }

        self.cooldown -= dt;

        let thrusting = actor
            .component::<InputComponent>()
            .is_some_and(|c| !near_zero(c.movement().velocity().length_squared()));
        let texture = if thrusting {
            self.textures.ship_thrust.clone()
        } else {
            self.textures.ship.clone()
        };
        Self::set_texture(actor, texture);

        if hit_asteroid(actor, world).is_some() {
            self.die(actor);
        }
    }
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

fn spawn_asteroid(
    world: &mut World,
    config: &AsteroidsConfig,
    textures: &AsteroidsTextures,
    position: Vec2,
    rotation: f32,
) -> EntityId {
    let id = world.spawn_with_behavior(Asteroid);
    if let Ok(actor) = world.get_mut(id) {
        actor.transform_mut().set_position_2d(position);
        actor.transform_mut().set_rotation_2d(rotation);
    }
    let mut mover = MoveComponent::direct().with_screen_wrap(config.bounds);
    mover.set_forward_speed(config.asteroid_speed);
    add_components(
        world,
        id,
        mover,
        config.asteroid_radius,
        SpriteComponent::default().with_texture(textures.asteroid.clone()),
    );
    id
}

fn spawn_laser(
    world: &mut World,
    config: &AsteroidsConfig,
    textures: &AsteroidsTextures,
    position: Vec2,
    rotation: f32,
) -> EntityId {
    let id = world.spawn_with_behavior(Laser::new(config.laser_lifetime));
    if let Ok(actor) = world.get_mut(id) {
        actor.transform_mut().set_position_2d(position);
        actor.transform_mut().set_rotation_2d(rotation);
    }
    let mut mover = MoveComponent::direct();
    mover.set_forward_speed(config.laser_speed);
    add_components(
        world,
        id,
        mover,
        config.laser_radius,
        SpriteComponent::default().with_texture(textures.laser.clone()),
    );
    id
}

fn add_components(
    world: &mut World,
    id: EntityId,
    mover: MoveComponent,
    radius: f32,
    sprite: SpriteComponent,
) {
    let attached = world
        .add_component(id, mover)
        .and_then(|_| world.add_component(id, CircleComponent::new(radius)))
        .and_then(|_| world.add_component(id, sprite));
    if let Err(err) = attached {
        tracing::warn!(entity = %id, error = %err, "could not attach components");
    }
}

fn spawn_ship(
    world: &mut World,
    config: &AsteroidsConfig,
    textures: &AsteroidsTextures,
    audio: Rc<dyn AudioSystem>,
) -> EntityId {
    let id = world.spawn_with_behavior(Ship::new(config.clone(), textures.clone()));
    if let Ok(actor) = world.get_mut(id) {
        actor.transform_mut().set_position_2d(config.ship_spawn);
        actor.transform_mut().set_rotation_2d(FRAC_PI_2);
    }
    let control = InputComponent::new(
        MoveComponent::force(config.ship_mass).with_screen_wrap(config.bounds),
        config.bindings,
        config.ship_limits,
    );
    let attached = world
        .add_component(id, control)
        .and_then(|_| world.add_component(id, CircleComponent::new(config.ship_radius)))
        .and_then(|_| {
            world.add_component(
                id,
                SpriteComponent::new(150).with_texture(textures.ship.clone()),
            )
        })
        .and_then(|_| world.add_component(id, AudioComponent::new(audio)));
    if let Err(err) = attached {
        tracing::warn!(entity = %id, error = %err, "could not attach ship components");
    }
    id
}

/// Label for snapshots.
pub fn classify(actor: &Actor) -> &'static str {
    if actor.behavior::<Ship>().is_some() {
        "ship"
    } else if actor.behavior::<Asteroid>().is_some() {
        "asteroid"
    } else if actor.behavior::<Laser>().is_some() {
        "laser"
    } else {
        "other"
    }
}

// ---------------------------------------------------------------------------
// Asteroids
// ---------------------------------------------------------------------------

pub struct Asteroids {
    game: GameLoop,
    config: AsteroidsConfig,
    textures: AsteroidsTextures,
    ship: EntityId,
}

impl Asteroids {
    pub fn new(
        config: AsteroidsConfig,
        loop_config: LoopConfig,
        textures: AsteroidsTextures,
        audio: Rc<dyn AudioSystem>,
    ) -> Self {
        let mut world = World::new();
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let ship = spawn_ship(&mut world, &config, &textures, audio);
        let bounds = config.bounds;
        for _ in 0..config.asteroid_count {
            let position = Vec2::new(
                rng.gen_range(bounds.min.x..bounds.max.x),
                rng.gen_range(bounds.min.y..bounds.max.y),
            );
            let rotation = rng.gen_range(0.0..TAU);
            spawn_asteroid(&mut world, &config, &textures, position, rotation);
        }
        tracing::info!(
            seed = config.seed,
            asteroids = config.asteroid_count,
            "asteroids world ready"
        );
        Self {
            game: GameLoop::new(world, loop_config),
            config,
            textures,
            ship,
        }
    }

    /// Headless setup with the stock texture table and silent audio.
    pub fn headless(config: AsteroidsConfig) -> Self {
        let mut cache = AssetCache::new();
        let mut loader = AsteroidsTextures::headless_loader();
        let textures = AsteroidsTextures::load(&mut cache, &mut loader);
        let loop_config = LoopConfig {
            headless: true,
            ..Default::default()
        };
        Self::new(config, loop_config, textures, Rc::new(HeadlessAudio::new()))
    }

    pub fn frame(&mut self, input: &InputState, dt: f32) -> HousekeepingReport {
        self.game.frame(input, dt)
    }

    /// Add an asteroid outside the seeded field.
    pub fn spawn_asteroid(&mut self, position: Vec2, rotation: f32) -> EntityId {
        spawn_asteroid(
            self.game.world_mut(),
            &self.config,
            &self.textures,
            position,
            rotation,
        )
    }

    pub fn config(&self) -> &AsteroidsConfig {
        &self.config
    }

    pub fn game(&self) -> &GameLoop {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameLoop {
        &mut self.game
    }

    pub fn world(&self) -> &World {
        self.game.world()
    }

    pub fn ship(&self) -> EntityId {
        self.ship
    }

    pub fn ship_is_dead(&self) -> bool {
        self.world()
            .get(self.ship)
            .ok()
            .and_then(|a| a.behavior::<Ship>())
            .is_some_and(Ship::is_dead)
    }

    fn count<B: ActorBehavior>(&self) -> usize {
        self.world()
            .actors()
            .filter(|a| a.behavior::<B>().is_some())
            .count()
    }

    pub fn asteroid_count(&self) -> usize {
        self.count::<Asteroid>()
    }

    pub fn laser_count(&self) -> usize {
        self.count::<Laser>()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.world(), self.game.frame_count(), classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_sky() -> AsteroidsConfig {
        AsteroidsConfig {
            asteroid_count: 0,
            ..Default::default()
        }
    }

    #[test]
    fn seeded_placement_is_reproducible() {
        let a = Asteroids::headless(AsteroidsConfig { seed: 3, ..Default::default() });
        let b = Asteroids::headless(AsteroidsConfig { seed: 3, ..Default::default() });
        let c = Asteroids::headless(AsteroidsConfig { seed: 4, ..Default::default() });
        assert_eq!(a.snapshot().hash, b.snapshot().hash);
        assert_ne!(a.snapshot().hash, c.snapshot().hash);
        assert_eq!(a.snapshot().count("asteroid"), 20);
        assert_eq!(a.snapshot().count("ship"), 1);
    }

    #[test]
    fn firing_respects_cooldown() {
        let mut game = Asteroids::headless(empty_sky());
        let mut fire = InputState::default();
        fire.set_key(Key::Space, true);

        game.frame(&fire, 0.016);
        assert_eq!(game.laser_count(), 1, "laser joins through the pending queue");
        game.frame(&fire, 0.016);
        assert_eq!(game.laser_count(), 1);
        for _ in 0..40 {
            game.frame(&fire, 0.016);
        }
        assert_eq!(game.laser_count(), 2);
    }

    #[test]
    fn lasers_expire() {
        let mut game = Asteroids::headless(empty_sky());
        let mut fire = InputState::default();
        fire.set_key(Key::Space, true);
        game.frame(&fire, 0.016);
        let idle = InputState::default();
        for _ in 0..25 {
            game.frame(&idle, 0.05);
        }
        assert_eq!(game.laser_count(), 0);
    }
}

//! A tower defense game on a tile grid.
//!
//! Enemies spawn on the start tile and follow the grid's next-hop table to
//! the end tile, where they die. The table comes from an A* search run from
//! the end back to the start, so each tile's parent edge points one step
//! closer to the goal. Towers block their tile; a placement that would cut
//! the path is rolled back. Towers idle in a "Rest" state and periodically
//! switch to "Fire", which shoots at the nearest enemy in range.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lumen_ecs::actor::{Actor, ActorBehavior, ActorState};
use lumen_ecs::draw::DrawOrder;
use lumen_ecs::entity::EntityId;
use lumen_ecs::input::InputState;
use lumen_ecs::math::{heading_angle, near_zero_within};
use lumen_ecs::world::{HousekeepingReport, World};
use lumen_engine::ai::{AIComponent, AIState, AiContext};
use lumen_engine::assets::{AssetCache, AssetLoader, StaticTextureLoader, Texture};
use lumen_engine::collision::{actor_circle, intersect, CircleComponent};
use lumen_engine::game_loop::{GameLoop, LoopConfig};
use lumen_engine::movement::MoveComponent;
use lumen_engine::navigation::{NavComponent, PathGraph};
use lumen_engine::sprite::SpriteComponent;
use lumen_search::graph::{GridLayout, NodeId, WeightedGraph};
use lumen_search::pathfinder::astar;

use crate::snapshot::WorldSnapshot;

pub const TOWER_TEXTURE: &str = "Assets/Tower.png";
pub const ENEMY_TEXTURE: &str = "Assets/Airplane.png";
pub const BULLET_TEXTURE: &str = "Assets/Projectile.png";

/// Draw order for towers, in front of enemies and bullets.
pub const TOWER_DRAW_ORDER: DrawOrder = 200;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub column: usize,
    pub row: usize,
}

impl Cell {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerDefenseConfig {
    pub rows: usize,
    pub columns: usize,
    pub tile_size: f32,
    /// Center of the top-left tile.
    pub origin: Vec2,
    pub start: Cell,
    pub end: Cell,
    /// Seconds between enemy spawns.
    pub spawn_interval: f32,
    pub enemy_speed: f32,
    pub enemy_radius: f32,
    pub enemy_arrive_radius: f32,
    /// Distance from the end tile at which an enemy counts as through.
    pub goal_radius: f32,
    /// Seconds a tower rests between shots.
    pub attack_time: f32,
    pub attack_range: f32,
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    pub bullet_lifetime: f32,
}

impl Default for TowerDefenseConfig {
    fn default() -> Self {
        Self {
            rows: 7,
            columns: 16,
            tile_size: 64.0,
            origin: Vec2::new(32.0, 192.0),
            start: Cell::new(0, 3),
            end: Cell::new(15, 3),
            spawn_interval: 1.5,
            enemy_speed: 150.0,
            enemy_radius: 25.0,
            enemy_arrive_radius: 2.0,
            goal_radius: 10.0,
            attack_time: 2.5,
            attack_range: 100.0,
            bullet_speed: 400.0,
            bullet_radius: 5.0,
            bullet_lifetime: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TowerDefenseTextures {
    pub tower: Option<Rc<Texture>>,
    pub enemy: Option<Rc<Texture>>,
    pub bullet: Option<Rc<Texture>>,
}

impl TowerDefenseTextures {
    pub fn load(cache: &mut AssetCache<Texture>, loader: &mut dyn AssetLoader<Texture>) -> Self {
        let mut get = |name: &str| cache.get_or_load(name, &mut *loader).ok();
        Self {
            tower: get(TOWER_TEXTURE),
            enemy: get(ENEMY_TEXTURE),
            bullet: get(BULLET_TEXTURE),
        }
    }

    pub fn headless_loader() -> StaticTextureLoader {
        StaticTextureLoader::new()
            .with_texture(TOWER_TEXTURE, 64, 64)
            .with_texture(ENEMY_TEXTURE, 64, 64)
            .with_texture(BULLET_TEXTURE, 10, 10)
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TowerError {
    #[error("cell ({column}, {row}) is outside the grid")]
    OutOfBounds { column: usize, row: usize },

    #[error("cannot build on the start or end tile")]
    Endpoint,

    #[error("cell already holds a tower")]
    Occupied,

    #[error("a tower there would leave no path from start to end")]
    BlocksPath,
}

/// Tiles, blocked flags and the next-hop table enemies navigate by.
///
/// Shared between the game and every enemy's [`NavComponent`], so the
/// mutable parts sit behind `RefCell`s.
#[derive(Debug)]
pub struct Grid {
    layout: GridLayout,
    tile_size: f32,
    origin: Vec2,
    start: NodeId,
    end: NodeId,
    blocked: RefCell<Vec<bool>>,
    next_hops: RefCell<Vec<Option<NodeId>>>,
}

impl Grid {
    pub fn new(config: &TowerDefenseConfig) -> Self {
        let layout = GridLayout::new(config.columns, config.rows);
        let in_bounds = |c: Cell| c.column < config.columns && c.row < config.rows;
        assert!(
            in_bounds(config.start) && in_bounds(config.end),
            "start and end tiles must lie on the grid"
        );
        assert!(config.start != config.end, "start and end tiles must differ");
        let grid = Self {
            layout,
            tile_size: config.tile_size,
            origin: config.origin,
            start: layout.node(config.start.column, config.start.row),
            end: layout.node(config.end.column, config.end.row),
            blocked: RefCell::new(vec![false; layout.node_count()]),
            next_hops: RefCell::new(vec![None; layout.node_count()]),
        };
        grid.find_path();
        grid
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn node_at(&self, cell: Cell) -> Option<NodeId> {
        (cell.column < self.layout.width && cell.row < self.layout.height)
            .then(|| self.layout.node(cell.column, cell.row))
    }

    pub fn tile_position(&self, node: NodeId) -> Vec2 {
        let (column, row) = self.layout.coords(node);
        self.origin + Vec2::new(column as f32, row as f32) * self.tile_size
    }

    pub fn is_blocked(&self, node: NodeId) -> bool {
        self.blocked.borrow().get(node.0).copied().unwrap_or(true)
    }

    /// Tiles from start to end along the current next-hop table.
    pub fn path(&self) -> Vec<NodeId> {
        let mut path = vec![self.start];
        let mut current = self.start;
        while let Some(next) = self.next_hop(current) {
            path.push(next);
            current = next;
            if path.len() > self.layout.node_count() {
                break;
            }
        }
        path
    }

    /// Rebuild the next-hop table. Returns `false`, leaving the table as it
    /// was, when the end cannot reach the start.
    fn find_path(&self) -> bool {
        let layout = self.layout;
        let map = {
            let blocked = self.blocked.borrow();
            let graph = WeightedGraph::grid(layout, |x, y| blocked[layout.node(x, y).0]);
            astar(&graph, self.end, self.start, |a: NodeId, b: NodeId| {
                layout.manhattan(a, b)
            })
        };
        let Some(path) = map.found.then(|| map.path_to(self.end, self.start)).flatten() else {
            return false;
        };

        let mut hops = self.next_hops.borrow_mut();
        hops.fill(None);
        for pair in path.windows(2) {
            hops[pair[1].0] = Some(pair[0]);
        }
        tracing::debug!(tiles = path.len(), visited = map.visited(), "grid path rebuilt");
        true
    }

    /// Block `cell` for a tower. Fails without side effects if the cell is
    /// unusable or blocking it would cut the path.
    pub fn block(&self, cell: Cell) -> Result<NodeId, TowerError> {
        let node = self.node_at(cell).ok_or(TowerError::OutOfBounds {
            column: cell.column,
            row: cell.row,
        })?;
        if node == self.start || node == self.end {
            return Err(TowerError::Endpoint);
        }
        if self.is_blocked(node) {
            return Err(TowerError::Occupied);
        }

        self.blocked.borrow_mut()[node.0] = true;
        if !self.find_path() {
            self.blocked.borrow_mut()[node.0] = false;
            tracing::debug!(column = cell.column, row = cell.row, "tower would block the path");
            return Err(TowerError::BlocksPath);
        }
        Ok(node)
    }
}

impl PathGraph for Grid {
    fn node_position(&self, node: NodeId) -> Option<Vec2> {
        (node.0 < self.layout.node_count()).then(|| self.tile_position(node))
    }

    fn next_hop(&self, node: NodeId) -> Option<NodeId> {
        self.next_hops.borrow().get(node.0).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Enemy;

impl ActorBehavior for Enemy {}

/// Walks the path until close to `goal`.
#[derive(Debug)]
pub struct EnemyMove {
    goal: Vec2,
    goal_radius: f32,
}

impl AIState for EnemyMove {
    fn name(&self) -> &str {
        "Move"
    }

    fn update(&mut self, ctx: &mut AiContext<'_, '_>, _dt: f32) {
        let distance = ctx.transform().position_2d().distance(self.goal);
        if near_zero_within(distance, self.goal_radius) {
            ctx.change_state("Death");
        }
    }
}

#[derive(Debug)]
pub struct EnemyDeath;

impl AIState for EnemyDeath {
    fn name(&self) -> &str {
        "Death"
    }

    fn on_enter(&mut self, ctx: &mut AiContext<'_, '_>) {
        tracing::debug!(enemy = %ctx.id(), "enemy reached the end");
        ctx.set_state(ActorState::Dead);
    }
}

/// Lives on the grid actor and releases an enemy every `interval` seconds.
#[derive(Debug)]
pub struct EnemySpawner {
    grid: Rc<Grid>,
    config: TowerDefenseConfig,
    texture: Option<Rc<Texture>>,
    next_enemy: f32,
    spawned: u32,
}

impl EnemySpawner {
    pub fn new(grid: Rc<Grid>, config: TowerDefenseConfig, texture: Option<Rc<Texture>>) -> Self {
        Self {
            grid,
            config,
            texture,
            next_enemy: 0.0,
            spawned: 0,
        }
    }

    /// Enemies released so far.
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    fn spawn_enemy(&mut self, world: &mut World) -> EntityId {
        let grid = &self.grid;
        let config = &self.config;
        let id = world.spawn_with_behavior(Enemy);
        if let Ok(actor) = world.get_mut(id) {
            actor
                .transform_mut()
                .set_position_2d(grid.tile_position(grid.start()));
        }

        let graph: Rc<dyn PathGraph> = Rc::clone(grid) as Rc<dyn PathGraph>;
        let nav = NavComponent::new(graph, config.enemy_speed)
            .with_start(grid.start())
            .with_arrive_radius(config.enemy_arrive_radius);
        let mut ai = AIComponent::new().with_initial_state("Move");
        ai.register_state(EnemyMove {
            goal: grid.tile_position(grid.end()),
            goal_radius: config.goal_radius,
        });
        ai.register_state(EnemyDeath);

        let attached = world
            .add_component(id, SpriteComponent::default().with_texture(self.texture.clone()))
            .and_then(|_| world.add_component(id, nav))
            .and_then(|_| world.add_component(id, CircleComponent::new(config.enemy_radius)))
            .and_then(|_| world.add_component(id, ai));
        if let Err(err) = attached {
            tracing::warn!(entity = %id, error = %err, "could not attach enemy components");
        }
        self.spawned += 1;
        tracing::debug!(enemy = %id, spawned = self.spawned, "enemy spawned");
        id
    }
}

impl ActorBehavior for EnemySpawner {
    fn update_actor(&mut self, _actor: &mut Actor, world: &mut World, dt: f32) {
        self.next_enemy -= dt;
        if self.next_enemy <= 0.0 {
            self.spawn_enemy(world);
            self.next_enemy += self.config.spawn_interval;
        }
    }
}

// ---------------------------------------------------------------------------
// Towers and bullets
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Tower;

impl ActorBehavior for Tower {}

#[derive(Debug, Clone)]
struct BulletParams {
    speed: f32,
    radius: f32,
    lifetime: f32,
    texture: Option<Rc<Texture>>,
}

#[derive(Debug)]
pub struct Bullet {
    remaining: f32,
}

impl Bullet {
    pub fn new(lifetime: f32) -> Self {
        Self {
            remaining: lifetime,
        }
    }
}

impl ActorBehavior for Bullet {
    fn update_actor(&mut self, actor: &mut Actor, world: &mut World, dt: f32) {
        if let Some(circle) = actor_circle(actor) {
            let hit = world
                .actors()
                .filter(|a| a.state() != ActorState::Dead && a.behavior::<Enemy>().is_some())
                .find(|a| actor_circle(a).is_some_and(|other| intersect(&circle, &other)))
                .map(Actor::id);
            if let Some(enemy) = hit {
                tracing::debug!(bullet = %actor.id(), %enemy, "bullet hit enemy");
                if let Err(err) = world.set_state(enemy, ActorState::Dead) {
                    tracing::warn!(%enemy, error = %err, "could not kill target");
                }
                actor.set_state(ActorState::Dead);
            }
        }

        self.remaining -= dt;
        if self.remaining <= 0.0 {
            actor.set_state(ActorState::Dead);
        }
    }
}

fn spawn_bullet(world: &mut World, params: &BulletParams, position: Vec2, rotation: f32) -> EntityId {
    let id = world.spawn_with_behavior(Bullet::new(params.lifetime));
    if let Ok(actor) = world.get_mut(id) {
        actor.transform_mut().set_position_2d(position);
        actor.transform_mut().set_rotation_2d(rotation);
    }
    let mut mover = MoveComponent::direct();
    mover.set_forward_speed(params.speed);
    let attached = world
        .add_component(id, mover)
        .and_then(|_| world.add_component(id, CircleComponent::new(params.radius)))
        .and_then(|_| {
            world.add_component(id, SpriteComponent::default().with_texture(params.texture.clone()))
        });
    if let Err(err) = attached {
        tracing::warn!(entity = %id, error = %err, "could not attach bullet components");
    }
    id
}

/// Counts down to the next shot.
#[derive(Debug)]
pub struct TowerRest {
    attack_time: f32,
    next_attack: f32,
}

impl TowerRest {
    pub fn new(attack_time: f32) -> Self {
        Self {
            attack_time,
            next_attack: attack_time,
        }
    }

    pub fn next_attack(&self) -> f32 {
        self.next_attack
    }
}

impl AIState for TowerRest {
    fn name(&self) -> &str {
        "Rest"
    }

    fn update(&mut self, ctx: &mut AiContext<'_, '_>, dt: f32) {
        self.next_attack -= dt;
        if self.next_attack <= 0.0 {
            ctx.change_state("Fire");
            self.next_attack += self.attack_time;
        }
    }
}

/// Shoots once at the nearest enemy in range, then rests.
#[derive(Debug)]
pub struct TowerFire {
    range: f32,
    bullet: BulletParams,
    shots: u32,
}

impl TowerFire {
    pub fn shots(&self) -> u32 {
        self.shots
    }
}

/// Live enemy closest to `position`. The first one found wins ties.
fn nearest_enemy(world: &World, position: Vec2) -> Option<Vec2> {
    let mut best: Option<(f32, Vec2)> = None;
    for actor in world.actors() {
        if actor.state() == ActorState::Dead || actor.behavior::<Enemy>().is_none() {
            continue;
        }
        let at = actor.transform().position_2d();
        let distance_sq = position.distance_squared(at);
        if best.map_or(true, |(d, _)| distance_sq < d) {
            best = Some((distance_sq, at));
        }
    }
    best.map(|(_, at)| at)
}

impl AIState for TowerFire {
    fn name(&self) -> &str {
        "Fire"
    }

    fn update(&mut self, ctx: &mut AiContext<'_, '_>, _dt: f32) {
        let position = ctx.transform().position_2d();
        if let Some(target) = nearest_enemy(ctx.world(), position) {
            let direction = target - position;
            if direction.length() < self.range {
                let rotation = heading_angle(direction);
                ctx.transform_mut().set_rotation_2d(rotation);
                let bullet = spawn_bullet(ctx.world_mut(), &self.bullet, position, rotation);
                self.shots += 1;
                tracing::debug!(tower = %ctx.id(), %bullet, "tower fired");
            }
        }
        ctx.change_state("Rest");
    }
}

/// Label for snapshots.
pub fn classify(actor: &Actor) -> &'static str {
    if actor.behavior::<Enemy>().is_some() {
        "enemy"
    } else if actor.behavior::<Tower>().is_some() {
        "tower"
    } else if actor.behavior::<Bullet>().is_some() {
        "bullet"
    } else if actor.behavior::<EnemySpawner>().is_some() {
        "grid"
    } else {
        "other"
    }
}

// ---------------------------------------------------------------------------
// TowerDefense
// ---------------------------------------------------------------------------

pub struct TowerDefense {
    game: GameLoop,
    grid: Rc<Grid>,
    config: TowerDefenseConfig,
    textures: TowerDefenseTextures,
    spawner: EntityId,
}

impl TowerDefense {
    pub fn new(
        config: TowerDefenseConfig,
        loop_config: LoopConfig,
        textures: TowerDefenseTextures,
    ) -> Self {
        let grid = Rc::new(Grid::new(&config));
        let mut world = World::new();
        let spawner = world.spawn_with_behavior(EnemySpawner::new(
            Rc::clone(&grid),
            config.clone(),
            textures.enemy.clone(),
        ));
        tracing::info!(
            rows = config.rows,
            columns = config.columns,
            path = grid.path().len(),
            "tower defense world ready"
        );
        Self {
            game: GameLoop::new(world, loop_config),
            grid,
            config,
            textures,
            spawner,
        }
    }

    pub fn headless(config: TowerDefenseConfig) -> Self {
        let mut cache = AssetCache::new();
        let mut loader = TowerDefenseTextures::headless_loader();
        let textures = TowerDefenseTextures::load(&mut cache, &mut loader);
        let loop_config = LoopConfig {
            headless: true,
            ..Default::default()
        };
        Self::new(config, loop_config, textures)
    }

    pub fn frame(&mut self, input: &InputState, dt: f32) -> HousekeepingReport {
        self.game.frame(input, dt)
    }

    /// Place a tower on `cell` if the path survives it.
    pub fn build_tower(&mut self, cell: Cell) -> Result<EntityId, TowerError> {
        let node = self.grid.block(cell)?;
        let world = self.game.world_mut();
        let id = world.spawn_with_behavior(Tower);
        if let Ok(actor) = world.get_mut(id) {
            actor
                .transform_mut()
                .set_position_2d(self.grid.tile_position(node));
        }

        let mut ai = AIComponent::new().with_initial_state("Rest");
        ai.register_state(TowerRest::new(self.config.attack_time));
        ai.register_state(TowerFire {
            range: self.config.attack_range,
            bullet: BulletParams {
                speed: self.config.bullet_speed,
                radius: self.config.bullet_radius,
                lifetime: self.config.bullet_lifetime,
                texture: self.textures.bullet.clone(),
            },
            shots: 0,
        });
        let sprite =
            SpriteComponent::new(TOWER_DRAW_ORDER).with_texture(self.textures.tower.clone());
        let attached = world
            .add_component(id, sprite)
            .and_then(|_| world.add_component(id, ai));
        if let Err(err) = attached {
            tracing::warn!(entity = %id, error = %err, "could not attach tower components");
        }
        tracing::info!(tower = %id, column = cell.column, row = cell.row, "tower built");
        Ok(id)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &TowerDefenseConfig {
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

    /// Enemies released by the spawner so far.
    pub fn enemies_spawned(&self) -> u32 {
        self.world()
            .get(self.spawner)
            .ok()
            .and_then(|a| a.behavior::<EnemySpawner>())
            .map_or(0, EnemySpawner::spawned)
    }

    fn count<B: ActorBehavior>(&self) -> usize {
        self.world()
            .actors()
            .filter(|a| a.behavior::<B>().is_some())
            .count()
    }

    pub fn enemy_count(&self) -> usize {
        self.count::<Enemy>()
    }

    pub fn tower_count(&self) -> usize {
        self.count::<Tower>()
    }

    pub fn bullet_count(&self) -> usize {
        self.count::<Bullet>()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.world(), self.game.frame_count(), classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_grid_path_runs_straight_along_the_row() {
        let grid = Grid::new(&TowerDefenseConfig::default());
        let path = grid.path();
        assert_eq!(path.len(), 16);
        assert_eq!(path.first(), Some(&grid.start()));
        assert_eq!(path.last(), Some(&grid.end()));
        assert_eq!(grid.tile_position(grid.start()), Vec2::new(32.0, 384.0));
        assert_eq!(grid.tile_position(grid.end()), Vec2::new(992.0, 384.0));
        assert_eq!(grid.next_hop(grid.end()), None);
    }

    #[test]
    fn towers_reroute_the_path() {
        let grid = Grid::new(&TowerDefenseConfig::default());
        let node = grid.block(Cell::new(5, 3)).unwrap();
        assert!(grid.is_blocked(node));
        let path = grid.path();
        assert!(!path.contains(&node));
        assert_eq!(path.last(), Some(&grid.end()));
        assert_eq!(path.len(), 18);
    }

    #[test]
    fn rejected_placements_leave_the_grid_unchanged() {
        let config = TowerDefenseConfig::default();
        let grid = Grid::new(&config);
        assert_eq!(grid.block(Cell::new(0, 3)), Err(TowerError::Endpoint));
        assert_eq!(
            grid.block(Cell::new(16, 0)),
            Err(TowerError::OutOfBounds { column: 16, row: 0 })
        );
        for row in 0..config.rows {
            if row != 3 {
                grid.block(Cell::new(7, row)).unwrap();
            }
        }
        assert_eq!(grid.block(Cell::new(7, 2)), Err(TowerError::Occupied));
        let before = grid.path();
        assert_eq!(grid.block(Cell::new(7, 3)), Err(TowerError::BlocksPath));
        assert!(!grid.is_blocked(grid.layout().node(7, 3)));
        assert_eq!(grid.path(), before);
    }

    #[test]
    fn rest_counts_down_then_fires() {
        let mut world = World::new();
        let id = world.spawn();
        let mut ai = AIComponent::new().with_initial_state("Rest");
        ai.register_state(TowerRest::new(0.1));
        ai.register_state(TowerFire {
            range: 100.0,
            bullet: BulletParams {
                speed: 400.0,
                radius: 5.0,
                lifetime: 1.0,
                texture: None,
            },
            shots: 0,
        });
        world.add_component(id, ai).unwrap();

        world.update(0.05);
        world.update(0.06);
        let ai = world.get(id).unwrap().component::<AIComponent>().unwrap();
        assert_eq!(ai.current_state_name(), Some("Fire"));
        let rest = ai.state::<TowerRest>("Rest").unwrap();
        assert!((rest.next_attack() - 0.09).abs() < 1e-5);

        world.update(0.01);
        let ai = world.get(id).unwrap().component::<AIComponent>().unwrap();
        assert_eq!(ai.current_state_name(), Some("Rest"));
        assert_eq!(ai.state::<TowerFire>("Fire").unwrap().shots(), 0, "no enemy in range");
    }
}

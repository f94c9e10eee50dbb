//! Lumen Games -- two reference games assembled from engine components.
//!
//! [`asteroids`] exercises force and direct movement, screen wrap, input,
//! circle collision and mid-frame spawning. [`tower_defense`] exercises
//! grid pathfinding, waypoint navigation and the AI state machine. Both run
//! headless and can be summarized with a hashed [`snapshot::WorldSnapshot`].
//!
//! ```
//! use lumen_games::prelude::*;
//! use lumen_engine::prelude::InputState;
//!
//! let mut game = TowerDefense::headless(TowerDefenseConfig::default());
//! game.build_tower(Cell::new(4, 2)).unwrap();
//! game.frame(&InputState::default(), 1.0 / 60.0);
//! assert_eq!(game.enemies_spawned(), 1);
//! ```

#![deny(unsafe_code)]

pub mod asteroids;
pub mod snapshot;
pub mod tower_defense;

/// Convenience re-exports for running the games.
pub mod prelude {
    pub use crate::asteroids::{Asteroids, AsteroidsConfig, AsteroidsTextures};
    pub use crate::snapshot::{ActorSnapshot, WorldSnapshot};
    pub use crate::tower_defense::{
        Cell, Grid, TowerDefense, TowerDefenseConfig, TowerDefenseTextures, TowerError,
    };
}

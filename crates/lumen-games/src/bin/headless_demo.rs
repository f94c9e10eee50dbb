//! Runs both reference games without a window and logs a summary.
//!
//! Usage: `headless_demo [config.json]`. The optional file may override any
//! field of [`DemoConfig`].

use std::fs;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use lumen_engine::prelude::InputState;
use lumen_games::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    frames: u64,
    delta: f32,
    asteroids: AsteroidsConfig,
    tower_defense: TowerDefenseConfig,
    towers: Vec<Cell>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            delta: 1.0 / 60.0,
            asteroids: AsteroidsConfig::default(),
            tower_defense: TowerDefenseConfig::default(),
            towers: vec![Cell::new(3, 2), Cell::new(6, 4), Cell::new(9, 2), Cell::new(12, 4)],
        }
    }
}

fn load_config() -> anyhow::Result<DemoConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DemoConfig::default());
    };
    let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    anyhow::ensure!(config.delta > 0.0, "delta must be positive");
    let input = InputState::default();

    let mut asteroids = Asteroids::headless(config.asteroids.clone());
    for _ in 0..config.frames {
        asteroids.frame(&input, config.delta);
    }
    let snapshot = asteroids.snapshot();
    tracing::info!(
        frames = snapshot.frame,
        asteroids = snapshot.count("asteroid"),
        ship_dead = asteroids.ship_is_dead(),
        hash = %snapshot.hash,
        "asteroids finished"
    );

    let mut defense = TowerDefense::headless(config.tower_defense.clone());
    for &cell in &config.towers {
        if let Err(err) = defense.build_tower(cell) {
            tracing::warn!(column = cell.column, row = cell.row, error = %err, "tower rejected");
        }
    }
    for _ in 0..config.frames {
        defense.frame(&input, config.delta);
    }
    let snapshot = defense.snapshot();
    tracing::info!(
        frames = snapshot.frame,
        spawned = defense.enemies_spawned(),
        enemies = snapshot.count("enemy"),
        towers = snapshot.count("tower"),
        hash = %snapshot.hash,
        "tower defense finished"
    );
    Ok(())
}

//! Lumen Engine -- frame loop and stock components on top of [`lumen_ecs`].
//!
//! This crate drives a [`World`](lumen_ecs::world::World) with a
//! variable-timestep [`GameLoop`](game_loop::GameLoop) and provides the
//! components games are assembled from: movement and waypoint following, an
//! AI state machine, circle collision, sprites and audio. Rendering, audio
//! playback and device polling stay outside, behind the
//! [`RenderTarget`](lumen_ecs::draw::RenderTarget) and
//! [`AudioSystem`](audio::AudioSystem) traits and the
//! [`InputSystem`](input::InputSystem) event feed.
//!
//! # Quick Start
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! let mut world = World::new();
//! let rock = world.spawn();
//! let mut mover = MoveComponent::direct().with_screen_wrap(ScreenWrap::default());
//! mover.set_forward_speed(150.0);
//! world.add_component(rock, mover).unwrap();
//! world.add_component(rock, CircleComponent::new(40.0)).unwrap();
//!
//! let mut game = GameLoop::new(world, LoopConfig { headless: true, ..Default::default() });
//! game.run_frames(60, &InputState::default(), 1.0 / 60.0);
//!
//! let actor = game.world().get(rock).unwrap();
//! assert!((actor.transform().position_2d().x - 150.0).abs() < 0.1);
//! ```

#![deny(unsafe_code)]

pub mod ai;
pub mod assets;
pub mod audio;
pub mod collision;
pub mod config;
pub mod game_loop;
pub mod input;
pub mod movement;
pub mod navigation;
pub mod sprite;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use lumen_ecs;

/// Re-export the search crate for convenience.
pub use lumen_search;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use lumen_ecs::prelude::*;

    pub use crate::ai::{AIComponent, AIState, AiContext, AiError};
    pub use crate::assets::{AssetCache, AssetError, AssetLoader, StaticTextureLoader, Texture};
    pub use crate::audio::{AudioComponent, AudioSystem, HeadlessAudio, SoundEvent};
    pub use crate::collision::{actor_circle, intersect, Circle, CircleComponent};
    pub use crate::config::{ConfigError, EngineConfig};
    pub use crate::game_loop::{FrameClock, FrameDiagnostics, GameLoop, LoopConfig};
    pub use crate::input::{DeadZoneConfig, InputEvent, InputSystem};
    pub use crate::movement::{
        InputComponent, InputLimits, KeyBindings, Kinematics, MoveComponent, ScreenWrap,
    };
    pub use crate::navigation::{NavComponent, PathGraph};
    pub use crate::sprite::{
        AnimSpriteComponent, Animation, BGSpriteComponent, SpriteComponent, SpriteError,
    };
}

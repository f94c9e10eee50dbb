//! The variable-timestep frame loop.
//!
//! The [`GameLoop`] drives a [`World`] forward one frame at a time:
//!
//! 1. The raw frame delta is clamped to [`LoopConfig::max_delta`] so a stall
//!    (a debugger pause, a slow load) never produces one enormous step.
//! 2. Input phase: every live actor receives the input snapshot.
//! 3. Update phase: every live actor runs one frame of logic.
//! 4. Housekeeping: pending actors are promoted and dead ones destroyed.
//!
//! Wall-clock time for each phase is recorded in [`FrameDiagnostics`].
//! [`FrameClock`] turns real time into frame deltas for windowed runs;
//! headless runs feed fixed deltas straight into [`GameLoop::frame`].
//!
//! # Example
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! let mut game = GameLoop::new(World::new(), LoopConfig::default());
//! let input = InputState::default();
//! for _ in 0..10 {
//!     game.frame(&input, 1.0 / 60.0);
//! }
//! assert_eq!(game.frame_count(), 10);
//!
//! // A half-second stall is clamped to the configured ceiling.
//! game.frame(&input, 0.5);
//! assert_eq!(game.last_diagnostics().delta, 0.05);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use lumen_ecs::draw::RenderTarget;
use lumen_ecs::input::InputState;
use lumen_ecs::world::{HousekeepingReport, World};

// ---------------------------------------------------------------------------
// LoopConfig
// ---------------------------------------------------------------------------

/// Frame pacing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Largest delta, in seconds, a single frame may advance. Must be
    /// positive and finite.
    pub max_delta: f32,
    /// Minimum wall-clock time between frames, in milliseconds.
    pub min_frame_ms: u64,
    /// Headless mode: no render pass.
    pub headless: bool,
}

impl Default for LoopConfig {
    /// 50 ms delta ceiling, ~60 fps frame limit, rendering on.
    fn default() -> Self {
        Self {
            max_delta: 0.05,
            min_frame_ms: 16,
            headless: false,
        }
    }
}

/// Clamp a raw frame delta into `[0, max_delta]`.
pub fn clamp_delta(raw: f32, max_delta: f32) -> f32 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, max_delta)
}

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// The clamped delta the frame ran with.
    pub delta: f32,
    pub input_time: Duration,
    pub update_time: Duration,
    pub housekeeping_time: Duration,
    /// Input, update and housekeeping together.
    pub total_time: Duration,
    pub housekeeping: HousekeepingReport,
}

// ---------------------------------------------------------------------------
// FrameClock
// ---------------------------------------------------------------------------

/// Measures real frame deltas, holding frames to a minimum duration.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    min_frame: Duration,
    max_delta: f32,
}

impl FrameClock {
    pub fn new(config: &LoopConfig) -> Self {
        Self {
            last: Instant::now(),
            min_frame: Duration::from_millis(config.min_frame_ms),
            max_delta: config.max_delta,
        }
    }

    /// Wait out the rest of the minimum frame time, then return the clamped
    /// seconds since the previous call.
    pub fn tick(&mut self) -> f32 {
        let elapsed = self.last.elapsed();
        if elapsed < self.min_frame {
            std::thread::sleep(self.min_frame - elapsed);
        }
        let now = Instant::now();
        let raw = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        clamp_delta(raw, self.max_delta)
    }
}

// ---------------------------------------------------------------------------
// GameLoop
// ---------------------------------------------------------------------------

/// Owns the world and steps it frame by frame.
pub struct GameLoop {
    world: World,
    config: LoopConfig,
    frame_counter: u64,
    sim_time: f64,
    last_diagnostics: FrameDiagnostics,
}

impl GameLoop {
    /// # Panics
    ///
    /// Panics if `config.max_delta` is not positive and finite.
    pub fn new(world: World, config: LoopConfig) -> Self {
        assert!(
            config.max_delta > 0.0 && config.max_delta.is_finite(),
            "max_delta must be positive and finite, got {}",
            config.max_delta
        );
        Self {
            world,
            config,
            frame_counter: 0,
            sim_time: 0.0,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Run one frame: input, update, housekeeping.
    pub fn frame(&mut self, input: &InputState, raw_delta: f32) -> HousekeepingReport {
        let delta = clamp_delta(raw_delta, self.config.max_delta);
        let frame_start = Instant::now();

        let input_start = Instant::now();
        self.world.process_input(input);
        let input_time = input_start.elapsed();

        let update_start = Instant::now();
        self.world.update_actors(delta);
        let update_time = update_start.elapsed();

        let housekeeping_start = Instant::now();
        let housekeeping = self.world.housekeeping();
        let housekeeping_time = housekeeping_start.elapsed();

        self.frame_counter += 1;
        self.sim_time += f64::from(delta);
        if housekeeping.promoted > 0 || housekeeping.destroyed > 0 {
            tracing::trace!(
                frame = self.frame_counter,
                promoted = housekeeping.promoted,
                destroyed = housekeeping.destroyed,
                "housekeeping"
            );
        }

        self.last_diagnostics = FrameDiagnostics {
            delta,
            input_time,
            update_time,
            housekeeping_time,
            total_time: frame_start.elapsed(),
            housekeeping,
        };
        housekeeping
    }

    /// Run `count` frames with the same input and delta. Returns the
    /// accumulated housekeeping totals.
    pub fn run_frames(&mut self, count: u64, input: &InputState, delta: f32) -> HousekeepingReport {
        let mut total = HousekeepingReport::default();
        for _ in 0..count {
            let report = self.frame(input, delta);
            total.promoted += report.promoted;
            total.destroyed += report.destroyed;
        }
        total
    }

    /// Run one frame timed by `clock`.
    pub fn frame_with_clock(&mut self, clock: &mut FrameClock, input: &InputState) -> HousekeepingReport {
        let delta = clock.tick();
        self.frame(input, delta)
    }

    /// Draw the world unless running headless.
    pub fn render(&self, target: &mut dyn RenderTarget) {
        if !self.config.headless {
            self.world.render(target);
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Sum of the clamped deltas of every frame so far.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    pub fn is_headless(&self) -> bool {
        self.config.headless
    }

    /// Destroy every actor and hand the world back.
    pub fn shutdown(mut self) -> World {
        self.world.shutdown();
        self.world
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

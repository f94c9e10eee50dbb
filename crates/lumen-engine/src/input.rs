//! Builds the per-frame [`InputState`] snapshot from device events.
//!
//! A frame goes through three steps:
//!
//! 1. [`InputSystem::prepare_for_update`] rolls current button masks into
//!    the previous ones,
//! 2. the platform layer feeds [`InputEvent`]s to
//!    [`InputSystem::handle_event`],
//! 3. [`InputSystem::update`] filters the raw controller axes through the
//!    dead zones.
//!
//! The finished snapshot is read with [`InputSystem::state`] and handed to
//! the game loop unmodified.
//!
//! ```
//! use lumen_ecs::input::{ButtonState, Key};
//! use lumen_engine::input::{InputEvent, InputSystem};
//!
//! let mut input = InputSystem::default();
//! input.prepare_for_update();
//! input.handle_event(InputEvent::Key { key: Key::Space, down: true });
//! input.update();
//! assert_eq!(input.state().keyboard.key_state(Key::Space), ButtonState::Pressed);
//!
//! input.prepare_for_update();
//! input.update();
//! assert_eq!(input.state().keyboard.key_state(Key::Space), ButtonState::Held);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lumen_ecs::input::{ControllerButton, ControllerState, InputState, Key, MouseButton, MAX_CONTROLLERS};

// ---------------------------------------------------------------------------
// Dead zones
// ---------------------------------------------------------------------------

/// Raw axis thresholds. Raw values are signed 16-bit device readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadZoneConfig {
    /// Trigger readings at or below this magnitude read as zero.
    pub trigger_dead_zone: i32,
    /// Stick deflections shorter than this read as zero.
    pub stick_dead_zone: i32,
    /// Readings at or beyond this magnitude read as full deflection.
    pub max_value: i32,
}

impl Default for DeadZoneConfig {
    fn default() -> Self {
        Self {
            trigger_dead_zone: 250,
            stick_dead_zone: 8000,
            max_value: 30000,
        }
    }
}

/// Map a raw one-axis reading into `[-1, 1]`, zero inside the dead zone.
pub fn filter_1d(raw: i32, config: &DeadZoneConfig) -> f32 {
    let magnitude = raw.abs();
    if magnitude <= config.trigger_dead_zone {
        return 0.0;
    }
    let span = (config.max_value - config.trigger_dead_zone) as f32;
    let value = (magnitude - config.trigger_dead_zone) as f32 / span;
    (value * raw.signum() as f32).clamp(-1.0, 1.0)
}

/// Map a raw stick reading onto the unit disc, zero inside the dead zone.
/// The direction is kept; only the length is rescaled.
pub fn filter_2d(x: i32, y: i32, config: &DeadZoneConfig) -> Vec2 {
    let dir = Vec2::new(x as f32, y as f32);
    let length = dir.length();
    let dead_zone = config.stick_dead_zone as f32;
    if length < dead_zone {
        return Vec2::ZERO;
    }
    let f = ((length - dead_zone) / (config.max_value as f32 - dead_zone)).clamp(0.0, 1.0);
    dir * (f / length)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

const AXIS_COUNT: usize = 6;

/// A device event from the platform layer. Stick y readings are +y down, as
/// devices report them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Key { key: Key, down: bool },
    MouseButton { button: MouseButton, down: bool },
    /// Absolute position, or the motion delta in relative mode.
    MouseMotion { position: Vec2 },
    Scroll { delta: Vec2 },
    ControllerConnected { index: usize },
    ControllerDisconnected { index: usize },
    ControllerButton { index: usize, button: ControllerButton, down: bool },
    ControllerAxis { index: usize, axis: ControllerAxis, value: i16 },
}

// ---------------------------------------------------------------------------
// InputSystem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InputSystem {
    state: InputState,
    dead_zones: DeadZoneConfig,
    raw_axes: [[i16; AXIS_COUNT]; MAX_CONTROLLERS],
}

impl InputSystem {
    pub fn new(dead_zones: DeadZoneConfig) -> Self {
        Self {
            dead_zones,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn dead_zones(&self) -> &DeadZoneConfig {
        &self.dead_zones
    }

    /// Start a new frame: current masks become previous, scroll clears and
    /// relative mouse motion resets.
    pub fn prepare_for_update(&mut self) {
        self.state.begin_frame();
        if self.state.mouse.relative {
            self.state.mouse.position = Vec2::ZERO;
        }
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, down } => self.state.keyboard.current.set(key, down),
            InputEvent::MouseButton { button, down } => self.state.mouse.set_button(button, down),
            InputEvent::MouseMotion { position } => {
                if self.state.mouse.relative {
                    self.state.mouse.position += position;
                } else {
                    self.state.mouse.position = position;
                }
            }
            InputEvent::Scroll { delta } => self.state.mouse.scroll_wheel = delta,
            InputEvent::ControllerConnected { index } => {
                let Some(controller) = self.state.controllers.get_mut(index) else {
                    tracing::warn!(index, "controller slot out of range, ignoring");
                    return;
                };
                *controller = ControllerState {
                    connected: true,
                    ..Default::default()
                };
                self.raw_axes[index] = [0; AXIS_COUNT];
                tracing::debug!(index, "controller connected");
            }
            InputEvent::ControllerDisconnected { index } => {
                if let Some(controller) = self.state.controllers.get_mut(index) {
                    *controller = ControllerState::default();
                    self.raw_axes[index] = [0; AXIS_COUNT];
                    tracing::debug!(index, "controller disconnected");
                }
            }
            InputEvent::ControllerButton {
                index,
                button,
                down,
            } => {
                if let Some(controller) = self.connected_mut(index) {
                    controller.set_button(button, down);
                }
            }
            InputEvent::ControllerAxis { index, axis, value } => {
                if self.connected_mut(index).is_some() {
                    self.raw_axes[index][axis as usize] = value;
                }
            }
        }
    }

    /// Filter raw controller axes into the snapshot.
    pub fn update(&mut self) {
        for (controller, raw) in self.state.controllers.iter_mut().zip(&self.raw_axes) {
            if !controller.connected {
                continue;
            }
            let axis = |a: ControllerAxis| i32::from(raw[a as usize]);
            controller.left_trigger = filter_1d(axis(ControllerAxis::LeftTrigger), &self.dead_zones);
            controller.right_trigger = filter_1d(axis(ControllerAxis::RightTrigger), &self.dead_zones);
            // Devices report +y down.
            controller.left_stick = filter_2d(
                axis(ControllerAxis::LeftX),
                -axis(ControllerAxis::LeftY),
                &self.dead_zones,
            );
            controller.right_stick = filter_2d(
                axis(ControllerAxis::RightX),
                -axis(ControllerAxis::RightY),
                &self.dead_zones,
            );
        }
    }

    /// In relative mode the mouse position holds the motion since the last
    /// frame instead of an absolute position.
    pub fn set_relative_mouse_mode(&mut self, relative: bool) {
        self.state.mouse.relative = relative;
        self.state.mouse.position = Vec2::ZERO;
    }

    fn connected_mut(&mut self, index: usize) -> Option<&mut ControllerState> {
        self.state.controllers.get_mut(index).filter(|c| c.connected)
    }
}

//! The per-frame input snapshot handed to every actor.
//!
//! The snapshot keeps both the current and the previous frame's button
//! masks, so any button can be read either as a plain boolean or as a
//! [`ButtonState`] edge. Building snapshots from device events is the input
//! system's job; actors only ever read them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Maximum number of game controllers tracked at once.
pub const MAX_CONTROLLERS: usize = 4;

// ---------------------------------------------------------------------------
// ButtonState
// ---------------------------------------------------------------------------

/// Edge state of a button across two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonState {
    None,
    Pressed,
    Released,
    Held,
}

impl ButtonState {
    pub fn from_transition(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, false) => ButtonState::None,
            (false, true) => ButtonState::Pressed,
            (true, false) => ButtonState::Released,
            (true, true) => ButtonState::Held,
        }
    }
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Space,
    Escape,
    Enter,
    Tab,
    LeftShift,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    fn bit(self) -> u64 {
        1 << (self as u8)
    }
}

/// A set of keys packed into a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySet(u64);

impl KeySet {
    pub fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.0 |= key.bit();
        } else {
            self.0 &= !key.bit();
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    pub current: KeySet,
    pub previous: KeySet,
}

impl KeyboardState {
    pub fn key_value(&self, key: Key) -> bool {
        self.current.contains(key)
    }

    pub fn key_state(&self, key: Key) -> ButtonState {
        ButtonState::from_transition(self.previous.contains(key), self.current.contains(key))
    }
}

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    X1,
    X2,
}

impl MouseButton {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseState {
    /// Absolute position, or the motion since last frame in relative mode.
    pub position: Vec2,
    pub scroll_wheel: Vec2,
    pub current_buttons: u8,
    pub previous_buttons: u8,
    pub relative: bool,
}

impl MouseState {
    pub fn button_value(&self, button: MouseButton) -> bool {
        self.current_buttons & button.bit() != 0
    }

    pub fn button_state(&self, button: MouseButton) -> ButtonState {
        ButtonState::from_transition(
            self.previous_buttons & button.bit() != 0,
            self.current_buttons & button.bit() != 0,
        )
    }

    pub fn set_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.current_buttons |= button.bit();
        } else {
            self.current_buttons &= !button.bit();
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerButton {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl ControllerButton {
    fn bit(self) -> u16 {
        1 << (self as u8)
    }
}

/// One controller. Trigger values are in `[0, 1]`, stick axes in `[-1, 1]`
/// with +y up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    pub current_buttons: u16,
    pub previous_buttons: u16,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub left_stick: Vec2,
    pub right_stick: Vec2,
    pub connected: bool,
}

impl ControllerState {
    pub fn button_value(&self, button: ControllerButton) -> bool {
        self.current_buttons & button.bit() != 0
    }

    pub fn button_state(&self, button: ControllerButton) -> ButtonState {
        ButtonState::from_transition(
            self.previous_buttons & button.bit() != 0,
            self.current_buttons & button.bit() != 0,
        )
    }

    pub fn set_button(&mut self, button: ControllerButton, down: bool) {
        if down {
            self.current_buttons |= button.bit();
        } else {
            self.current_buttons &= !button.bit();
        }
    }
}

// ---------------------------------------------------------------------------
// InputState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
    pub controllers: [ControllerState; MAX_CONTROLLERS],
}

impl InputState {
    /// Roll the current masks into the previous ones and clear the
    /// per-frame scroll delta.
    pub fn begin_frame(&mut self) {
        self.keyboard.previous = self.keyboard.current;
        self.mouse.previous_buttons = self.mouse.current_buttons;
        self.mouse.scroll_wheel = Vec2::ZERO;
        for controller in &mut self.controllers {
            controller.previous_buttons = controller.current_buttons;
        }
    }

    /// Convenience for setting a key in the current frame.
    pub fn set_key(&mut self, key: Key, down: bool) {
        self.keyboard.current.set(key, down);
    }

    pub fn controller(&self, index: usize) -> Option<&ControllerState> {
        self.controllers.get(index).filter(|c| c.connected)
    }
}

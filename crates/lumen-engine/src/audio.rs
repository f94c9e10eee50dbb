//! The audio seam.
//!
//! Mixing and playback live behind [`AudioSystem`]. The engine side only
//! keeps event handles: an [`AudioComponent`] plays named events for its
//! owner, forgets handles the audio system reports as finished, pushes the
//! owner's world transform to its 3D events whenever that transform is
//! recomputed, and stops everything when it is detached.
//!
//! [`HeadlessAudio`] is an in-memory implementation for tests and headless
//! runs.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use lumen_ecs::actor::ActorContext;
use lumen_ecs::component::{Component, ComponentId};
use lumen_ecs::transform::Transform;

/// Handle to a playing event. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundEvent(pub u32);

impl SoundEvent {
    /// Returned when an event could not be started.
    pub const INVALID: SoundEvent = SoundEvent(0);
}

/// An external audio backend. Methods take `&self` so one backend can be
/// shared by every audio component.
pub trait AudioSystem {
    /// Start the event called `name`. Returns [`SoundEvent::INVALID`] if it
    /// cannot be played.
    fn play_event(&self, name: &str) -> SoundEvent;

    /// `false` once the event has finished or been stopped.
    fn is_valid(&self, event: SoundEvent) -> bool;

    fn is_3d(&self, event: SoundEvent) -> bool;

    fn stop(&self, event: SoundEvent, allow_fade_out: bool);

    fn set_3d_attributes(&self, event: SoundEvent, world_transform: &Mat4, velocity: Vec3);
}

// ---------------------------------------------------------------------------
// AudioComponent
// ---------------------------------------------------------------------------

pub struct AudioComponent {
    audio: Rc<dyn AudioSystem>,
    events_2d: Vec<SoundEvent>,
    events_3d: Vec<SoundEvent>,
}

impl AudioComponent {
    pub fn new(audio: Rc<dyn AudioSystem>) -> Self {
        Self {
            audio,
            events_2d: Vec::new(),
            events_3d: Vec::new(),
        }
    }

    /// Play `name` for the owner. 3D events start at the owner's current
    /// world transform.
    pub fn play_event(&mut self, owner: &Transform, name: &str) -> SoundEvent {
        let event = self.audio.play_event(name);
        if !self.audio.is_valid(event) {
            tracing::debug!(event = name, "audio event did not start");
            return event;
        }
        if self.audio.is_3d(event) {
            self.audio
                .set_3d_attributes(event, owner.world_transform(), Vec3::ZERO);
            self.events_3d.push(event);
        } else {
            self.events_2d.push(event);
        }
        event
    }

    pub fn stop_all_events(&mut self) {
        for event in self.events_2d.drain(..).chain(self.events_3d.drain(..)) {
            self.audio.stop(event, true);
        }
    }

    pub fn events_2d(&self) -> &[SoundEvent] {
        &self.events_2d
    }

    pub fn events_3d(&self) -> &[SoundEvent] {
        &self.events_3d
    }
}

impl Component for AudioComponent {
    fn update(&mut self, _ctx: &mut ActorContext<'_>, _dt: f32) {
        let audio = &self.audio;
        self.events_2d.retain(|&e| audio.is_valid(e));
        self.events_3d.retain(|&e| audio.is_valid(e));
    }

    fn on_update_world_transform(&mut self, transform: &Transform) {
        for &event in &self.events_3d {
            if self.audio.is_valid(event) {
                self.audio
                    .set_3d_attributes(event, transform.world_transform(), Vec3::ZERO);
            }
        }
    }

    fn on_detach(&mut self, _ctx: &mut ActorContext<'_>, _id: ComponentId) {
        self.stop_all_events();
    }
}

impl fmt::Debug for AudioComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioComponent")
            .field("events_2d", &self.events_2d)
            .field("events_3d", &self.events_3d)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// HeadlessAudio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlayingEvent {
    pub name: String,
    pub is_3d: bool,
    pub world_transform: Option<Mat4>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: u32,
    playing: HashMap<SoundEvent, PlayingEvent>,
    played: Vec<String>,
}

/// Audio backend that plays nothing and remembers everything.
///
/// Every name is playable; names registered with
/// [`with_3d_event`](Self::with_3d_event) are positional.
#[derive(Debug, Default)]
pub struct HeadlessAudio {
    three_d: HashSet<String>,
    state: RefCell<HeadlessState>,
}

impl HeadlessAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_3d_event(mut self, name: impl Into<String>) -> Self {
        self.three_d.insert(name.into());
        self
    }

    /// Mark an event finished, as a backend would when playback ends.
    pub fn finish(&self, event: SoundEvent) {
        self.state.borrow_mut().playing.remove(&event);
    }

    pub fn playing_count(&self) -> usize {
        self.state.borrow().playing.len()
    }

    pub fn event(&self, event: SoundEvent) -> Option<PlayingEvent> {
        self.state.borrow().playing.get(&event).cloned()
    }

    /// Every event name started so far, in order.
    pub fn played(&self) -> Vec<String> {
        self.state.borrow().played.clone()
    }
}

impl AudioSystem for HeadlessAudio {
    fn play_event(&self, name: &str) -> SoundEvent {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let event = SoundEvent(state.next_id);
        state.playing.insert(
            event,
            PlayingEvent {
                name: name.to_owned(),
                is_3d: self.three_d.contains(name),
                world_transform: None,
            },
        );
        state.played.push(name.to_owned());
        event
    }

    fn is_valid(&self, event: SoundEvent) -> bool {
        self.state.borrow().playing.contains_key(&event)
    }

    fn is_3d(&self, event: SoundEvent) -> bool {
        self.state
            .borrow()
            .playing
            .get(&event)
            .is_some_and(|e| e.is_3d)
    }

    fn stop(&self, event: SoundEvent, _allow_fade_out: bool) {
        self.state.borrow_mut().playing.remove(&event);
    }

    fn set_3d_attributes(&self, event: SoundEvent, world_transform: &Mat4, _velocity: Vec3) {
        if let Some(e) = self.state.borrow_mut().playing.get_mut(&event) {
            e.world_transform = Some(*world_transform);
        }
    }
}

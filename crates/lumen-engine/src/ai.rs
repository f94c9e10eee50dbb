//! A finite-state machine component.
//!
//! An [`AIComponent`] owns a set of named [`AIState`]s and drives at most
//! one of them per frame. States decide their own transitions: from inside
//! [`AIState::update`] a state calls [`AiContext::change_state`], and the
//! component performs the switch after that update returns. A transition
//! runs `on_exit` on the old state, looks the new name up and, only if it
//! exists, runs its `on_enter`. An unknown name leaves the machine with no
//! current state until a later transition succeeds.
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! struct Idle;
//! impl AIState for Idle {
//!     fn name(&self) -> &str { "Idle" }
//!     fn update(&mut self, ctx: &mut AiContext<'_, '_>, _dt: f32) {
//!         ctx.change_state("Wander");
//!     }
//! }
//!
//! struct Wander;
//! impl AIState for Wander {
//!     fn name(&self) -> &str { "Wander" }
//! }
//!
//! let mut world = World::new();
//! let id = world.spawn();
//! let mut ai = AIComponent::new().with_initial_state("Idle");
//! ai.register_state(Idle);
//! ai.register_state(Wander);
//! world.add_component(id, ai).unwrap();
//!
//! world.update(0.016);
//! let ai = world.get(id).unwrap().component::<AIComponent>().unwrap();
//! assert_eq!(ai.current_state_name(), Some("Wander"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use lumen_ecs::actor::ActorContext;
use lumen_ecs::component::{AsAny, Component, ComponentId};

/// Errors reported by [`AIComponent::change_state`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("no AI state registered as {0:?}")]
    UnknownState(String),
}

// ---------------------------------------------------------------------------
// AiContext
// ---------------------------------------------------------------------------

/// The owner context handed to state hooks, plus the transition request
/// slot. Dereferences to the [`ActorContext`].
pub struct AiContext<'c, 'a> {
    actor: &'c mut ActorContext<'a>,
    request: Option<String>,
}

impl<'c, 'a> AiContext<'c, 'a> {
    fn new(actor: &'c mut ActorContext<'a>) -> Self {
        Self {
            actor,
            request: None,
        }
    }

    /// Ask the owning component to switch to `name` once the current hook
    /// returns. The last request in a hook wins.
    pub fn change_state(&mut self, name: impl Into<String>) {
        self.request = Some(name.into());
    }

    pub fn requested_state(&self) -> Option<&str> {
        self.request.as_deref()
    }
}

impl<'a> Deref for AiContext<'_, 'a> {
    type Target = ActorContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.actor
    }
}

impl DerefMut for AiContext<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.actor
    }
}

// ---------------------------------------------------------------------------
// AIState
// ---------------------------------------------------------------------------

/// One named behavior mode.
pub trait AIState: AsAny {
    /// Registry key. Must be stable for the lifetime of the state.
    fn name(&self) -> &str;

    fn update(&mut self, _ctx: &mut AiContext<'_, '_>, _dt: f32) {}

    fn on_enter(&mut self, _ctx: &mut AiContext<'_, '_>) {}

    fn on_exit(&mut self, _ctx: &mut AiContext<'_, '_>) {}
}

// ---------------------------------------------------------------------------
// AIComponent
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AIComponent {
    states: HashMap<String, Box<dyn AIState>>,
    current: Option<String>,
    initial: Option<String>,
}

impl AIComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `name` as soon as the component is attached.
    pub fn with_initial_state(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Add a state under its own name. Registering a second state with the
    /// same name replaces the first.
    pub fn register_state(&mut self, state: impl AIState) {
        let name = state.name().to_owned();
        if self.states.insert(name.clone(), Box::new(state)).is_some() {
            tracing::debug!(state = %name, "AI state re-registered, replacing previous");
        }
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Downcast a registered state.
    pub fn state<S: AIState>(&self, name: &str) -> Option<&S> {
        self.states
            .get(name)
            .and_then(|s| (**s).as_any().downcast_ref::<S>())
    }

    pub fn state_mut<S: AIState>(&mut self, name: &str) -> Option<&mut S> {
        self.states
            .get_mut(name)
            .and_then(|s| (**s).as_any_mut().downcast_mut::<S>())
    }

    /// Exit the current state and enter `name`.
    ///
    /// On an unknown name the machine is left with no current state and
    /// [`AiError::UnknownState`] is returned.
    pub fn change_state(&mut self, ctx: &mut ActorContext<'_>, name: &str) -> Result<(), AiError> {
        if let Some(old) = self.current.take() {
            if let Some(state) = self.states.get_mut(&old) {
                let mut ai_ctx = AiContext::new(ctx);
                state.on_exit(&mut ai_ctx);
                ignore_request(&ai_ctx, &old, "on_exit");
            }
        }

        let Some(state) = self.states.get_mut(name) else {
            tracing::warn!(entity = %ctx.id(), state = name, "could not find AI state");
            return Err(AiError::UnknownState(name.to_owned()));
        };
        self.current = Some(name.to_owned());
        let mut ai_ctx = AiContext::new(ctx);
        state.on_enter(&mut ai_ctx);
        ignore_request(&ai_ctx, name, "on_enter");
        Ok(())
    }
}

/// Transition requests only take effect from `update`.
fn ignore_request(ctx: &AiContext<'_, '_>, state: &str, hook: &str) {
    if let Some(requested) = ctx.requested_state() {
        tracing::debug!(state, hook, requested, "ignoring AI transition requested outside update");
    }
}

impl Component for AIComponent {
    fn update(&mut self, ctx: &mut ActorContext<'_>, dt: f32) {
        let Some(name) = self.current.as_deref() else {
            return;
        };
        let Some(state) = self.states.get_mut(name) else {
            return;
        };
        let mut ai_ctx = AiContext::new(ctx);
        state.update(&mut ai_ctx, dt);
        if let Some(next) = ai_ctx.request.take() {
            // Failures are already logged; the machine is left idle.
            let _ = self.change_state(ctx, &next);
        }
    }

    fn on_attach(&mut self, ctx: &mut ActorContext<'_>, _id: ComponentId) {
        if let Some(initial) = self.initial.clone() {
            let _ = self.change_state(ctx, &initial);
        }
    }
}

impl fmt::Debug for AIComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AIComponent")
            .field("states", &names)
            .field("current", &self.current)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

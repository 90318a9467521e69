//! Finite State Machine for AI Behavior
//!
//! States are registered under a key and own their enter/tick/exit logic.
//! Transitions live in a table next to the states: a list per source state
//! plus an "any state" list, each entry pairing a target with a guard over
//! the shared context.
//!
//! # Tick order
//!
//! 1. Any-state transitions, in the order they were added
//! 2. Transitions out of the current state, in the order they were added
//! 3. The first guard that holds wins; the old state exits and the new one enters
//! 4. The (possibly new) current state ticks
//!
//! # Example
//!
//! ```ignore
//! let mut fsm = StateMachine::new();
//! fsm.add_state(Mode::Idle, IdleState::default());
//! fsm.add_state(Mode::Chase, ChaseState::default());
//! fsm.add_transition(Mode::Idle, Mode::Chase, |ctx: &Ctx| ctx.can_see_target);
//! fsm.start(Mode::Idle, &mut ctx)?;
//! fsm.tick(&mut ctx)?;
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use thiserror::Error;

// ============================================================================
// State Trait
// ============================================================================

/// A state in the finite state machine.
///
/// The lifecycle is:
///
/// 1. `enter()` - Called once when entering this state
/// 2. `tick()` - Called each frame while in this state
/// 3. `exit()` - Called once when leaving this state
pub trait State<Ctx>: fmt::Debug {
    /// State name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Called when entering this state.
    fn enter(&mut self, _ctx: &mut Ctx) {}

    /// Called each frame while in this state.
    fn tick(&mut self, ctx: &mut Ctx);

    /// Called when exiting this state.
    fn exit(&mut self, _ctx: &mut Ctx) {}
}

// ============================================================================
// Transition
// ============================================================================

/// Guard evaluated against the context
pub type Condition<Ctx> = Box<dyn Fn(&Ctx) -> bool>;

/// A guarded edge to another state
pub struct Transition<K, Ctx> {
    pub to: K,
    condition: Condition<Ctx>,
}

impl<K, Ctx> Transition<K, Ctx> {
    pub fn new(to: K, condition: impl Fn(&Ctx) -> bool + 'static) -> Self {
        Self {
            to,
            condition: Box::new(condition),
        }
    }

    #[must_use]
    pub fn holds(&self, ctx: &Ctx) -> bool {
        (self.condition)(ctx)
    }
}

impl<K: fmt::Debug, Ctx> fmt::Debug for Transition<K, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transition::To({:?})", self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("state {0} was never added")]
    UnknownState(String),
    #[error("state machine has no current state")]
    NotStarted,
}

// ============================================================================
// State Machine
// ============================================================================

/// A table-driven finite state machine.
///
/// # Type Parameters
///
/// - `K`: State key (usually a small `Copy` enum)
/// - `Ctx`: Context passed to states and guards
pub struct StateMachine<K, Ctx> {
    states: FxHashMap<K, Box<dyn State<Ctx>>>,
    transitions: FxHashMap<K, Vec<Transition<K, Ctx>>>,
    any_transitions: Vec<Transition<K, Ctx>>,
    current: Option<K>,
}

impl<K, Ctx> StateMachine<K, Ctx>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
            transitions: FxHashMap::default(),
            any_transitions: Vec::new(),
            current: None,
        }
    }

    /// Register a state. Replaces any state already under `key`.
    pub fn add_state<S: State<Ctx> + 'static>(&mut self, key: K, state: S) {
        self.states.insert(key, Box::new(state));
    }

    /// Guarded edge out of `from`
    pub fn add_transition(
        &mut self,
        from: K,
        to: K,
        condition: impl Fn(&Ctx) -> bool + 'static,
    ) {
        self.transitions
            .entry(from)
            .or_default()
            .push(Transition::new(to, condition));
    }

    /// The same guarded edge out of several states
    pub fn add_transition_from(
        &mut self,
        from: &[K],
        to: K,
        condition: impl Fn(&Ctx) -> bool + Clone + 'static,
    ) {
        for &source in from {
            self.add_transition(source, to, condition.clone());
        }
    }

    /// Guarded edge checked regardless of the current state.
    ///
    /// Never fires while already in `to`.
    pub fn add_any_transition(&mut self, to: K, condition: impl Fn(&Ctx) -> bool + 'static) {
        self.any_transitions.push(Transition::new(to, condition));
    }

    /// Enter the initial state
    ///
    /// # Errors
    ///
    /// [`FsmError::UnknownState`] if `initial` was never added.
    pub fn start(&mut self, initial: K, ctx: &mut Ctx) -> Result<(), FsmError> {
        self.set_state(initial, ctx)
    }

    /// Force a transition. Re-entering the current state does nothing.
    ///
    /// # Errors
    ///
    /// [`FsmError::UnknownState`] if `key` was never added.
    pub fn set_state(&mut self, key: K, ctx: &mut Ctx) -> Result<(), FsmError> {
        if self.current == Some(key) {
            return Ok(());
        }
        if !self.states.contains_key(&key) {
            return Err(FsmError::UnknownState(format!("{key:?}")));
        }

        if let Some(state) = self.current.and_then(|old| self.states.get_mut(&old)) {
            log::debug!("FSM exit {}", state.name());
            state.exit(ctx);
        }
        log::debug!("FSM {:?} -> {:?}", self.current, key);
        self.current = Some(key);
        if let Some(state) = self.states.get_mut(&key) {
            state.enter(ctx);
        }
        Ok(())
    }

    /// Target of the first transition whose guard holds
    fn next_state(&self, current: K, ctx: &Ctx) -> Option<K> {
        self.any_transitions
            .iter()
            .filter(|transition| transition.to != current)
            .chain(self.transitions.get(&current).into_iter().flatten())
            .find(|transition| transition.holds(ctx))
            .map(|transition| transition.to)
    }

    /// Evaluate transitions, then tick the current state.
    ///
    /// # Errors
    ///
    /// [`FsmError::NotStarted`] before [`start`](Self::start), or
    /// [`FsmError::UnknownState`] if a transition targets an unregistered key.
    pub fn tick(&mut self, ctx: &mut Ctx) -> Result<(), FsmError> {
        let current = self.current.ok_or(FsmError::NotStarted)?;

        if let Some(next) = self.next_state(current, ctx) {
            self.set_state(next, ctx)?;
        }

        let current = self.current.ok_or(FsmError::NotStarted)?;
        if let Some(state) = self.states.get_mut(&current) {
            state.tick(ctx);
        }
        Ok(())
    }

    /// Key of the current state
    #[must_use]
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Get the name of the current state (empty before start).
    #[must_use]
    pub fn current_state_name(&self) -> &'static str {
        self.current
            .and_then(|key| self.states.get(&key))
            .map_or("", |state| state.name())
    }

    /// Check if the FSM is in a state with the given name.
    #[must_use]
    pub fn is_in_state(&self, name: &str) -> bool {
        self.current_state_name() == name
    }

    /// Number of registered states
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

impl<K, Ctx> Default for StateMachine<K, Ctx>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, Ctx> fmt::Debug for StateMachine<K, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("states", &self.states.len())
            .field("any_transitions", &self.any_transitions.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

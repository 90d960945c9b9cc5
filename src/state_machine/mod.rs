//! # Load State Machine
//!
//! Pure transition logic for an asynchronously loaded value. The machine owns no I/O:
//! side effects are delegated to a [`LoadEffects`] implementation that is called on
//! state entry and exit.
//!
//! ## States
//!
//! - `Init`: nothing has been requested yet
//! - `Loading`: first fetch in flight, no value to fall back on
//! - `Refreshing`: fetch in flight while a previously loaded value exists
//! - `Loaded`: the last fetch succeeded
//! - `Stale`: a refresh failed or was cancelled, the previous value is still usable
//! - `Error`: the first load failed or was cancelled
//! - `Disposed`: terminal
//!
//! Every `(state, trigger)` pair is either permitted, explicitly ignored, or
//! rejected with [`Error::InvalidTransition`]. See [`rule`] for the full table.

use serde::{Deserialize, Serialize};

use crate::error::{Error, FetchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    Init,
    Loading,
    Refreshing,
    Loaded,
    Stale,
    Error,
    Disposed,
}
impl LoadState {
    pub const ALL: [LoadState; 7] = [
        Self::Init,
        Self::Loading,
        Self::Refreshing,
        Self::Loaded,
        Self::Stale,
        Self::Error,
        Self::Disposed,
    ];

    /// `true` while a fetch is in flight.
    pub fn is_fetching(self) -> bool {
        matches!(self, Self::Loading | Self::Refreshing)
    }
}
impl core::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Init => "Init",
            Self::Loading => "Loading",
            Self::Refreshing => "Refreshing",
            Self::Loaded => "Loaded",
            Self::Stale => "Stale",
            Self::Error => "Error",
            Self::Disposed => "Disposed",
        })
    }
}

/// Payload-free identity of a [`LoadTrigger`], used by the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    BeginLoading,
    CancelLoading,
    LoadError,
    EndLoading,
    Dispose,
}
impl TriggerKind {
    pub const ALL: [TriggerKind; 5] = [
        Self::BeginLoading,
        Self::CancelLoading,
        Self::LoadError,
        Self::EndLoading,
        Self::Dispose,
    ];
}
impl core::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BeginLoading => "BeginLoading",
            Self::CancelLoading => "CancelLoading",
            Self::LoadError => "LoadError",
            Self::EndLoading => "EndLoading",
            Self::Dispose => "Dispose",
        })
    }
}

/// Events driving the machine. `LoadError` and `EndLoading` carry the fetch outcome,
/// which is handed to the matching entry callback.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadTrigger<T> {
    BeginLoading,
    CancelLoading,
    LoadError(FetchError),
    EndLoading(T),
    Dispose,
}
impl<T> LoadTrigger<T> {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::BeginLoading => TriggerKind::BeginLoading,
            Self::CancelLoading => TriggerKind::CancelLoading,
            Self::LoadError(_) => TriggerKind::LoadError,
            Self::EndLoading(_) => TriggerKind::EndLoading,
            Self::Dispose => TriggerKind::Dispose,
        }
    }
}

/// Declared handling of a trigger in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Move to the given state, running exit and entry callbacks.
    Permit(LoadState),
    /// Silent no-op: no state change, no callback.
    Ignore,
}

/// The transition table. `None` means the trigger is not declared for the state.
///
/// | State      | BeginLoading | CancelLoading | LoadError | EndLoading | Dispose  |
/// |------------|--------------|---------------|-----------|------------|----------|
/// | Init       | Loading      | -             | -         | -          | Disposed |
/// | Loading    | ignored      | Error         | Error     | Loaded     | Disposed |
/// | Loaded     | Refreshing   | ignored       | -         | -          | Disposed |
/// | Refreshing | ignored      | Stale         | Stale     | Loaded     | Disposed |
/// | Stale      | Refreshing   | ignored       | -         | Loaded     | Disposed |
/// | Error      | Loading      | -             | -         | -          | Disposed |
/// | Disposed   | -            | ignored       | -         | -          | Disposed |
pub const fn rule(state: LoadState, trigger: TriggerKind) -> Option<Rule> {
    use LoadState as S;
    use TriggerKind as T;
    match (state, trigger) {
        (S::Init, T::BeginLoading) => Some(Rule::Permit(S::Loading)),

        (S::Loading, T::BeginLoading) => Some(Rule::Ignore),
        (S::Loading, T::CancelLoading | T::LoadError) => Some(Rule::Permit(S::Error)),
        (S::Loading, T::EndLoading) => Some(Rule::Permit(S::Loaded)),

        (S::Loaded, T::BeginLoading) => Some(Rule::Permit(S::Refreshing)),
        (S::Loaded, T::CancelLoading) => Some(Rule::Ignore),

        (S::Refreshing, T::BeginLoading) => Some(Rule::Ignore),
        (S::Refreshing, T::CancelLoading | T::LoadError) => Some(Rule::Permit(S::Stale)),
        (S::Refreshing, T::EndLoading) => Some(Rule::Permit(S::Loaded)),

        (S::Stale, T::BeginLoading) => Some(Rule::Permit(S::Refreshing)),
        (S::Stale, T::CancelLoading) => Some(Rule::Ignore),
        (S::Stale, T::EndLoading) => Some(Rule::Permit(S::Loaded)),

        (S::Error, T::BeginLoading) => Some(Rule::Permit(S::Loading)),

        (S::Disposed, T::CancelLoading) => Some(Rule::Ignore),

        (_, T::Dispose) => Some(Rule::Permit(S::Disposed)),
        _ => None,
    }
}

/// Side effects of the transitions, supplied by the owner of the machine.
///
/// Each method runs after the machine has moved to the new state.
pub trait LoadEffects<T> {
    /// Leaving `Init`: the content becomes the loading placeholder.
    fn on_exit_init(&mut self);

    /// Entering `Loading` or `Refreshing`. This is the only place a fetch is launched.
    fn on_begin_loading(&mut self, state: LoadState);

    /// Entering `Loaded` through `EndLoading(value)`.
    ///
    /// The controller neither renders nor notifies a value equal to the last loaded one,
    /// unless the view is not showing it (an error view left by a failed refresh). It then
    /// re-renders the value without notifying.
    fn on_end_loading(&mut self, value: T);

    /// Entering `Error` through `LoadError(error)`.
    fn on_load_error(&mut self, error: FetchError);

    /// Entering `Stale` through `LoadError(error)`.
    fn on_load_stale(&mut self, error: FetchError);
}

/// What firing a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Transitioned { from: LoadState, to: LoadState },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStateMachine {
    state: LoadState,
}

impl Default for LoadStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadStateMachine {
    pub fn new() -> Self {
        Self {
            state: LoadState::Init,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// `true` if `trigger` is permitted or ignored in the current state.
    pub fn accepts(&self, trigger: TriggerKind) -> bool {
        rule(self.state, trigger).is_some()
    }

    /// Applies `trigger` and runs the matching callbacks on `effects`.
    ///
    /// Fails with [`Error::InvalidTransition`] when the trigger is not declared
    /// for the current state; the state is left untouched in that case.
    pub fn fire<T, E>(&mut self, trigger: LoadTrigger<T>, effects: &mut E) -> Result<Fired>
    where
        E: LoadEffects<T> + ?Sized,
    {
        let from = self.state;
        let kind = trigger.kind();
        let to = match rule(from, kind) {
            Some(Rule::Permit(to)) => to,
            Some(Rule::Ignore) => {
                log::debug!("load_state_machine - {kind} ignored in {from}");
                return Ok(Fired::Ignored);
            }
            None => {
                return Err(Error::InvalidTransition {
                    state: from,
                    trigger: kind,
                })
            }
        };
        log::debug!("load_state_machine - {from} --{kind}--> {to}");

        if from == LoadState::Init {
            effects.on_exit_init();
        }
        self.state = to;

        match (to, trigger) {
            (LoadState::Loading | LoadState::Refreshing, _) => effects.on_begin_loading(to),
            (LoadState::Loaded, LoadTrigger::EndLoading(value)) => effects.on_end_loading(value),
            (LoadState::Error, LoadTrigger::LoadError(error)) => effects.on_load_error(error),
            (LoadState::Stale, LoadTrigger::LoadError(error)) => effects.on_load_stale(error),
            _ => (),
        }

        Ok(Fired::Transitioned { from, to })
    }
}

//! Lifecycle of an asynchronously loaded value displayed by a UI surface.
//!
//! The crate fetches a value, exposes a placeholder while fetching, re-fetches on demand
//! or on a timer, and tells a first load apart from a refresh so that stale content can
//! stay on screen (or be treated as an error) while a refresh is in flight.
//!
//! - [`state_machine`]: the pure transition table and its entry/exit callbacks
//! - [`controller`]: fetch orchestration, cancellation, polling and notifications
//! - [`loaded`]: what the UI should display

pub mod controller;
pub mod error;
pub mod loaded;
pub mod state_machine;
pub mod utils;

pub use error::{Error, FetchError, Result};

pub mod prelude {
    pub use super::controller::{LoadConfig, LoadController, LoadControllerBuilder, ReloadKey};
    pub use super::error::{Error, FetchError};
    pub use super::loaded::{LoadView, Loadable};
    pub use super::state_machine::{
        Fired, LoadEffects, LoadState, LoadStateMachine, LoadTrigger, TriggerKind,
    };
    pub use super::utils::CCStr;
    pub use tokio_util::sync::CancellationToken;
}

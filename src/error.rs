use crate::{
    state_machine::{LoadState, TriggerKind},
    utils::CCStr,
};

/// Errors raised to the caller.
///
/// Runtime fetch failures never show up here: they are routed through the
/// state machine and published as [`LoadView::Error`](crate::loaded::LoadView::Error).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A controller was built without a fetch function.
    #[error("no fetch function configured")]
    MissingFetch,
    /// The trigger has no declared handling in the current state.
    #[error("trigger {trigger} is not permitted in state {state}")]
    InvalidTransition {
        state: LoadState,
        trigger: TriggerKind,
    },
    /// A configuration input could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(CCStr),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Outcome of a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The fetch observed its cancellation signal. Loading was aborted, it did not fail.
    #[error("loading was cancelled")]
    Cancelled,
    #[error("{0}")]
    Failed(CCStr),
}

impl FetchError {
    /// Wraps any displayable error, typically through `.map_err(FetchError::failed)`.
    pub fn failed<E: core::fmt::Display>(error: E) -> Self {
        Self::Failed(CCStr::from(error.to_string()))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

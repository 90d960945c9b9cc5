//! # Controller Module
//!
//! Bridges the pure [`LoadStateMachine`](crate::state_machine::LoadStateMachine) to the
//! outside world: the user supplied fetch function, cancellation, periodic refresh and the
//! render notifications.
//!
//! A [`LoadController`] is a cheap, clonable handle. The state machine itself lives in a
//! background task that consumes one command at a time, so triggers coming from the
//! caller, the timer and the fetch tasks are applied in order and never interleave.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use load_lifecycle::prelude::*;
//!
//! # async fn fetch_balance(_token: CancellationToken) -> Result<u64, FetchError> { Ok(0) }
//! # async fn demo() -> load_lifecycle::Result<()> {
//! let controller = LoadController::builder()
//!     .fetch(fetch_balance)
//!     .period(Some(Duration::from_secs(30)))
//!     .on_value_changed(|balance: &u64| log::info!("new balance {balance}"))
//!     .build()?;
//! controller.start();
//!
//! let mut view = controller.subscribe_view();
//! while view.changed().await.is_ok() {
//!     println!("{}", *view.borrow_and_update());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod reload_key;
mod scope;
mod service;
mod timer;

use std::{future::Future, time::Duration};

use futures_util::FutureExt;
use tokio::sync::{
    mpsc::{self, UnboundedSender},
    oneshot, watch,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, FetchError, Result},
    loaded::{LoadView, Loadable},
    state_machine::LoadState,
};

pub use config::{LoadConfig, PERIOD_ENV, STALE_DATA_IS_ERROR_ENV};
pub use reload_key::ReloadKey;

use service::{FetchFn, LoadCommand, LoadService, LoadServiceParts, ValueChangedFn};

/// Handle on a running load lifecycle.
///
/// Dropping every handle without calling [`dispose`](Self::dispose) tears the lifecycle
/// down the same way.
pub struct LoadController<T> {
    commands: UnboundedSender<LoadCommand<T>>,
    state: watch::Receiver<LoadState>,
    view: watch::Receiver<LoadView<T>>,
}

impl<T> Clone for LoadController<T> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
            view: self.view.clone(),
        }
    }
}

impl<T> core::fmt::Debug for LoadController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadController")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<T: Loadable> LoadController<T> {
    pub fn builder() -> LoadControllerBuilder<T> {
        LoadControllerBuilder::default()
    }

    /// Fires the initial `BeginLoading`.
    pub fn start(&self) {
        log::debug!("LoadController::start");
        self.send(LoadCommand::BeginLoading { cause: "start" });
    }

    /// Forces a new fetch. Ignored while a fetch is already in flight.
    pub fn reload(&self) {
        log::debug!("LoadController::reload");
        self.send(LoadCommand::BeginLoading { cause: "reload" });
    }

    /// Cancels the in-flight fetch, if any. The first load then ends in
    /// [`LoadState::Error`], a refresh in [`LoadState::Stale`].
    pub fn cancel(&self) {
        log::debug!("LoadController::cancel");
        self.send(LoadCommand::Cancel);
    }

    /// Replaces the refresh period. `None` or zero stops polling.
    pub fn set_period(&self, period: Option<Duration>) {
        log::debug!("LoadController::set_period - {period:?}");
        self.send(LoadCommand::SetPeriod(period));
    }

    /// Updates the reload sentinel. A key different from the previous one forces a
    /// new fetch, even if the value is already loaded.
    pub fn set_reload_key<K: PartialEq + Send + 'static>(&self, key: K) {
        log::debug!("LoadController::set_reload_key");
        self.send(LoadCommand::SetReloadKey(ReloadKey::new(key)));
    }

    pub fn set_stale_data_is_error(&self, stale_data_is_error: bool) {
        log::debug!("LoadController::set_stale_data_is_error - {stale_data_is_error}");
        self.send(LoadCommand::SetStaleDataIsError(stale_data_is_error));
    }

    /// Fires `Dispose` and cancels the in-flight fetch and the timer.
    ///
    /// Returns once the lifecycle is in [`LoadState::Disposed`]; nothing is rendered
    /// or notified afterwards. Calling it again is a no-op.
    pub async fn dispose(&self) {
        log::debug!("LoadController::dispose - start");
        let (result, waiter) = oneshot::channel();
        if self.commands.send(LoadCommand::Dispose { result }).is_ok() {
            // An unanswered request means a concurrent dispose got there first
            _ = waiter.await;
        }
        log::debug!("LoadController::dispose - finished");
    }

    pub fn state(&self) -> LoadState {
        *self.state.borrow()
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == LoadState::Disposed
    }

    /// What should currently be displayed.
    pub fn view(&self) -> LoadView<T> {
        self.view.borrow().clone()
    }

    /// Notified on every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<LoadState> {
        self.state.clone()
    }

    /// Notified on every render request.
    pub fn subscribe_view(&self) -> watch::Receiver<LoadView<T>> {
        self.view.clone()
    }

    fn send(&self, cmd: LoadCommand<T>) {
        if let Err(e) = self.commands.send(cmd) {
            log::debug!("LoadController - disposed, dropping {:?}", e.0);
        }
    }
}

/// Configures and starts a [`LoadController`].
pub struct LoadControllerBuilder<T> {
    fetch: Option<FetchFn<T>>,
    on_value_changed: Option<ValueChangedFn<T>>,
    reload_key: Option<ReloadKey>,
    config: LoadConfig,
}

impl<T> Default for LoadControllerBuilder<T> {
    fn default() -> Self {
        Self {
            fetch: None,
            on_value_changed: None,
            reload_key: None,
            config: LoadConfig::default(),
        }
    }
}

impl<T: Loadable> LoadControllerBuilder<T> {
    /// The data source. It receives the cancellation signal of its own fetch and should
    /// return [`FetchError::Cancelled`] when it observes it.
    pub fn fetch<F, Fut>(mut self, fetch: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = core::result::Result<T, FetchError>> + Send + 'static,
    {
        self.fetch = Some(Box::new(move |token| fetch(token).boxed()));
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: LoadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn period(mut self, period: Option<Duration>) -> Self {
        self.config.period = period;
        self
    }

    pub fn stale_data_is_error(mut self, stale_data_is_error: bool) -> Self {
        self.config.stale_data_is_error = stale_data_is_error;
        self
    }

    /// Initial reload sentinel. Setting it does not trigger a load.
    pub fn reload_key<K: PartialEq + Send + 'static>(mut self, key: K) -> Self {
        self.reload_key = Some(ReloadKey::new(key));
        self
    }

    /// Called with every genuinely new loaded value.
    pub fn on_value_changed<F: Fn(&T) + Send + 'static>(mut self, on_value_changed: F) -> Self {
        self.on_value_changed = Some(Box::new(on_value_changed));
        self
    }

    /// Spawns the controller task. Polling starts right away if a period is configured;
    /// the first load waits for [`LoadController::start`].
    ///
    /// # Errors
    ///
    /// [`Error::MissingFetch`] if no fetch function was given.
    ///
    /// # Panics
    ///
    /// When called outside of a Tokio runtime.
    pub fn build(self) -> Result<LoadController<T>> {
        let fetch = self.fetch.ok_or(Error::MissingFetch)?;

        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(LoadState::Init);
        let (view_tx, view) = watch::channel(LoadView::Empty);

        let service = LoadService::new(LoadServiceParts {
            fetch,
            on_value_changed: self.on_value_changed,
            stale_data_is_error: self.config.stale_data_is_error,
            reload_key: self.reload_key,
            state: state_tx,
            view: view_tx,
            commands: commands.downgrade(),
        });
        tokio::spawn(service.run(rx, self.config.period));
        log::debug!("LoadControllerBuilder::build - {:?}", self.config);

        Ok(LoadController {
            commands,
            state,
            view,
        })
    }
}

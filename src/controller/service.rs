use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{
    mpsc::{UnboundedReceiver, WeakUnboundedSender},
    oneshot, watch,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::FetchError,
    loaded::{LoadView, Loadable},
    state_machine::{Fired, LoadEffects, LoadState, LoadStateMachine, LoadTrigger},
};

use super::{reload_key::ReloadKey, scope::CancellationScope, timer::PeriodicTrigger};

pub(crate) type FetchFn<T> =
    Box<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<T, FetchError>> + Send>;
pub(crate) type ValueChangedFn<T> = Box<dyn Fn(&T) + Send>;

/// Commands for the load service. Every trigger of the state machine goes through
/// this queue, whatever its origin (caller, timer, fetch task).
pub(crate) enum LoadCommand<T> {
    /// Fire `BeginLoading`
    BeginLoading {
        /// Origin of the request, for the logs
        cause: &'static str,
    },
    /// A fetch task finished
    FetchCompleted {
        generation: u64,
        outcome: Result<T, FetchError>,
    },
    /// Cancel the in-flight fetch, if any
    Cancel,
    SetPeriod(Option<Duration>),
    SetReloadKey(ReloadKey),
    SetStaleDataIsError(bool),
    /// Fire `Dispose` and stop the service
    Dispose { result: oneshot::Sender<()> },
}

impl<T> core::fmt::Debug for LoadCommand<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeginLoading { cause } => f
                .debug_struct("BeginLoading")
                .field("cause", cause)
                .finish(),
            Self::FetchCompleted {
                generation,
                outcome,
            } => f
                .debug_struct("FetchCompleted")
                .field("generation", generation)
                .field("error", &outcome.as_ref().err())
                .finish_non_exhaustive(),
            Self::Cancel => f.debug_struct("Cancel").finish(),
            Self::SetPeriod(period) => f.debug_tuple("SetPeriod").field(period).finish(),
            Self::SetReloadKey(key) => f.debug_tuple("SetReloadKey").field(key).finish(),
            Self::SetStaleDataIsError(flag) => {
                f.debug_tuple("SetStaleDataIsError").field(flag).finish()
            }
            Self::Dispose { .. } => f.debug_struct("Dispose").finish_non_exhaustive(),
        }
    }
}

/// Owner of the state machine. Runs as a single task consuming [`LoadCommand`]s in
/// order, so transitions never interleave.
pub(crate) struct LoadService<T> {
    machine: LoadStateMachine,
    core: LoadCore<T>,
    timer: PeriodicTrigger,
    reload_key: Option<ReloadKey>,
    root: CancellationToken,
    state: watch::Sender<LoadState>,
}

/// Entry and exit callbacks of the machine, plus the data they write.
struct LoadCore<T> {
    fetch: FetchFn<T>,
    scope: CancellationScope,
    generation: u64,
    last_value: Option<T>,
    stale_data_is_error: bool,
    on_value_changed: Option<ValueChangedFn<T>>,
    view: watch::Sender<LoadView<T>>,
    commands: WeakUnboundedSender<LoadCommand<T>>,
}

pub(crate) struct LoadServiceParts<T> {
    pub fetch: FetchFn<T>,
    pub on_value_changed: Option<ValueChangedFn<T>>,
    pub stale_data_is_error: bool,
    pub reload_key: Option<ReloadKey>,
    pub state: watch::Sender<LoadState>,
    pub view: watch::Sender<LoadView<T>>,
    pub commands: WeakUnboundedSender<LoadCommand<T>>,
}

impl<T: Loadable> LoadService<T> {
    pub(crate) fn new(parts: LoadServiceParts<T>) -> Self {
        let root = CancellationToken::new();
        Self {
            machine: LoadStateMachine::new(),
            core: LoadCore {
                fetch: parts.fetch,
                scope: CancellationScope::new(&root),
                generation: 0,
                last_value: None,
                stale_data_is_error: parts.stale_data_is_error,
                on_value_changed: parts.on_value_changed,
                view: parts.view,
                commands: parts.commands,
            },
            timer: PeriodicTrigger::new(&root),
            reload_key: parts.reload_key,
            root,
            state: parts.state,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut rx: UnboundedReceiver<LoadCommand<T>>,
        period: Option<Duration>,
    ) {
        log::info!("load_service (coroutine) - start");
        let commands = self.core.commands.clone();
        self.timer.configure(period, &commands);

        while let Some(cmd) = rx.recv().await {
            log::debug!("load_service (coroutine) - Processing command {cmd:?}...");
            match cmd {
                LoadCommand::BeginLoading { .. } => self.fire(LoadTrigger::BeginLoading),
                LoadCommand::FetchCompleted {
                    generation,
                    outcome,
                } => self.complete_fetch(generation, outcome),
                LoadCommand::Cancel => {
                    if self.machine.state().is_fetching() && !self.core.scope.is_cancelled() {
                        self.core.scope.cancel();
                    } else {
                        log::debug!("load_service - Cancel with no fetch in flight");
                    }
                }
                LoadCommand::SetPeriod(period) => self.timer.configure(period, &commands),
                LoadCommand::SetReloadKey(key) => self.update_reload_key(key),
                LoadCommand::SetStaleDataIsError(flag) => self.core.stale_data_is_error = flag,
                LoadCommand::Dispose { result } => {
                    self.dispose();
                    _ = result.send(());
                    break;
                }
            }
            log::debug!("load_service (coroutine) - Command processed");
        }

        // Every handle dropped without an explicit dispose
        if self.machine.state() != LoadState::Disposed {
            self.dispose();
        }
        log::info!("load_service (coroutine) - stopped");
    }

    fn fire(&mut self, trigger: LoadTrigger<T>) {
        match self.machine.fire(trigger, &mut self.core) {
            Ok(Fired::Transitioned { to, .. }) => {
                self.state.send_replace(to);
            }
            Ok(Fired::Ignored) => (),
            Err(e) => log::error!("load_service - {e}"),
        }
    }

    fn complete_fetch(&mut self, generation: u64, outcome: Result<T, FetchError>) {
        if generation != self.core.generation || !self.machine.state().is_fetching() {
            log::debug!("load_service - dropping outcome of superseded fetch #{generation}");
            return;
        }
        let trigger = match outcome {
            Ok(value) => LoadTrigger::EndLoading(value),
            Err(FetchError::Cancelled) => LoadTrigger::CancelLoading,
            Err(error) => {
                log::error!("load_service - fetch #{generation} failed: {error}");
                LoadTrigger::LoadError(error)
            }
        };
        self.fire(trigger);
    }

    fn update_reload_key(&mut self, key: ReloadKey) {
        let changed = self
            .reload_key
            .as_ref()
            .is_none_or(|previous| !previous.same_as(&key));
        self.reload_key = Some(key);
        if changed {
            self.fire(LoadTrigger::BeginLoading);
        } else {
            log::debug!("load_service - reload key unchanged");
        }
    }

    fn dispose(&mut self) {
        self.fire(LoadTrigger::Dispose);
        self.root.cancel();
    }
}

impl<T: Loadable> LoadCore<T> {
    fn render(&self, view: LoadView<T>) {
        self.view.send_replace(view);
    }
}

impl<T: Loadable> LoadEffects<T> for LoadCore<T> {
    fn on_exit_init(&mut self) {
        self.render(LoadView::Loading);
    }

    fn on_begin_loading(&mut self, state: LoadState) {
        let token = self.scope.renew();
        self.generation += 1;
        let generation = self.generation;
        log::debug!("load_service - starting fetch #{generation} ({state})");

        let fetch = (self.fetch)(token.clone());
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                outcome = fetch => outcome,
            };
            // A fetch that observed cancellation only ever reports the cancellation
            let outcome = if token.is_cancelled() {
                Err(FetchError::Cancelled)
            } else {
                outcome
            };
            match commands.upgrade() {
                Some(commands) => {
                    _ = commands.send(LoadCommand::FetchCompleted {
                        generation,
                        outcome,
                    });
                }
                None => log::debug!("fetch #{generation} - controller gone, outcome dropped"),
            }
        });
    }

    fn on_end_loading(&mut self, value: T) {
        let changed = self.last_value.as_ref() != Some(&value);
        let displayed = self.view.borrow().value() == Some(&value);
        if !changed && displayed {
            log::debug!("load_service - loaded value unchanged, nothing to render");
            return;
        }

        self.render(LoadView::Loaded(value.clone()));
        if changed {
            if let Some(on_value_changed) = &self.on_value_changed {
                on_value_changed(&value);
            }
            self.last_value = Some(value);
        }
    }

    fn on_load_error(&mut self, error: FetchError) {
        self.render(LoadView::Error(error));
    }

    fn on_load_stale(&mut self, error: FetchError) {
        if !self.stale_data_is_error {
            log::warn!("load_service - refresh failed, keeping stale data: {error}");
            return;
        }
        self.on_load_error(error);
    }
}

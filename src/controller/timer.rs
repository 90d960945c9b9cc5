use std::time::Duration;

use tokio::{
    sync::mpsc::WeakUnboundedSender,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{config::normalize_period, scope::CancellationScope, service::LoadCommand};

/// Periodic re-trigger of `BeginLoading`.
///
/// At most one tick loop runs at a time; reconfiguring cancels the running loop before
/// starting the next one.
#[derive(Debug)]
pub(crate) struct PeriodicTrigger {
    period: Option<Duration>,
    scope: CancellationScope,
}

impl PeriodicTrigger {
    pub(crate) fn new(parent: &CancellationToken) -> Self {
        Self {
            period: None,
            scope: CancellationScope::new(parent),
        }
    }

    /// Starts, replaces or stops the tick loop. Setting the current period again is a no-op.
    pub(crate) fn configure<T: Send + 'static>(
        &mut self,
        period: Option<Duration>,
        commands: &WeakUnboundedSender<LoadCommand<T>>,
    ) {
        let period = normalize_period(period);
        if period == self.period {
            return;
        }
        log::debug!("periodic_trigger - period {:?} -> {period:?}", self.period);
        self.period = period;

        match period {
            Some(period) => {
                let token = self.scope.renew();
                tokio::spawn(tick_loop(period, token, commands.clone()));
            }
            None => {
                log::debug!("periodic_trigger - disabled");
                self.scope.cancel();
            }
        }
    }
}

async fn tick_loop<T: Send + 'static>(
    period: Duration,
    token: CancellationToken,
    commands: WeakUnboundedSender<LoadCommand<T>>,
) {
    log::debug!("periodic_trigger (task) - start, every {period:?}");
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let Some(commands) = commands.upgrade() else {
                    break;
                };
                if commands
                    .send(LoadCommand::BeginLoading { cause: "timer" })
                    .is_err()
                {
                    break;
                }
            }
        }
    }
    log::debug!("periodic_trigger (task) - stopped");
}

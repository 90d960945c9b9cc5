#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures_util::{future::BoxFuture, FutureExt};
use load_lifecycle::prelude::*;
use tokio::sync::mpsc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lets every ready task run. Relies on the paused clock of `start_paused` tests.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn wait_for_state<T: Loadable>(controller: &LoadController<T>, state: LoadState) {
    let mut rx = controller.subscribe_state();
    tokio::time::timeout(Duration::from_secs(600), rx.wait_for(|s| *s == state))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {state}, still {}", controller.state()))
        .expect("controller task gone");
}

/// Values passed to the value-changed callback.
pub fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + 'static)
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |value: &T| sink.lock().unwrap().push(value.clone()))
}

/// Fetch function whose outcomes are fed by the test, one per fetch.
pub struct Script<T> {
    outcomes: mpsc::UnboundedSender<Result<T, FetchError>>,
    receiver: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<T, FetchError>>>>,
    tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl<T: Send + 'static> Script<T> {
    pub fn new() -> Self {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        Self {
            outcomes,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            tokens: Arc::default(),
        }
    }

    pub fn fetch(
        &self,
    ) -> impl Fn(CancellationToken) -> BoxFuture<'static, Result<T, FetchError>> + Send + 'static
    {
        let receiver = self.receiver.clone();
        let tokens = self.tokens.clone();
        move |token| {
            tokens.lock().unwrap().push(token);
            let receiver = receiver.clone();
            async move {
                let outcome = receiver.lock().await.recv().await;
                match outcome {
                    Some(outcome) => outcome,
                    None => std::future::pending().await,
                }
            }
            .boxed()
        }
    }

    pub fn resolve(&self, value: T) {
        self.outcomes.send(Ok(value)).ok().expect("script closed");
    }

    pub fn fail(&self, message: &str) {
        self.outcomes
            .send(Err(FetchError::failed(message)))
            .ok()
            .expect("script closed");
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    /// Cancellation signal handed to the `index`-th fetch.
    pub fn token(&self, index: usize) -> CancellationToken {
        self.tokens.lock().unwrap()[index].clone()
    }
}

/// Fetch function resolving immediately with its own call number, starting at 1.
pub fn counting() -> (
    Arc<AtomicUsize>,
    impl Fn(CancellationToken) -> BoxFuture<'static, Result<usize, FetchError>> + Send + 'static,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetch = move |_token: CancellationToken| {
        let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok(call) }.boxed()
    };
    (calls, fetch)
}

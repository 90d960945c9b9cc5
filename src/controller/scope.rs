use tokio_util::sync::CancellationToken;

/// Holds the single live cancellation token of an operation (a fetch, or the timer loop).
///
/// Tokens are never reused: [`renew`](Self::renew) cancels the previous token before
/// handing out a fresh child of the parent, so two operations can never share a signal.
/// Cancelling the parent cancels whatever token is live.
#[derive(Debug)]
pub(crate) struct CancellationScope {
    parent: CancellationToken,
    current: Option<CancellationToken>,
}

impl CancellationScope {
    pub(crate) fn new(parent: &CancellationToken) -> Self {
        Self {
            parent: parent.clone(),
            current: None,
        }
    }

    /// Supersedes the live token, if any, with a new one.
    pub(crate) fn renew(&mut self) -> CancellationToken {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let token = self.parent.child_token();
        self.current = Some(token.clone());
        token
    }

    pub(crate) fn cancel(&self) {
        if let Some(token) = &self.current {
            token.cancel();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.current
            .as_ref()
            .is_none_or(CancellationToken::is_cancelled)
    }
}

// src/core/cancel.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A cloneable cancellation signal shared by the runner and every probe.
///
/// Once fired it stays fired. Probes race their network call against
/// [`CancelToken::cancelled`]; the runner checks [`CancelToken::is_cancelled`]
/// before admitting each candidate.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the token has been cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancels the token once `deadline` elapses. Used for the whole-run timeout.
    pub fn cancel_after(&self, deadline: Duration) -> JoinHandle<()> {
        let token = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    info!(deadline_secs = deadline.as_secs(), "Run deadline reached, cancelling.");
                    token.cancel();
                }
            }
        })
    }
}

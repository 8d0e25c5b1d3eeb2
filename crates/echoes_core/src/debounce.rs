//! crates/echoes_core/src/debounce.rs
//!
//! A cancellable scheduled task used to coalesce bursts of input (e.g. typing)
//! into a single piece of follow-up work such as sentiment analysis.
//!
//! Every call to [`Debouncer::schedule`] cancels the pending task, if any, and
//! starts a new quiet period. Only the most recently scheduled task can run.
//! A task that has already started running is not interrupted.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Quiet period used for debounced analysis of journal text.
pub const ANALYSIS_QUIET_PERIOD: Duration = Duration::from_secs(3);

pub struct Debouncer {
    quiet: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `task` to run after the quiet period.
    ///
    /// The returned handle resolves to `true` if the task ran and `false` if it
    /// was superseded or cancelled first. Must be called within a tokio runtime.
    pub fn schedule<F>(&self, task: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            debug!("Superseding pending debounced task");
            previous.cancel();
        }

        let quiet = self.quiet;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => false,
                _ = tokio::time::sleep(quiet) => {
                    task.await;
                    true
                }
            }
        })
    }

    /// Drops the pending task without scheduling a new one.
    pub fn cancel(&self) {
        if let Some(token) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(ANALYSIS_QUIET_PERIOD)
    }
}

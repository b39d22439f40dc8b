//! Single-flight coordination for token refreshes.
//!
//! The first caller to find the gate idle performs the refresh; everyone
//! arriving while it is in flight joins the waiter list and receives the same
//! outcome once it lands. Waiters are resumed in arrival order, on success and
//! on failure alike.

use log::debug;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Why a refresh did not produce a new access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// The refresh call was made and failed.
    Rejected(String),
    /// The caller performing the refresh went away before it finished.
    Abandoned,
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailure::Rejected(msg) => write!(f, "token refresh failed: {}", msg),
            RefreshFailure::Abandoned => write!(f, "token refresh was abandoned"),
        }
    }
}

impl std::error::Error for RefreshFailure {}

pub type RefreshOutcome = Result<String, RefreshFailure>;

enum GateState {
    Idle,
    InFlight(Vec<oneshot::Sender<RefreshOutcome>>),
}

pub struct RefreshGate {
    state: Mutex<GateState>,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
        }
    }

    /// Runs `refresh` unless one is already in flight, in which case waits for
    /// that one and returns its outcome.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let waiter = {
            let mut state = self.lock();
            match &mut *state {
                GateState::InFlight(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    debug!("Refresh in flight; queued as waiter #{}", waiters.len());
                    Some(rx)
                }
                GateState::Idle => {
                    *state = GateState::InFlight(Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            return rx.await.unwrap_or(Err(RefreshFailure::Abandoned));
        }

        let guard = LeaderGuard {
            gate: self,
            finished: false,
        };
        let outcome = refresh().await;
        guard.finish(&outcome);
        outcome
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), GateState::InFlight(_))
    }

    /// Number of callers queued behind the in-flight refresh.
    pub fn waiting(&self) -> usize {
        match &*self.lock() {
            GateState::InFlight(waiters) => waiters.len(),
            GateState::Idle => 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_waiters(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        match std::mem::replace(&mut *self.lock(), GateState::Idle) {
            GateState::InFlight(waiters) => waiters,
            GateState::Idle => Vec::new(),
        }
    }
}

/// Returns the gate to idle even if the leading future is dropped mid-refresh.
struct LeaderGuard<'a> {
    gate: &'a RefreshGate,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(mut self, outcome: &RefreshOutcome) {
        self.finished = true;
        let waiters = self.gate.take_waiters();
        debug!("Refresh settled; resuming {} waiter(s)", waiters.len());
        for tx in waiters {
            // receiver dropped: that caller is gone
            let _ = tx.send(outcome.clone());
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // dropping the senders wakes every waiter with Abandoned
            let waiters = self.gate.take_waiters();
            debug!("Refresh abandoned with {} waiter(s)", waiters.len());
        }
    }
}

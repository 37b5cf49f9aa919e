//! Single-flight credential renewal
//!
//! At most one renewal exchange runs at a time. The first caller to arrive
//! while no renewal is in flight becomes the leader and runs the exchange;
//! everyone arriving while it runs parks a continuation and receives the
//! leader's outcome. Continuations are settled exactly once, in the order
//! they were parked, after which the latch is released and the queue is
//! empty again.

use std::future::Future;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// The renewal a caller was waiting on was abandoned before it settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("credential renewal was cancelled")]
pub struct RefreshCancelled;

type Continuation<E> = oneshot::Sender<Result<String, E>>;

struct RefreshState<E> {
    refreshing: bool,
    pending: Vec<Continuation<E>>,
    cycles: u64,
}

/// Renewal latch plus the queue of callers waiting on it
///
/// The lock is never held across an `.await`.
pub struct RefreshCoordinator<E> {
    state: Mutex<RefreshState<E>>,
}

impl<E> RefreshCoordinator<E>
where
    E: Clone + From<RefreshCancelled>,
{
    pub fn new() -> Self {
        Self { state: Mutex::new(RefreshState { refreshing: false, pending: Vec::new(), cycles: 0 }) }
    }

    /// Obtain a renewed credential
    ///
    /// Leads with `exchange` when no renewal is in flight, otherwise waits for
    /// the in-flight one. `exchange` must finish every side effect of the
    /// outcome (storing the credential, or clearing the session) before it
    /// returns; waiters are released only afterwards.
    ///
    /// If the leading future is dropped before `exchange` completes, waiters
    /// receive `E::from(RefreshCancelled)` and the latch is released.
    pub async fn renew<F, Fut>(&self, exchange: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let waiter = {
            let mut state = self.state.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.pending.push(tx);
                debug!(position = state.pending.len(), "waiting on in-flight renewal");
                Some(rx)
            } else {
                state.refreshing = true;
                state.cycles += 1;
                debug!(cycle = state.cycles, "starting credential renewal");
                None
            }
        };

        if let Some(rx) = waiter {
            return rx.await.unwrap_or_else(|_| Err(E::from(RefreshCancelled)));
        }

        let mut guard = LeaderGuard { coordinator: self, settled: false };
        let outcome = exchange().await;
        guard.settle(&outcome);
        outcome
    }

    /// Whether a renewal is in flight
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Number of callers parked behind the in-flight renewal
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of renewal exchanges started so far
    pub fn cycles(&self) -> u64 {
        self.state.lock().cycles
    }

    fn settle(&self, outcome: &Result<String, E>) {
        let mut state = self.state.lock();
        let waiters = std::mem::take(&mut state.pending);
        let count = waiters.len();
        for waiter in waiters {
            // A waiter whose request was dropped no longer listens
            let _ = waiter.send(outcome.clone());
        }
        state.refreshing = false;
        debug!(waiters = count, ok = outcome.is_ok(), "credential renewal settled");
    }
}

impl<E> Default for RefreshCoordinator<E>
where
    E: Clone + From<RefreshCancelled>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for RefreshCoordinator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &state.refreshing)
            .field("pending", &state.pending.len())
            .field("cycles", &state.cycles)
            .finish()
    }
}

/// Releases the latch if the leading future is dropped mid-exchange
struct LeaderGuard<'a, E>
where
    E: Clone + From<RefreshCancelled>,
{
    coordinator: &'a RefreshCoordinator<E>,
    settled: bool,
}

impl<E> LeaderGuard<'_, E>
where
    E: Clone + From<RefreshCancelled>,
{
    fn settle(&mut self, outcome: &Result<String, E>) {
        self.coordinator.settle(outcome);
        self.settled = true;
    }
}

impl<E> Drop for LeaderGuard<'_, E>
where
    E: Clone + From<RefreshCancelled>,
{
    fn drop(&mut self) {
        if !self.settled {
            warn!("credential renewal abandoned, rejecting waiters");
            self.coordinator.settle(&Err(E::from(RefreshCancelled)));
        }
    }
}

//! Single-flight reauthentication bookkeeping
//!
//! `RefreshCoordinator` decides *what* happens around a refresh; it never
//! performs I/O. The dispatcher calls [`RefreshCoordinator::enqueue`] for every
//! 401 and, when that call opens a new cycle, runs the reauthenticator outside
//! the lock and hands the outcome back to [`RefreshCoordinator::resolve`].
//!
//! Cycle:
//! 1. Every 401 is appended to the waiting queue.
//! 2. The append that finds the queue empty moves the state to `InFlight` and
//!    becomes the trigger; it is the only one that calls the reauthenticator.
//! 3. Resolution drains the whole queue in one step and returns to `Idle`.
//!    Replays that 401 again open a fresh cycle.

use std::collections::HashMap;

use reauth_domain::{ApiError, RefreshOutcome, RequestDescriptor, RequestId};
use tracing::{debug, info, warn};

use super::ledger::RetryLedger;
use super::queue::{Completion, WaitingQueue, Waiter};

/// Whether a reauthentication call is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh outstanding; the next 401 opens a cycle.
    #[default]
    Idle,
    /// A reauthentication call is running and new 401s queue behind it.
    InFlight,
}

/// What to do with each waiter once a refresh resolves.
#[derive(Debug, Default)]
pub struct DrainPlan {
    /// Requests to resubmit, already carrying the refreshed credential.
    pub replays: Vec<(RequestDescriptor, Completion)>,
    /// Terminal failures to deliver, keyed by the waiter's identity.
    pub failures: Vec<(RequestId, Completion, ApiError)>,
}

impl DrainPlan {
    /// Number of waiters the plan settles.
    pub fn len(&self) -> usize {
        self.replays.len() + self.failures.len()
    }

    /// `true` when no waiter was drained.
    pub fn is_empty(&self) -> bool {
        self.replays.is_empty() && self.failures.is_empty()
    }
}

/// Refresh state plus the queue of requests waiting on it.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: RefreshState,
    queue: WaitingQueue,
}

impl RefreshCoordinator {
    /// An idle coordinator with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current refresh state.
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Requests parked on the outstanding refresh.
    pub fn waiting(&self) -> usize {
        self.queue.len()
    }

    /// Park a request that received 401.
    ///
    /// Returns the request to pass to the reauthenticator when this call
    /// opened a new cycle, `None` when a refresh is already outstanding.
    pub fn enqueue(&mut self, waiter: Waiter) -> Option<RequestDescriptor> {
        let trigger = waiter.descriptor.clone();
        let request_id = trigger.id().short().to_string();

        if self.queue.push(waiter) {
            self.state = RefreshState::InFlight;
            info!(request_id = %request_id, "starting credential refresh");
            Some(trigger)
        } else {
            debug!(
                request_id = %request_id,
                waiting = self.queue.len(),
                "credential refresh in flight; request queued"
            );
            None
        }
    }

    /// Resolve the outstanding cycle and drain every waiter.
    ///
    /// On a renewal each identity that still has budget is charged one retry
    /// and all of its waiters are replayed with the new credential. The
    /// decision is taken once per identity per cycle, so identical requests
    /// queued together share both the charge and the outcome. Waiters whose
    /// identity has no budget left (the trigger included) are removed from
    /// the ledger and fail with their last 401. On a denial every waiter is removed from the ledger and fails
    /// with `RefreshDenied`. The queue is empty and the state `Idle`
    /// afterwards.
    pub fn resolve(
        &mut self,
        ledger: &mut RetryLedger,
        trigger: &RequestId,
        outcome: &RefreshOutcome,
    ) -> DrainPlan {
        let waiters = self.queue.drain();
        self.state = RefreshState::Idle;

        let mut plan = DrainPlan::default();

        match outcome {
            RefreshOutcome::Renewed { credential } => {
                let trigger_budget = ledger.remaining(trigger);
                if trigger_budget == 0 {
                    warn!(
                        request_id = %trigger.short(),
                        "retry budget exhausted for refresh trigger"
                    );
                }

                let mut granted: HashMap<RequestId, bool> = HashMap::new();
                for Waiter { descriptor, last_response, completion } in waiters {
                    let id = descriptor.id();
                    let replay = *granted.entry(id.clone()).or_insert_with(|| {
                        let allowed = ledger.remaining(id) > 0;
                        if allowed {
                            ledger.decrement(id);
                        }
                        allowed
                    });

                    if replay {
                        plan.replays.push((descriptor.with_auth_token(credential.as_str()), completion));
                    } else {
                        ledger.remove(id);
                        plan.failures.push((
                            id.clone(),
                            completion,
                            ApiError::Unauthorized { response: last_response },
                        ));
                    }
                }

                info!(
                    replays = plan.replays.len(),
                    exhausted = plan.failures.len(),
                    "credential refresh succeeded"
                );
            }
            RefreshOutcome::Denied => {
                for Waiter { descriptor, last_response, completion } in waiters {
                    let id = descriptor.id().clone();
                    ledger.remove(&id);
                    plan.failures.push((
                        id,
                        completion,
                        ApiError::RefreshDenied { response: last_response },
                    ));
                }

                warn!(
                    request_id = %trigger.short(),
                    failed = plan.failures.len(),
                    "credential refresh denied"
                );
            }
        }

        plan
    }
}

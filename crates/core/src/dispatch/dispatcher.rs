//! The public execution entry point
//!
//! `Dispatcher::execute` sends a descriptor through the transport, classifies
//! the outcome and, on 401, joins the single-flight refresh cycle. Every
//! dispatch runs as its own task so that a caller dropping its future never
//! leaves the ledger or the waiting queue half-updated; the caller only awaits
//! the completion channel.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use reauth_domain::constants::DEFAULT_RETRY_BUDGET;
use reauth_domain::{
    ApiError, RawResponse, RefreshOutcome, RequestDescriptor, RequestId, Result, TransportError,
    TransportErrorKind,
};
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn, Instrument};

use super::classifier::{classify, Classification};
use super::ledger::RetryLedger;
use super::queue::{Completion, Waiter};
use super::refresh::{RefreshCoordinator, RefreshState};
use crate::ports::{Reauthenticator, Transport};

/// Configuration for [`Dispatcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Retries granted per identity after successful refreshes.
    pub retry_budget: u32,
    /// Deadline for transport calls whose descriptor does not set one.
    pub default_deadline: Option<Duration>,
    /// Upper bound on one reauthentication. Expiry counts as a denial.
    pub refresh_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { retry_budget: DEFAULT_RETRY_BUDGET, default_deadline: None, refresh_timeout: None }
    }
}

/// Point-in-time view of coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Identities with a ledger entry (dispatched and not yet resolved).
    pub tracked: usize,
    /// Requests parked on the outstanding refresh.
    pub waiting: usize,
    /// Whether a refresh is outstanding.
    pub refresh_state: RefreshState,
    /// Reauthentication calls issued since construction.
    pub refreshes_started: u64,
}

/// Everything the coordinator mutates, behind one lock.
#[derive(Debug, Default)]
struct CoordinatorState {
    ledger: RetryLedger,
    refresh: RefreshCoordinator,
}

struct Inner {
    transport: Arc<dyn Transport>,
    reauthenticator: Arc<dyn Reauthenticator>,
    config: DispatcherConfig,
    state: Mutex<CoordinatorState>,
    refreshes_started: AtomicU64,
}

/// Executes requests and coordinates reauthentication for one client.
///
/// Cloning is cheap and clones share the same coordinator state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Create a dispatcher over the given ports.
    pub fn new(
        transport: Arc<dyn Transport>,
        reauthenticator: Arc<dyn Reauthenticator>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                reauthenticator,
                config,
                state: Mutex::new(CoordinatorState::default()),
                refreshes_started: AtomicU64::new(0),
            }),
        }
    }

    /// Configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Execute one request.
    ///
    /// 401 responses are absorbed: the request waits for a credential refresh
    /// and is replayed, at most `retry_budget` times. Every other outcome is
    /// delivered as-is.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - `ApiError::Network` when no response was received (incl. deadline)
    /// - `ApiError::Unauthorized` when the retry budget ran out
    /// - `ApiError::RefreshDenied` when the reauthenticator refused
    /// - `ApiError::RateLimited`, `Client`, `Server` for other non-2xx
    #[instrument(
        skip(self, descriptor),
        fields(request_id = %descriptor.id().short(), method = %descriptor.method())
    )]
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<RawResponse> {
        let (completion, outcome) = oneshot::channel();

        let created =
            self.inner.state.lock().ledger.ensure(descriptor.id(), self.inner.config.retry_budget);
        debug!(fresh_entry = created, url = %descriptor.url(), "dispatching request");

        self.inner.spawn_attempt(descriptor, completion);

        outcome.await.map_err(|_| {
            ApiError::Internal("request task ended without delivering a result".into())
        })?
    }

    /// Retries left for `id`, or `None` when it has no ledger entry.
    pub fn remaining_retries(&self, id: &RequestId) -> Option<u32> {
        self.inner.state.lock().ledger.get(id)
    }

    /// Snapshot of the ledger, the waiting queue and the refresh state.
    pub fn stats(&self) -> DispatcherStats {
        let state = self.inner.state.lock();
        DispatcherStats {
            tracked: state.ledger.len(),
            waiting: state.refresh.waiting(),
            refresh_state: state.refresh.state(),
            refreshes_started: self.inner.refreshes_started.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn spawn_attempt(self: &Arc<Self>, descriptor: RequestDescriptor, completion: Completion) {
        let task = Arc::clone(self).attempt(descriptor, completion);
        tokio::spawn(task.in_current_span());
    }

    /// One transport round trip and its follow-up.
    ///
    /// Boxed because a 401 can lead back here through the refresh drain.
    fn attempt(
        self: Arc<Self>,
        descriptor: RequestDescriptor,
        completion: Completion,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let sent = self.send(&descriptor).await;
            let classification = classify(sent);

            debug!(
                request_id = %descriptor.id().short(),
                outcome = classification.label(),
                "transport call classified"
            );

            match classification {
                Classification::Unauthorized(response) => {
                    self.on_unauthorized(descriptor, response, completion).await;
                }
                other => self.finish(descriptor.id(), completion, other.into_result()),
            }
        })
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
    ) -> std::result::Result<RawResponse, TransportError> {
        let call = AssertUnwindSafe(self.transport.send(descriptor)).catch_unwind();
        let deadline = descriptor.deadline().or(self.config.default_deadline);

        let result = match deadline {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => return Err(TransportError::timeout(limit)),
            },
            None => call.await,
        };

        result.unwrap_or_else(|_| {
            Err(TransportError::new(TransportErrorKind::Other, "transport panicked"))
        })
    }

    fn finish(&self, id: &RequestId, completion: Completion, result: Result<RawResponse>) {
        self.state.lock().ledger.remove(id);
        deliver(id, completion, result);
    }

    async fn on_unauthorized(
        self: Arc<Self>,
        descriptor: RequestDescriptor,
        response: RawResponse,
        completion: Completion,
    ) {
        let trigger = self.state.lock().refresh.enqueue(Waiter {
            descriptor,
            last_response: response,
            completion,
        });

        if let Some(trigger) = trigger {
            self.refreshes_started.fetch_add(1, Ordering::Relaxed);
            let outcome = self.reauthenticate(&trigger).await;
            self.drain(trigger.id(), &outcome);
        }
    }

    async fn reauthenticate(&self, trigger: &RequestDescriptor) -> RefreshOutcome {
        // A panicking or hanging reauthenticator must still release the queue.
        let call = AssertUnwindSafe(self.reauthenticator.reauthenticate(trigger)).catch_unwind();

        let result = match self.config.refresh_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?limit, "credential refresh timed out");
                    return RefreshOutcome::Denied;
                }
            },
            None => call.await,
        };

        match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(error)) => {
                warn!(error = %error, "credential refresh failed");
                RefreshOutcome::Denied
            }
            Err(_) => {
                warn!("credential refresh panicked");
                RefreshOutcome::Denied
            }
        }
    }

    fn drain(self: &Arc<Self>, trigger: &RequestId, outcome: &RefreshOutcome) {
        let plan = {
            let mut guard = self.state.lock();
            let CoordinatorState { ledger, refresh } = &mut *guard;
            refresh.resolve(ledger, trigger, outcome)
        };

        for (descriptor, completion) in plan.replays {
            debug!(request_id = %descriptor.id().short(), "replaying request");
            self.spawn_attempt(descriptor, completion);
        }

        for (id, completion, error) in plan.failures {
            deliver(&id, completion, Err(error));
        }
    }
}

fn deliver(id: &RequestId, completion: Completion, result: Result<RawResponse>) {
    if let Err(error) = &result {
        let status = error.response().map(RawResponse::status);
        debug!(request_id = %id.short(), status = ?status, error = %error, "request failed");
    }
    if completion.send(result).is_err() {
        debug!(request_id = %id.short(), "caller went away before the result was delivered");
    }
}

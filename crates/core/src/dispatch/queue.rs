//! Requests parked while a refresh is outstanding

use std::collections::VecDeque;

use reauth_domain::{ApiError, RawResponse, RequestDescriptor};
use tokio::sync::oneshot;

/// Completion channel for one `execute` call.
pub type Completion = oneshot::Sender<Result<RawResponse, ApiError>>;

/// A request that received 401 and waits for the current refresh.
#[derive(Debug)]
pub struct Waiter {
    /// Request to replay once the credential is renewed.
    pub descriptor: RequestDescriptor,
    /// The 401 that put the request here, delivered if it cannot be replayed.
    pub last_response: RawResponse,
    /// Where the final result goes.
    pub completion: Completion,
}

/// Arrival-ordered list of waiters.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    waiters: VecDeque<Waiter>,
}

impl WaitingQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a waiter. Returns `true` if the queue was empty beforehand.
    pub fn push(&mut self, waiter: Waiter) -> bool {
        let was_empty = self.waiters.is_empty();
        self.waiters.push_back(waiter);
        was_empty
    }

    /// Take every waiter, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Waiter> {
        self.waiters.drain(..).collect()
    }

    /// Number of parked waiters.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// `true` when nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

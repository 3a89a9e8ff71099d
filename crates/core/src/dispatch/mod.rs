//! Request dispatch with single-flight reauthentication
//!
//! Control flow:
//!
//! ```text
//! execute ─▶ Transport ─▶ classify ─┬─ Success ──────────▶ deliver
//!                                   ├─ Unauthorized ─────▶ RefreshCoordinator
//!                                   │                        │ (first 401 only)
//!                                   │                        ▼
//!                                   │                   Reauthenticator
//!                                   │                        │
//!                                   │          drain queue ◀─┘ replay / fail
//!                                   └─ anything else ────▶ deliver error
//! ```
//!
//! `RetryLedger`, `WaitingQueue` and `RefreshState` live together behind one
//! mutex owned by the `Dispatcher`. The lock is only ever held for
//! bookkeeping; transport and reauthentication calls run outside it.

pub mod classifier;
pub mod dispatcher;
pub mod ledger;
pub mod queue;
pub mod refresh;

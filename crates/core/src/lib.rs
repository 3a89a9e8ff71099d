//! # Reauth Core
//!
//! Execution, retry and reauthentication coordination - no I/O of its own.
//!
//! This crate contains:
//! - Port interfaces (`Transport`, `Reauthenticator`)
//! - The retry ledger, waiting queue and single-flight refresh coordinator
//! - The response classifier
//! - The `Dispatcher`, the public `execute` entry point
//!
//! ## Architecture Principles
//! - Only depends on `reauth-domain`
//! - No HTTP, file or platform code
//! - All external calls go through traits and happen outside the
//!   coordinator lock

pub mod dispatch;
pub mod ports;

pub use dispatch::classifier::{classify, Classification};
pub use dispatch::dispatcher::{Dispatcher, DispatcherConfig, DispatcherStats};
pub use dispatch::ledger::RetryLedger;
pub use dispatch::queue::{Completion, WaitingQueue, Waiter};
pub use dispatch::refresh::{DrainPlan, RefreshCoordinator, RefreshState};
pub use ports::{Reauthenticator, Transport};

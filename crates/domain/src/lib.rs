//! # Reauth Domain
//!
//! Data types shared by every layer of the reauth workspace.
//!
//! This crate contains:
//! - Request and response models (`RequestDescriptor`, `RawResponse`)
//! - The error taxonomy (`ApiError`, `TransportError`)
//! - Client configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other reauth crates
//! - No I/O, no async runtime
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

//! HTTP transport

pub mod client;

pub(crate) use client::read_response;
pub use client::{HttpTransport, HttpTransportBuilder};

//! Request templates, response decoding and the client facade

pub mod client;
pub mod decode;
pub mod request;

pub use client::{ApiClient, ApiClientBuilder};
pub use decode::decode_json;
pub use request::{RequestBody, RequestTemplate};

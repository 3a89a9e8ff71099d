//! Domain types and models

pub mod refresh;
pub mod request;
pub mod response;

pub use refresh::RefreshOutcome;
pub use request::{HttpMethod, RequestDescriptor, RequestDescriptorBuilder, RequestId};
pub use response::RawResponse;

//! Best-effort track metadata: the tag-reading service and the adapter that
//! turns its results into display fields.
//!
//! Reading tags never gates playback; replies arrive whenever the service
//! finishes and are matched to the load they were requested for.

mod adapter;
mod service;

pub use adapter::*;
pub use service::*;

//! Ports (traits) for cross-crate abstractions.
//!
//! The prober in tb-core depends only on these traits; the concrete HTTP
//! stack is injected, which keeps latency scenarios testable without a network.

pub mod http;

pub use http::*;

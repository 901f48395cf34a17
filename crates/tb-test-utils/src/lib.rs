//! Shared test utilities for the tunbridge workspace
//!
//! - Mock SOCKS5 server that answers HTTP probes itself instead of dialing
//!   the requested target
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! tb-test-utils = { path = "../tb-test-utils" }
//! ```
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tb_test_utils::socks5::start_mock_socks5_http;
//!
//! #[tokio::test]
//! async fn latency_through_mock() {
//!     let mock = start_mock_socks5_http(vec![204], Duration::ZERO).await.unwrap();
//!     // Point an HTTP client at mock.uri() ...
//! }
//! ```

pub mod socks5;

pub use socks5::{
    start_mock_socks5_http, start_mock_socks5_with, MockOptions, MockProbeServer,
};

//! Latency verification through the local listener.
//! 通过本地监听器测量延迟。

pub mod latency;
pub mod reqwest_client;

pub use latency::{measure_latency, measure_latency_with, LatencyProber, ProbeOptions};
pub use reqwest_client::ReqwestProbeClient;

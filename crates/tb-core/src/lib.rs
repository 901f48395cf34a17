//! Runtime half of tunbridge: the tunnel core port, listener hot-swap,
//! routing evaluation and latency probing.
//! tunbridge 运行时部分：隧道核心端口、监听器热替换、
//! 路由求值与延迟探测。

pub mod adapter;
pub mod context;
pub mod inbound;
pub mod memory;
pub mod probe;
pub mod router;

pub use adapter::{HandlerError, HandlerInfo, HandlerKind, TunnelCore};
pub use context::Context;
pub use inbound::InboundListenerManager;
pub use memory::MemoryCore;
pub use probe::{measure_latency, measure_latency_with, LatencyProber, ProbeOptions};

//! Inbound listener management.
//! 入站监听管理。

pub mod listener;

pub use listener::InboundListenerManager;

//! Tunnel core port.
//! 隧道核心端口。
//!
//! The packet-forwarding engine is an external collaborator. tb-core only
//! talks to it through [`TunnelCore`]: handler lookup/removal by tag, inbound
//! and outbound registration, and installation of routing and DNS config.
//! Callers pass the core explicitly (see [`crate::Context`]); there is no
//! process-wide instance.

use async_trait::async_trait;
use tb_config::{DnsConfig, InboundSpec, OutboundRoute, RoutingConfig};
use thiserror::Error;

/// Failure reported by the tunnel core for a handler command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler '{0}' not found")]
    NotFound(String),
    #[error("handler '{0}' already exists")]
    Duplicate(String),
    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Inbound,
    Outbound,
}

/// What the core reports about a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub tag: String,
    pub kind: HandlerKind,
}

#[async_trait]
pub trait TunnelCore: Send + Sync {
    /// Look up a handler (inbound or outbound) by tag.
    async fn get_handler(&self, tag: &str) -> Option<HandlerInfo>;

    /// Remove the handler registered under `tag`.
    async fn remove_handler(&self, tag: &str) -> Result<(), HandlerError>;

    /// Register and start a new inbound listener.
    async fn add_inbound_handler(&self, spec: InboundSpec) -> Result<(), HandlerError>;

    /// Register a new outbound route.
    async fn add_outbound_handler(&self, route: OutboundRoute) -> Result<(), HandlerError>;

    /// Replace the routing configuration.
    async fn use_routing(&self, routing: RoutingConfig) -> Result<(), HandlerError>;

    /// Replace the DNS configuration.
    async fn use_dns(&self, dns: DnsConfig) -> Result<(), HandlerError>;
}

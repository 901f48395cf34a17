//! In-memory tunnel core.
//!
//! Keeps the handler table and the active routing/DNS configuration without
//! moving any packets. Used for dry runs and as the reference behaviour of the
//! [`TunnelCore`] port: duplicate tags and duplicate listen addresses are
//! rejected, removing an unknown tag is an error.

use crate::adapter::{HandlerError, HandlerInfo, HandlerKind, TunnelCore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tb_config::{DnsConfig, InboundSpec, OutboundRoute, RoutingConfig};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Handler {
    Inbound(InboundSpec),
    Outbound(OutboundRoute),
}

impl Handler {
    fn kind(&self) -> HandlerKind {
        match self {
            Handler::Inbound(_) => HandlerKind::Inbound,
            Handler::Outbound(_) => HandlerKind::Outbound,
        }
    }
}

/// Thread-safe in-memory [`TunnelCore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCore {
    handlers: Arc<RwLock<HashMap<String, Handler>>>,
    routing: Arc<RwLock<Option<RoutingConfig>>>,
    dns: Arc<RwLock<Option<DnsConfig>>>,
}

impl MemoryCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn inbound(&self, tag: &str) -> Option<InboundSpec> {
        match self.handlers.read().await.get(tag) {
            Some(Handler::Inbound(spec)) => Some(spec.clone()),
            _ => None,
        }
    }

    pub async fn outbound(&self, tag: &str) -> Option<OutboundRoute> {
        match self.handlers.read().await.get(tag) {
            Some(Handler::Outbound(route)) => Some(route.clone()),
            _ => None,
        }
    }

    /// Number of live inbound listeners.
    pub async fn inbound_count(&self) -> usize {
        self.handlers
            .read()
            .await
            .values()
            .filter(|h| matches!(h, Handler::Inbound(_)))
            .count()
    }

    pub async fn list_tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self.handlers.read().await.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub async fn routing(&self) -> Option<RoutingConfig> {
        self.routing.read().await.clone()
    }

    pub async fn dns(&self) -> Option<DnsConfig> {
        self.dns.read().await.clone()
    }
}

#[async_trait]
impl TunnelCore for MemoryCore {
    async fn get_handler(&self, tag: &str) -> Option<HandlerInfo> {
        self.handlers.read().await.get(tag).map(|h| HandlerInfo {
            tag: tag.to_string(),
            kind: h.kind(),
        })
    }

    async fn remove_handler(&self, tag: &str) -> Result<(), HandlerError> {
        self.handlers
            .write()
            .await
            .remove(tag)
            .map(|_| ())
            .ok_or_else(|| HandlerError::NotFound(tag.to_string()))
    }

    async fn add_inbound_handler(&self, spec: InboundSpec) -> Result<(), HandlerError> {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&spec.tag) {
            return Err(HandlerError::Duplicate(spec.tag));
        }
        let addr = spec.socket_addr();
        let in_use = handlers.values().any(|h| match h {
            Handler::Inbound(other) => other.socket_addr() == addr,
            Handler::Outbound(_) => false,
        });
        if in_use {
            return Err(HandlerError::Rejected(format!("address {addr} already in use")));
        }
        tracing::debug!(tag = %spec.tag, %addr, "memory core: inbound added");
        handlers.insert(spec.tag.clone(), Handler::Inbound(spec));
        Ok(())
    }

    async fn add_outbound_handler(&self, route: OutboundRoute) -> Result<(), HandlerError> {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&route.tag) {
            return Err(HandlerError::Duplicate(route.tag));
        }
        tracing::debug!(
            tag = %route.tag,
            protocol = route.protocol(),
            "memory core: outbound added"
        );
        handlers.insert(route.tag.clone(), Handler::Outbound(route));
        Ok(())
    }

    async fn use_routing(&self, routing: RoutingConfig) -> Result<(), HandlerError> {
        *self.routing.write().await = Some(routing);
        Ok(())
    }

    async fn use_dns(&self, dns: DnsConfig) -> Result<(), HandlerError> {
        *self.dns.write().await = Some(dns);
        Ok(())
    }
}

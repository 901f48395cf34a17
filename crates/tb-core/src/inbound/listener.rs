//! Inbound listener manager.
//!
//! Two states per tag: absent and installed. [`InboundListenerManager::ensure_listener`]
//! always goes remove-then-install, so repeated calls leave exactly one live
//! listener under the tag. Concurrent callers are not serialised here; the
//! caller must hold a single-writer discipline.

use crate::adapter::TunnelCore;
use std::sync::Arc;
use tb_config::build_socks_inbound;
use tb_config::defaults::{INBOUND_TAG, TEST_PROXY_PORT};
use tb_types::{ListenerOp, TunnelError};

#[derive(Clone)]
pub struct InboundListenerManager {
    core: Arc<dyn TunnelCore>,
    tag: String,
}

impl std::fmt::Debug for InboundListenerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundListenerManager")
            .field("tag", &self.tag)
            .finish()
    }
}

impl InboundListenerManager {
    /// Manager for the fixed `socks-in` tag.
    pub fn new(core: Arc<dyn TunnelCore>) -> Self {
        Self::with_tag(core, INBOUND_TAG)
    }

    pub fn with_tag(core: Arc<dyn TunnelCore>, tag: impl Into<String>) -> Self {
        Self {
            core,
            tag: tag.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub async fn is_installed(&self) -> bool {
        self.core.get_handler(&self.tag).await.is_some()
    }

    /// Replace whatever listener holds the tag with a fresh SOCKS listener on
    /// `port`, returning its `socks5://` URI.
    ///
    /// A failed removal aborts before anything is installed. A failed install
    /// leaves the tag absent.
    pub async fn ensure_listener(&self, port: u16) -> Result<String, TunnelError> {
        if self.core.get_handler(&self.tag).await.is_some() {
            tracing::debug!(tag = %self.tag, "removing existing listener");
            self.core.remove_handler(&self.tag).await.map_err(|e| {
                tracing::warn!(tag = %self.tag, error = %e, "listener removal failed");
                TunnelError::listener(&self.tag, ListenerOp::Remove, e.to_string())
            })?;
        }

        let spec = build_socks_inbound(&self.tag, port);
        let uri = spec.endpoint_uri();
        self.core.add_inbound_handler(spec).await.map_err(|e| {
            tracing::warn!(tag = %self.tag, port, error = %e, "listener install failed");
            TunnelError::listener(&self.tag, ListenerOp::Install, e.to_string())
        })?;

        tracing::info!(tag = %self.tag, port, uri = %uri, "listener installed");
        Ok(uri)
    }

    /// `ensure_listener` on the fixed test port.
    pub async fn install_test_listener(&self) -> Result<String, TunnelError> {
        self.ensure_listener(TEST_PROXY_PORT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HandlerError, HandlerInfo};
    use crate::memory::MemoryCore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tb_config::{DnsConfig, InboundSpec, OutboundRoute, RoutingConfig};

    /// Wraps a MemoryCore, records calls and optionally fails one command.
    #[derive(Default)]
    struct ScriptedCore {
        inner: MemoryCore,
        calls: Mutex<Vec<String>>,
        fail_remove: bool,
        fail_install: bool,
    }

    impl ScriptedCore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl TunnelCore for ScriptedCore {
        async fn get_handler(&self, tag: &str) -> Option<HandlerInfo> {
            self.record(format!("get:{tag}"));
            self.inner.get_handler(tag).await
        }

        async fn remove_handler(&self, tag: &str) -> Result<(), HandlerError> {
            self.record(format!("remove:{tag}"));
            if self.fail_remove {
                return Err(HandlerError::Rejected("handler busy".into()));
            }
            self.inner.remove_handler(tag).await
        }

        async fn add_inbound_handler(&self, spec: InboundSpec) -> Result<(), HandlerError> {
            self.record(format!("add:{}:{}", spec.tag, spec.port));
            if self.fail_install {
                return Err(HandlerError::Rejected("bind: permission denied".into()));
            }
            self.inner.add_inbound_handler(spec).await
        }

        async fn add_outbound_handler(&self, route: OutboundRoute) -> Result<(), HandlerError> {
            self.inner.add_outbound_handler(route).await
        }

        async fn use_routing(&self, routing: RoutingConfig) -> Result<(), HandlerError> {
            self.inner.use_routing(routing).await
        }

        async fn use_dns(&self, dns: DnsConfig) -> Result<(), HandlerError> {
            self.inner.use_dns(dns).await
        }
    }

    #[tokio::test]
    async fn fresh_install_returns_uri() {
        let core = Arc::new(MemoryCore::new());
        let manager = InboundListenerManager::new(core.clone());
        assert!(!manager.is_installed().await);

        let uri = manager.install_test_listener().await.unwrap();
        assert_eq!(uri, "socks5://127.0.0.1:8899");
        assert!(manager.is_installed().await);

        let spec = core.inbound("socks-in").await.unwrap();
        assert_eq!(spec.port, 8899);
        assert!(spec.settings.udp);
    }

    #[tokio::test]
    async fn stale_listener_is_removed_before_install() {
        let core = Arc::new(ScriptedCore::default());
        core.inner
            .add_inbound_handler(build_socks_inbound("socks-in", 1080))
            .await
            .unwrap();

        let manager = InboundListenerManager::new(core.clone());
        let uri = manager.ensure_listener(8899).await.unwrap();

        assert_eq!(uri, "socks5://127.0.0.1:8899");
        assert_eq!(
            core.calls(),
            ["get:socks-in", "remove:socks-in", "add:socks-in:8899"]
        );
        assert_eq!(core.inner.inbound("socks-in").await.unwrap().port, 8899);
        assert_eq!(core.inner.inbound_count().await, 1);
    }

    #[tokio::test]
    async fn repeated_install_keeps_single_listener() {
        let core = Arc::new(MemoryCore::new());
        let manager = InboundListenerManager::new(core.clone());

        let first = manager.install_test_listener().await.unwrap();
        let second = manager.install_test_listener().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(core.inbound_count().await, 1);
        assert_eq!(core.list_tags().await, ["socks-in"]);
    }

    #[tokio::test]
    async fn removal_failure_aborts_without_install() {
        let core = Arc::new(ScriptedCore {
            fail_remove: true,
            ..Default::default()
        });
        core.inner
            .add_inbound_handler(build_socks_inbound("socks-in", 8899))
            .await
            .unwrap();

        let manager = InboundListenerManager::new(core.clone());
        let err = manager.install_test_listener().await.unwrap_err();

        assert!(matches!(
            err,
            TunnelError::Listener { op: ListenerOp::Remove, ref tag, .. } if tag == "socks-in"
        ));
        assert!(!core.calls().iter().any(|c| c.starts_with("add:")));
    }

    #[tokio::test]
    async fn install_failure_leaves_tag_absent() {
        let core = Arc::new(ScriptedCore {
            fail_install: true,
            ..Default::default()
        });
        core.inner
            .add_inbound_handler(build_socks_inbound("socks-in", 8899))
            .await
            .unwrap();

        let manager = InboundListenerManager::new(core.clone());
        let err = manager.install_test_listener().await.unwrap_err();

        assert!(matches!(err, TunnelError::Listener { op: ListenerOp::Install, .. }));
        assert!(err.to_string().contains("permission denied"));
        assert!(!manager.is_installed().await);
    }

    #[tokio::test]
    async fn custom_tag_is_honoured() {
        let core = Arc::new(MemoryCore::new());
        let manager = InboundListenerManager::with_tag(core.clone(), "probe-in");
        let uri = manager.ensure_listener(18899).await.unwrap();
        assert_eq!(uri, "socks5://127.0.0.1:18899");
        assert_eq!(manager.tag(), "probe-in");
        assert!(core.inbound("probe-in").await.is_some());
    }
}

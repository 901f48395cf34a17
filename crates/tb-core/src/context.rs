//! Explicit context for one configure → listen → probe cycle.
//! 一次配置、监听、探测流程的显式上下文。
//!
//! Holds the tunnel core handle instead of reaching for a global, so several
//! independent cores can be driven side by side.

use crate::adapter::{HandlerError, TunnelCore};
use crate::inbound::InboundListenerManager;
use crate::probe::{measure_latency_with, LatencyProber, ProbeOptions};
use std::sync::Arc;
use tb_config::{build_proxy_configuration, ConfigBundle, Profile};
use tb_types::ports::http::HttpClient;
use tb_types::{ListenerOp, TunnelError};

#[derive(Clone)]
pub struct Context {
    core: Arc<dyn TunnelCore>,
    listeners: InboundListenerManager,
    probe: ProbeOptions,
    http: Option<Arc<dyn HttpClient>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("listeners", &self.listeners)
            .field("probe", &self.probe)
            .field("custom_http", &self.http.is_some())
            .finish()
    }
}

impl Context {
    pub fn new(core: Arc<dyn TunnelCore>) -> Self {
        Self {
            listeners: InboundListenerManager::new(core.clone()),
            core,
            probe: ProbeOptions::default(),
            http: None,
        }
    }

    pub fn with_probe_options(mut self, probe: ProbeOptions) -> Self {
        self.probe = probe;
        self
    }

    /// Probe through `client` instead of a reqwest client bound to the
    /// listener URI.
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http = Some(client);
        self
    }

    pub fn core(&self) -> &Arc<dyn TunnelCore> {
        &self.core
    }

    pub fn listeners(&self) -> &InboundListenerManager {
        &self.listeners
    }

    pub fn probe_options(&self) -> &ProbeOptions {
        &self.probe
    }

    /// Build the bundle for `profile` and hand it to the core. Outbounds with
    /// the same tag are replaced.
    ///
    /// The bundle is rendered once before any command is sent, so a
    /// construction error leaves the core untouched.
    pub async fn apply_profile(&self, profile: &Profile) -> Result<ConfigBundle, TunnelError> {
        let bundle = build_proxy_configuration(profile);
        bundle.to_json()?;

        for route in &bundle.outbounds {
            if self.core.get_handler(&route.tag).await.is_some() {
                self.core
                    .remove_handler(&route.tag)
                    .await
                    .map_err(|e| core_failed(&route.tag, ListenerOp::Remove, e))?;
            }
            self.core
                .add_outbound_handler(route.clone())
                .await
                .map_err(|e| core_failed(&route.tag, ListenerOp::Install, e))?;
        }
        self.core
            .use_routing(bundle.routing.clone())
            .await
            .map_err(|e| core_failed("routing", ListenerOp::Configure, e))?;
        self.core
            .use_dns(bundle.dns.clone())
            .await
            .map_err(|e| core_failed("dns", ListenerOp::Configure, e))?;

        tracing::info!(
            server = %profile.address,
            port = profile.port,
            transport = profile.transport.kind(),
            tls = profile.tls.is_some(),
            "profile applied"
        );
        Ok(bundle)
    }

    pub async fn install_test_listener(&self) -> Result<String, TunnelError> {
        self.listeners.install_test_listener().await
    }

    pub async fn measure_latency(&self, proxy_uri: &str) -> Result<u64, TunnelError> {
        match &self.http {
            Some(client) => {
                LatencyProber::new(client.clone(), self.probe.url.clone())
                    .measure()
                    .await
            }
            None => measure_latency_with(proxy_uri, &self.probe).await,
        }
    }

    /// Apply, install the test listener, then measure.
    pub async fn test_profile(&self, profile: &Profile) -> Result<u64, TunnelError> {
        self.apply_profile(profile).await?;
        let uri = self.install_test_listener().await?;
        self.measure_latency(&uri).await
    }
}

fn core_failed(tag: &str, op: ListenerOp, e: HandlerError) -> TunnelError {
    TunnelError::listener(tag, op, e.to_string())
}

//! The configuration bundle handed to the tunnel core once per cycle.

use crate::dns::{build_dns_config, DnsConfig};
use crate::outbound::{build_direct_outbound, build_proxy_outbound, OutboundRoute};
use crate::profile::Profile;
use crate::route::{build_routing_config, RoutingConfig};
use serde::Serialize;
use serde_json::Value;
use tb_types::{IssueCode, TunnelError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigBundle {
    /// `proxy` first: the tunnel core treats the first outbound as default.
    pub outbounds: Vec<OutboundRoute>,
    pub routing: RoutingConfig,
    pub dns: DnsConfig,
}

impl ConfigBundle {
    pub fn outbound(&self, tag: &str) -> Option<&OutboundRoute> {
        self.outbounds.iter().find(|o| o.tag == tag)
    }

    pub fn to_json(&self) -> Result<Value, TunnelError> {
        serde_json::to_value(self).map_err(|e| {
            TunnelError::construction(IssueCode::SerializeFailed, "/", e.to_string())
        })
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String, TunnelError> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered
            .map_err(|e| TunnelError::construction(IssueCode::SerializeFailed, "/", e.to_string()))
    }
}

/// Build outbounds, routing and DNS for one profile.
pub fn build_proxy_configuration(profile: &Profile) -> ConfigBundle {
    ConfigBundle {
        outbounds: vec![build_proxy_outbound(profile), build_direct_outbound()],
        routing: build_routing_config(),
        dns: build_dns_config(),
    }
}

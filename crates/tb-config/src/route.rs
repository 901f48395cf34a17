//! Routing rule model and builder.
//!
//! Rules are evaluated first-match-wins by the tunnel core. The order built
//! here is the routing policy: private and regional IPs go direct, regional
//! domains go direct, the block-list is dropped, everything else falls through
//! to the `proxy` outbound after an IP re-check (`IPIfNonMatch`).

use crate::defaults::{
    BLOCK_DOMAINS, DIRECT_DOMAIN_CATEGORIES, DIRECT_IP_CATEGORIES, TAG_BLOCKED, TAG_DIRECT,
};
use serde::{Deserialize, Serialize};

/// Whether routing (or a freedom outbound) works on names or resolved IPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DomainStrategy {
    #[default]
    AsIs,
    #[serde(rename = "UseIP")]
    UseIp,
    #[serde(rename = "IPIfNonMatch")]
    IpIfNonMatch,
    #[serde(rename = "IPOnDemand")]
    IpOnDemand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    /// Always `"field"`.
    #[serde(rename = "type")]
    pub rule_type: String,
    pub outbound_tag: String,
    /// IP matchers: `geoip:<code>`, CIDR or plain address.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip: Vec<String>,
    /// Domain matchers: `geosite:<code>`, `domain:`, `full:`, `keyword:`, `regexp:` or substring.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
}

impl RoutingRule {
    fn field(outbound_tag: &str) -> Self {
        Self {
            rule_type: "field".to_string(),
            outbound_tag: outbound_tag.to_string(),
            ip: Vec::new(),
            domain: Vec::new(),
        }
    }

    pub fn ip(outbound_tag: &str, matchers: &[&str]) -> Self {
        Self {
            ip: matchers.iter().map(|s| s.to_string()).collect(),
            ..Self::field(outbound_tag)
        }
    }

    pub fn domain(outbound_tag: &str, matchers: &[&str]) -> Self {
        Self {
            domain: matchers.iter().map(|s| s.to_string()).collect(),
            ..Self::field(outbound_tag)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    pub domain_strategy: DomainStrategy,
    pub rules: Vec<RoutingRule>,
}

/// Build the fixed, ordered rule list.
pub fn build_routing_config() -> RoutingConfig {
    RoutingConfig {
        domain_strategy: DomainStrategy::IpIfNonMatch,
        rules: vec![
            RoutingRule::ip(TAG_DIRECT, DIRECT_IP_CATEGORIES),
            RoutingRule::domain(TAG_DIRECT, DIRECT_DOMAIN_CATEGORIES),
            RoutingRule::domain(TAG_BLOCKED, BLOCK_DOMAINS),
        ],
    }
}

//! DNS 配置：固定的解析器顺序与静态 hosts 表
//! DNS config: fixed resolver order plus static host overrides.

use crate::defaults::{BLOCK_HOSTS, DNS_PORT, LOCAL_DNS, REGIONAL_DNS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameServer {
    pub address: IpAddr,
    pub port: u16,
}

impl NameServer {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Queried in order.
    pub servers: Vec<NameServer>,
    /// hostname -> IP
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hosts: BTreeMap<String, String>,
}

impl DnsConfig {
    pub fn lookup_host(&self, name: &str) -> Option<&str> {
        self.hosts
            .get(&name.trim_end_matches('.').to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Build the resolver list: regional resolver first, local capture second.
// Per-domain server binding (e.g. geosite:cn -> regional) is not wired here.
pub fn build_dns_config() -> DnsConfig {
    DnsConfig {
        servers: vec![
            NameServer {
                address: REGIONAL_DNS,
                port: DNS_PORT,
            },
            NameServer {
                address: LOCAL_DNS,
                port: DNS_PORT,
            },
        ],
        hosts: BLOCK_HOSTS
            .iter()
            .map(|(host, ip)| (host.to_string(), ip.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_order_is_fixed() {
        let cfg = build_dns_config();
        let addrs: Vec<_> = cfg.servers.iter().map(|s| s.socket_addr().to_string()).collect();
        assert_eq!(addrs, ["223.5.5.5:53", "127.0.0.1:53"]);
    }

    #[test]
    fn hosts_table_is_loaded() {
        let cfg = build_dns_config();
        assert_eq!(cfg.hosts.len(), BLOCK_HOSTS.len());
        assert_eq!(cfg.lookup_host("AD.doubleclick.net."), Some("127.0.0.1"));
        assert_eq!(cfg.lookup_host("example.com"), None);
    }

    #[test]
    fn renders_v2ray_dns_json() {
        let value = serde_json::to_value(build_dns_config()).unwrap();
        assert_eq!(value["servers"][0]["address"], "223.5.5.5");
        assert_eq!(value["servers"][1]["port"], 53);
        assert_eq!(value["hosts"]["alog.umeng.com"], "127.0.0.1");
    }
}

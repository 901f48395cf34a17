//! Local SOCKS inbound descriptor.
//!
//! Renders to the v2ray inbound object:
//! `{"tag":"socks-in","protocol":"socks","listen":"127.0.0.1","port":8899,
//!   "settings":{"auth":"noauth","udp":true,"ip":"127.0.0.1"}}`

use crate::defaults::LOOPBACK;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundProtocol {
    Socks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocksAuth {
    NoAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocksSettings {
    pub auth: SocksAuth,
    /// UDP ASSOCIATE enabled
    pub udp: bool,
    /// Address advertised in UDP ASSOCIATE replies.
    pub ip: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundSpec {
    pub tag: String,
    pub protocol: InboundProtocol,
    pub listen: IpAddr,
    pub port: u16,
    pub settings: SocksSettings,
}

impl InboundSpec {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }

    /// Proxy URI clients use to reach this listener, e.g. `socks5://127.0.0.1:8899`.
    pub fn endpoint_uri(&self) -> String {
        format!("socks5://{}", self.socket_addr())
    }
}

/// No-auth SOCKS listener on loopback with UDP associate enabled.
pub fn build_socks_inbound(tag: &str, port: u16) -> InboundSpec {
    InboundSpec {
        tag: tag.to_string(),
        protocol: InboundProtocol::Socks,
        listen: LOOPBACK,
        port,
        settings: SocksSettings {
            auth: SocksAuth::NoAuth,
            udp: true,
            ip: LOOPBACK,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{INBOUND_TAG, TEST_PROXY_PORT};
    use serde_json::json;

    #[test]
    fn socks_inbound_shape() {
        let spec = build_socks_inbound(INBOUND_TAG, TEST_PROXY_PORT);
        assert_eq!(spec.endpoint_uri(), "socks5://127.0.0.1:8899");
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "tag": "socks-in",
                "protocol": "socks",
                "listen": "127.0.0.1",
                "port": 8899,
                "settings": {"auth": "noauth", "udp": true, "ip": "127.0.0.1"}
            })
        );
    }
}

//! Outbound 配置模型与构建
//! Outbound route model and builders.
//!
//! An [`OutboundRoute`] renders to the v2ray outbound object:
//!
//! ```json
//! {"tag":"proxy","protocol":"vmess","settings":{"vnext":[...]},
//!  "mux":{"enabled":true,"concurrency":16},
//!  "streamSettings":{"network":"ws","wsSettings":{...},"security":"tls","tlsSettings":{...}}}
//! ```
//!
//! Protocol settings are a typed union ([`OutboundSettings`]) and the transport
//! layer is a closed enum ([`TransportSettings`]) built by exhaustive match on
//! the profile's [`Transport`].

use crate::defaults::{
    MUX_CONCURRENCY, TAG_DIRECT, TAG_PROXY, VMESS_SECURITY, VMESS_USER_EMAIL,
};
use crate::profile::{Profile, Transport};
use crate::route::DomainStrategy;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundRoute {
    pub tag: String,
    #[serde(flatten)]
    pub settings: OutboundSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mux: Option<MuxSettings>,
    #[serde(rename = "streamSettings", skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamSettings>,
}

impl OutboundRoute {
    /// Protocol identifier understood by the tunnel core.
    pub fn protocol(&self) -> &'static str {
        match self.settings {
            OutboundSettings::Vmess(_) => "vmess",
            OutboundSettings::Freedom(_) => "freedom",
        }
    }
}

/// Protocol-specific payload, tagged by protocol name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", content = "settings", rename_all = "lowercase")]
pub enum OutboundSettings {
    Vmess(VmessSettings),
    Freedom(FreedomSettings),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmessSettings {
    pub vnext: Vec<VmessServer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmessServer {
    pub address: String,
    pub port: u16,
    pub users: Vec<VmessUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmessUser {
    pub id: String,
    pub alter_id: u16,
    pub email: String,
    pub security: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreedomSettings {
    pub domain_strategy: DomainStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MuxSettings {
    pub enabled: bool,
    pub concurrency: u16,
}

/// Transport plus optional TLS layered on top of the protocol payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub transport: TransportSettings,
    pub tls: Option<TlsSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSettings {
    Tcp,
    WebSocket(WebSocketSettings),
    Quic(QuicSettings),
}

impl TransportSettings {
    pub fn network(&self) -> &'static str {
        match self {
            TransportSettings::Tcp => "tcp",
            TransportSettings::WebSocket(_) => "ws",
            TransportSettings::Quic(_) => "quic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebSocketSettings {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuicSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<QuicHeader>,
}

/// Packet obfuscation descriptor for QUIC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuicHeader {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsSettings {
    /// Certificate validation is disabled for every TLS profile.
    #[serde(rename = "allowInsecure")]
    pub insecure: bool,
    #[serde(rename = "serverName", skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

impl Serialize for StreamSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.transport {
            TransportSettings::Tcp => {}
            TransportSettings::WebSocket(ws) => {
                map.serialize_entry("network", "ws")?;
                map.serialize_entry("wsSettings", ws)?;
            }
            TransportSettings::Quic(quic) => {
                map.serialize_entry("network", "quic")?;
                map.serialize_entry("quicSettings", quic)?;
            }
        }
        if let Some(tls) = &self.tls {
            map.serialize_entry("security", "tls")?;
            map.serialize_entry("tlsSettings", tls)?;
        }
        map.end()
    }
}

fn transport_settings(transport: &Transport) -> TransportSettings {
    match transport {
        Transport::Plain => TransportSettings::Tcp,
        Transport::WebSocket { path, host } => TransportSettings::WebSocket(WebSocketSettings {
            path: path.clone(),
            headers: host
                .as_ref()
                .map(|h| BTreeMap::from([("Host".to_string(), h.clone())])),
        }),
        Transport::Quic {
            key,
            security,
            header_type,
        } => TransportSettings::Quic(QuicSettings {
            security: security.clone(),
            key: key.clone(),
            header: header_type.as_ref().map(|t| QuicHeader { kind: t.clone() }),
        }),
    }
}

/// Build the `proxy` outbound for a validated profile.
pub fn build_proxy_outbound(profile: &Profile) -> OutboundRoute {
    let settings = OutboundSettings::Vmess(VmessSettings {
        vnext: vec![VmessServer {
            address: profile.address.clone(),
            port: profile.port,
            users: vec![VmessUser {
                id: profile.id.clone(),
                alter_id: profile.alter_id,
                email: VMESS_USER_EMAIL.to_string(),
                security: VMESS_SECURITY.to_string(),
            }],
        }],
    });

    let transport = transport_settings(&profile.transport);
    let tls = profile.tls.as_ref().map(|t| TlsSettings {
        insecure: true,
        server_name: t.server_name.clone(),
    });
    let stream = match (&transport, &tls) {
        (TransportSettings::Tcp, None) => None,
        _ => Some(StreamSettings { transport, tls }),
    };

    tracing::debug!(
        address = %profile.address,
        port = profile.port,
        network = profile.transport.kind(),
        tls = profile.tls.is_some(),
        "built proxy outbound"
    );

    OutboundRoute {
        tag: TAG_PROXY.to_string(),
        settings,
        mux: Some(MuxSettings {
            enabled: true,
            concurrency: MUX_CONCURRENCY,
        }),
        stream,
    }
}

/// Build the `direct` pass-through outbound (resolve to IP first).
pub fn build_direct_outbound() -> OutboundRoute {
    OutboundRoute {
        tag: TAG_DIRECT.to_string(),
        settings: OutboundSettings::Freedom(FreedomSettings {
            domain_strategy: DomainStrategy::UseIp,
        }),
        mux: None,
        stream: None,
    }
}

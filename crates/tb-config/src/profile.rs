//! Profile 模型：远端代理端点的协议无关描述
//! Profile model: the validated description of one remote proxy endpoint.
//!
//! Input arrives as a [`RawProfile`] in the common VMess share JSON shape
//! (`add`, `port`, `id`, `aid`, `net`, ...). [`Profile::try_from`] validates it
//! and folds the stringly-typed `net`/`path`/`host`/`type`/`tls` fields into the
//! closed [`Transport`] variant plus optional [`TlsOptions`].

use serde::{Deserialize, Serialize};
use tb_types::{IssueCode, TunnelError};
use uuid::Uuid;

/// Number that may be encoded either as JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumOrString {
    Num(i64),
    Str(String),
}

impl NumOrString {
    fn parse_u16(&self, ptr: &str) -> Result<u16, TunnelError> {
        let value = match self {
            NumOrString::Num(n) => *n,
            NumOrString::Str(s) if s.trim().is_empty() => 0,
            NumOrString::Str(s) => s.trim().parse::<i64>().map_err(|_| {
                TunnelError::construction(
                    IssueCode::TypeMismatch,
                    ptr,
                    format!("expected a number, got '{s}'"),
                )
            })?,
        };
        u16::try_from(value).map_err(|_| {
            TunnelError::construction(
                IssueCode::OutOfRange,
                ptr,
                format!("{value} is outside 0-65535"),
            )
        })
    }
}

impl Default for NumOrString {
    fn default() -> Self {
        NumOrString::Num(0)
    }
}

/// Unvalidated profile as found in share links and profile files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfile {
    /// Display name
    #[serde(default)]
    pub ps: String,
    /// Remote address (host or IP)
    #[serde(default)]
    pub add: String,
    #[serde(default)]
    pub port: NumOrString,
    /// User UUID
    #[serde(default)]
    pub id: String,
    /// Alter id
    #[serde(default)]
    pub aid: NumOrString,
    /// Transport kind: tcp | ws | quic
    #[serde(default)]
    pub net: String,
    /// Obfuscation header type (QUIC only)
    #[serde(default, rename = "type")]
    pub header_type: String,
    /// Host header / SNI override
    #[serde(default)]
    pub host: String,
    /// WebSocket path or QUIC key
    #[serde(default)]
    pub path: String,
    /// "tls" to enable TLS, anything else disables it
    #[serde(default)]
    pub tls: String,
}

/// Transport layering between client and remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Plain,
    WebSocket {
        path: String,
        host: Option<String>,
    },
    Quic {
        /// Pre-shared key, carried in the profile's `path` field.
        key: String,
        /// QUIC security value, carried in the profile's `host` field.
        security: Option<String>,
        header_type: Option<String>,
    },
}

impl Transport {
    pub fn kind(&self) -> &'static str {
        match self {
            Transport::Plain => "tcp",
            Transport::WebSocket { .. } => "ws",
            Transport::Quic { .. } => "quic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsOptions {
    pub server_name: Option<String>,
}

/// Validated, immutable description of a remote VMess endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub address: String,
    pub port: u16,
    pub id: String,
    pub alter_id: u16,
    pub transport: Transport,
    pub tls: Option<TlsOptions>,
}

impl Profile {
    /// Minimal plain-TCP profile without TLS.
    pub fn new(address: impl Into<String>, port: u16, id: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
            port,
            id: id.into(),
            alter_id: 0,
            transport: Transport::Plain,
            tls: None,
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_tls(mut self, server_name: Option<String>) -> Self {
        self.tls = Some(TlsOptions { server_name });
        self
    }

    pub fn with_alter_id(mut self, alter_id: u16) -> Self {
        self.alter_id = alter_id;
        self
    }

    /// Parse and validate a profile from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, TunnelError> {
        let raw: RawProfile = serde_json::from_str(text).map_err(|e| {
            TunnelError::construction(IssueCode::TypeMismatch, "/", e.to_string())
        })?;
        Profile::try_from(raw)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl TryFrom<RawProfile> for Profile {
    type Error = TunnelError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        let address = non_empty(&raw.add).ok_or_else(|| {
            TunnelError::construction(IssueCode::MissingRequired, "/add", "remote address is empty")
        })?;
        let port = raw.port.parse_u16("/port")?;
        let alter_id = raw.aid.parse_u16("/aid")?;

        let id = raw.id.trim().to_string();
        if Uuid::parse_str(&id).is_err() {
            return Err(TunnelError::construction(
                IssueCode::TypeMismatch,
                "/id",
                format!("user id '{id}' is not a UUID"),
            ));
        }

        let host = non_empty(&raw.host);
        let transport = match raw.net.trim().to_ascii_lowercase().as_str() {
            "ws" | "websocket" => Transport::WebSocket {
                path: raw.path.clone(),
                host: host.clone(),
            },
            "quic" => Transport::Quic {
                key: raw.path.clone(),
                security: host.clone(),
                header_type: non_empty(&raw.header_type),
            },
            "" | "tcp" => Transport::Plain,
            other => {
                tracing::warn!(
                    net = %other,
                    address = %address,
                    "unknown transport kind, using plain tcp"
                );
                Transport::Plain
            }
        };

        let tls = raw
            .tls
            .trim()
            .eq_ignore_ascii_case("tls")
            .then(|| TlsOptions { server_name: host });

        Ok(Profile {
            name: non_empty(&raw.ps),
            address,
            port,
            id,
            alter_id,
            transport,
            tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "b831381d-6324-4d53-ad4f-8cda48b30811";

    fn raw() -> RawProfile {
        RawProfile {
            add: "proxy.example.net".into(),
            port: NumOrString::Num(443),
            id: ID.into(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_profile_defaults() {
        let p = Profile::try_from(raw()).unwrap();
        assert_eq!(p.address, "proxy.example.net");
        assert_eq!(p.port, 443);
        assert_eq!(p.alter_id, 0);
        assert_eq!(p.transport, Transport::Plain);
        assert!(p.tls.is_none());
        assert!(p.name.is_none());
    }

    #[test]
    fn string_port_and_aid_are_accepted() {
        let mut r = raw();
        r.port = NumOrString::Str("8443".into());
        r.aid = NumOrString::Str("64".into());
        let p = Profile::try_from(r).unwrap();
        assert_eq!(p.port, 8443);
        assert_eq!(p.alter_id, 64);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let mut r = raw();
        r.port = NumOrString::Num(70000);
        let err = Profile::try_from(r).unwrap_err();
        assert!(matches!(
            err,
            TunnelError::Construction { code: IssueCode::OutOfRange, ref ptr, .. } if ptr == "/port"
        ));

        let mut r = raw();
        r.port = NumOrString::Num(-1);
        assert!(Profile::try_from(r).is_err());

        let mut r = raw();
        r.port = NumOrString::Str("http".into());
        let err = Profile::try_from(r).unwrap_err();
        assert!(matches!(err, TunnelError::Construction { code: IssueCode::TypeMismatch, .. }));
    }

    #[test]
    fn empty_address_and_bad_id_are_rejected() {
        let mut r = raw();
        r.add = "  ".into();
        let err = Profile::try_from(r).unwrap_err();
        assert!(matches!(err, TunnelError::Construction { code: IssueCode::MissingRequired, .. }));

        let mut r = raw();
        r.id = "not-a-uuid".into();
        let err = Profile::try_from(r).unwrap_err();
        assert!(err.to_string().contains("/id"));
    }

    #[test]
    fn websocket_fields_are_folded() {
        let mut r = raw();
        r.net = "ws".into();
        r.path = "/ray".into();
        r.host = "example.com".into();
        r.tls = "tls".into();
        let p = Profile::try_from(r).unwrap();
        assert_eq!(
            p.transport,
            Transport::WebSocket {
                path: "/ray".into(),
                host: Some("example.com".into())
            }
        );
        assert_eq!(
            p.tls,
            Some(TlsOptions {
                server_name: Some("example.com".into())
            })
        );
    }

    #[test]
    fn quic_fields_are_folded() {
        let mut r = raw();
        r.net = "quic".into();
        r.path = "secret".into();
        r.header_type = "wechat-video".into();
        let p = Profile::try_from(r).unwrap();
        assert_eq!(
            p.transport,
            Transport::Quic {
                key: "secret".into(),
                security: None,
                header_type: Some("wechat-video".into())
            }
        );
    }

    #[test]
    fn unknown_transport_degrades_to_plain() {
        let mut r = raw();
        r.net = "kcp".into();
        r.path = "/ignored".into();
        let p = Profile::try_from(r).unwrap();
        assert_eq!(p.transport, Transport::Plain);
        assert_eq!(p.transport.kind(), "tcp");
    }

    #[test]
    fn from_json_accepts_share_shape() {
        let text = format!(
            concat!(
                r#"{{"v":"2","ps":"hk-01","add":"1.2.3.4","port":"10086","id":"{id}","#,
                r#""aid":"0","net":"ws","type":"none","host":"","path":"/","tls":""}}"#,
            ),
            id = ID
        );
        let p = Profile::from_json(&text).unwrap();
        assert_eq!(p.name.as_deref(), Some("hk-01"));
        assert_eq!(p.port, 10086);
        assert_eq!(
            p.transport,
            Transport::WebSocket {
                path: "/".into(),
                host: None
            }
        );
        assert!(p.tls.is_none());
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = Profile::from_json("[1,2,3]").unwrap_err();
        assert!(matches!(err, TunnelError::Construction { .. }));
    }
}

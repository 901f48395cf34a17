//! Fixed constants that form the external contract of the configuration layer.
//! 配置层对外约定的固定常量。

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Local port of the test SOCKS listener.
pub const TEST_PROXY_PORT: u16 = 8899;
/// Tag of the test SOCKS listener inside the tunnel core.
pub const INBOUND_TAG: &str = "socks-in";
/// Loopback address every local listener binds to.
pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Endpoint that always answers `204 No Content`.
pub const PROBE_URL: &str = "https://www.google.com/generate_204";
/// Per-request timeout for latency probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// Status both probes must return.
pub const PROBE_SUCCESS_STATUS: u16 = 204;

/// Streams multiplexed over one proxy connection.
pub const MUX_CONCURRENCY: u16 = 16;
/// Cipher selection for VMess users.
pub const VMESS_SECURITY: &str = "auto";
/// Placeholder user email expected by the VMess settings schema.
pub const VMESS_USER_EMAIL: &str = "v2ray@email.com";

// Outbound tags
pub const TAG_PROXY: &str = "proxy";
pub const TAG_DIRECT: &str = "direct";
pub const TAG_BLOCKED: &str = "blocked";

/// Regional public resolver, queried first.
pub const REGIONAL_DNS: IpAddr = IpAddr::V4(Ipv4Addr::new(223, 5, 5, 5));
/// Resolver served by the local DNS-capture component.
pub const LOCAL_DNS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DNS_PORT: u16 = 53;

/// IP categories that always route direct.
pub const DIRECT_IP_CATEGORIES: &[&str] = &["geoip:private", "geoip:cn"];
/// Domain categories that always route direct.
pub const DIRECT_DOMAIN_CATEGORIES: &[&str] = &["geosite:cn"];

/// Advertising and tracking domains that are never tunneled.
pub const BLOCK_DOMAINS: &[&str] = &[
    "domain:doubleclick.net",
    "domain:googlesyndication.com",
    "domain:googleadservices.com",
    "domain:google-analytics.com",
    "domain:adnxs.com",
    "domain:admob.com",
    "domain:appsflyer.com",
    "domain:umeng.com",
    "keyword:adservice",
];

/// Static host overrides sinking well-known ad hosts to loopback.
pub const BLOCK_HOSTS: &[(&str, &str)] = &[
    ("ad.doubleclick.net", "127.0.0.1"),
    ("pagead2.googlesyndication.com", "127.0.0.1"),
    ("adservice.google.com", "127.0.0.1"),
    ("ssl.google-analytics.com", "127.0.0.1"),
    ("alog.umeng.com", "127.0.0.1"),
];

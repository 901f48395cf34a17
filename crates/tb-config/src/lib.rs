//! Proxy configuration synthesis for tunbridge
//! tunbridge 的代理配置合成
//!
//! ## Workflow / 工作流
//! `Share link / JSON` -> [`RawProfile`] -> validate -> [`Profile`] ->
//! {outbound, direct, routing, DNS} builders -> [`ConfigBundle`] -> tunnel core
//!
//! Every builder is a pure data transformation: no I/O, no global state.
//! Failures surface as [`tb_types::TunnelError::Construction`] before anything
//! reaches the tunnel core.
//!
//! ## Key Modules / 关键模块
//! - [`profile`]: validated endpoint model and the closed [`Transport`] variant.
//! - [`outbound`]: `proxy` (VMess + mux + transport/TLS) and `direct` routes.
//! - [`route`] / [`dns`]: fixed routing policy and resolver list.
//! - [`inbound`]: the local SOCKS listener descriptor.
//! - [`defaults`]: constants forming the external contract.

pub mod bundle;
pub mod defaults;
pub mod dns;
pub mod inbound;
pub mod link;
pub mod outbound;
pub mod profile;
pub mod route;

pub use bundle::{build_proxy_configuration, ConfigBundle};
pub use dns::{build_dns_config, DnsConfig, NameServer};
pub use inbound::{build_socks_inbound, InboundSpec};
pub use link::parse_vmess_link;
pub use outbound::{build_direct_outbound, build_proxy_outbound, OutboundRoute};
pub use profile::{Profile, RawProfile, TlsOptions, Transport};
pub use route::{build_routing_config, DomainStrategy, RoutingConfig, RoutingRule};

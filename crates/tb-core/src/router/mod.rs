//! Routing rule evaluation.
//! 路由规则求值。
//!
//! The rules themselves are built by `tb_config::build_routing_config`; this
//! module compiles them into matchers and decides an outbound per destination.

pub mod geo;
pub mod rules;

pub use geo::GeoData;
pub use rules::{Decision, DomainMatcher, Engine, IpMatcher, RouteCtx};

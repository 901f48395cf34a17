use super::geo::{domain_or_subdomain, GeoData};
use ipnet::IpNet;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;
use tb_config::defaults::{TAG_BLOCKED, TAG_DIRECT, TAG_PROXY};
use tb_config::{DomainStrategy, RoutingConfig, RoutingRule};
use tb_types::{IssueCode, TunnelError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Decision {
    Direct,
    #[default]
    Proxy,
    Blocked,
    Outbound(String),
}

impl Decision {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            TAG_DIRECT => Decision::Direct,
            TAG_PROXY => Decision::Proxy,
            TAG_BLOCKED => Decision::Blocked,
            other => Decision::Outbound(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Decision::Direct => TAG_DIRECT,
            Decision::Proxy => TAG_PROXY,
            Decision::Blocked => TAG_BLOCKED,
            Decision::Outbound(tag) => tag.as_str(),
        }
    }
}

/// Wrapper for Regex that implements PartialEq/Eq based on the pattern string
#[derive(Debug, Clone)]
pub struct DomainRegexMatcher {
    regex: Regex,
}

impl PartialEq for DomainRegexMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for DomainRegexMatcher {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpMatcher {
    Private,      // geoip:private
    Geo(String),  // geoip:cn
    Cidr(IpNet),  // 10.0.0.0/8 or a bare address
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainMatcher {
    Geosite(String),             // geosite:cn
    Domain(String),              // domain:example.com (and subdomains)
    Full(String),                // full:example.com
    Keyword(String),             // keyword:tracker
    Regex(DomainRegexMatcher),   // regexp:^ads?\.
    Substring(String),           // example
}

#[derive(Debug, Clone)]
struct CompiledRule {
    decision: Decision,
    ip: Vec<IpMatcher>,
    domain: Vec<DomainMatcher>,
}

/// Destination being routed. Domains are compared case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteCtx<'a> {
    pub domain: Option<&'a str>,
    pub ip: Option<IpAddr>,
}

impl<'a> RouteCtx<'a> {
    pub fn domain(domain: &'a str) -> Self {
        Self {
            domain: Some(domain),
            ip: None,
        }
    }

    pub fn ip(ip: IpAddr) -> Self {
        Self {
            domain: None,
            ip: Some(ip),
        }
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }
}

/// First-match-wins evaluator over a [`RoutingConfig`].
#[derive(Debug, Clone)]
pub struct Engine {
    strategy: DomainStrategy,
    rules: Vec<CompiledRule>,
    geo: GeoData,
}

fn bad_matcher(ptr: String, msg: String) -> TunnelError {
    TunnelError::construction(IssueCode::InvalidMatcher, ptr, msg)
}

fn compile_ip(s: &str, ptr: String) -> Result<IpMatcher, TunnelError> {
    if let Some(code) = s.strip_prefix("geoip:") {
        let code = code.to_ascii_lowercase();
        return Ok(if code == "private" {
            IpMatcher::Private
        } else {
            IpMatcher::Geo(code)
        });
    }
    IpNet::from_str(s)
        .or_else(|_| IpAddr::from_str(s).map(IpNet::from))
        .map(IpMatcher::Cidr)
        .map_err(|_| bad_matcher(ptr, format!("invalid ip matcher '{s}'")))
}

fn compile_domain(s: &str, ptr: String) -> Result<DomainMatcher, TunnelError> {
    let lower = |v: &str| v.to_ascii_lowercase();
    Ok(match s.split_once(':') {
        Some(("geosite", v)) => DomainMatcher::Geosite(lower(v)),
        Some(("domain", v)) => DomainMatcher::Domain(lower(v)),
        Some(("full", v)) => DomainMatcher::Full(lower(v)),
        Some(("keyword", v)) => DomainMatcher::Keyword(lower(v)),
        Some(("regexp", v)) => DomainMatcher::Regex(DomainRegexMatcher {
            regex: Regex::new(v).map_err(|e| bad_matcher(ptr, e.to_string()))?,
        }),
        _ => DomainMatcher::Substring(lower(s)),
    })
}

impl Engine {
    /// Compile a routing config. Malformed matchers are construction errors.
    pub fn compile(config: &RoutingConfig, geo: GeoData) -> Result<Self, TunnelError> {
        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| Self::compile_rule(i, rule))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            strategy: config.domain_strategy,
            rules,
            geo,
        })
    }

    fn compile_rule(index: usize, rule: &RoutingRule) -> Result<CompiledRule, TunnelError> {
        let ip = rule
            .ip
            .iter()
            .enumerate()
            .map(|(j, s)| compile_ip(s, format!("/rules/{index}/ip/{j}")))
            .collect::<Result<Vec<_>, _>>()?;
        let domain = rule
            .domain
            .iter()
            .enumerate()
            .map(|(j, s)| compile_domain(s, format!("/rules/{index}/domain/{j}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledRule {
            decision: Decision::from_tag(&rule.outbound_tag),
            ip,
            domain,
        })
    }

    /// Check if an IP address is private (RFC 1918, RFC 4193, loopback, link-local)
    #[inline]
    fn is_private_ip(ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(ipv4) => {
                let octets = ipv4.octets();
                octets[0] == 10 // 10.0.0.0/8
                    || (octets[0] == 172 && (16..=31).contains(&octets[1])) // 172.16.0.0/12
                    || (octets[0] == 192 && octets[1] == 168) // 192.168.0.0/16
                    || (octets[0] == 100 && (64..=127).contains(&octets[1])) // 100.64.0.0/10
                    || octets[0] == 127
                    || (octets[0] == 169 && octets[1] == 254)
                    || octets[0] == 0
            }
            IpAddr::V6(ipv6) => {
                let segments = ipv6.segments();
                (segments[0] & 0xfe00) == 0xfc00 // fc00::/7
                    || (segments[0] & 0xffc0) == 0xfe80 // fe80::/10
                    || ipv6.is_loopback()
                    || ipv6.is_unspecified()
            }
        }
    }

    fn ip_hit(&self, m: &IpMatcher, ip: &IpAddr) -> bool {
        match m {
            IpMatcher::Private => Self::is_private_ip(ip),
            IpMatcher::Geo(code) => self.geo.ip_in(code, ip),
            IpMatcher::Cidr(net) => net.contains(ip),
        }
    }

    fn domain_hit(&self, m: &DomainMatcher, domain: &str) -> bool {
        match m {
            DomainMatcher::Geosite(code) => self.geo.site_in(code, domain),
            DomainMatcher::Domain(base) => domain_or_subdomain(domain, base),
            DomainMatcher::Full(full) => domain == full,
            DomainMatcher::Keyword(k) | DomainMatcher::Substring(k) => domain.contains(k.as_str()),
            DomainMatcher::Regex(r) => r.regex.is_match(domain),
        }
    }

    // Fields inside a rule are ANDed, entries inside a field are ORed.
    fn hit(&self, rule: &CompiledRule, domain: Option<&str>, ip: Option<IpAddr>) -> bool {
        if rule.ip.is_empty() && rule.domain.is_empty() {
            return false;
        }
        let ip_ok = rule.ip.is_empty()
            || ip.is_some_and(|ip| rule.ip.iter().any(|m| self.ip_hit(m, &ip)));
        let domain_ok = rule.domain.is_empty()
            || domain.is_some_and(|d| rule.domain.iter().any(|m| self.domain_hit(m, d)));
        ip_ok && domain_ok
    }

    fn first_match(&self, domain: Option<&str>, ip: Option<IpAddr>) -> Option<&Decision> {
        self.rules
            .iter()
            .find(|r| self.hit(r, domain, ip))
            .map(|r| &r.decision)
    }

    /// Route without name resolution.
    pub fn decide(&self, ctx: &RouteCtx<'_>) -> Decision {
        self.decide_with(ctx, |_| Vec::new())
    }

    /// Route, resolving the domain through `resolve` when the strategy asks
    /// for an IP re-check and nothing matched by name.
    pub fn decide_with<F>(&self, ctx: &RouteCtx<'_>, resolve: F) -> Decision
    where
        F: FnOnce(&str) -> Vec<IpAddr>,
    {
        let domain = ctx.domain.map(|d| d.trim_end_matches('.').to_ascii_lowercase());
        let domain = domain.as_deref();

        if let Some(decision) = self.first_match(domain, ctx.ip) {
            return decision.clone();
        }

        let recheck = matches!(
            self.strategy,
            DomainStrategy::IpIfNonMatch | DomainStrategy::IpOnDemand
        );
        if let (true, Some(name), None) = (recheck, domain, ctx.ip) {
            for ip in resolve(name) {
                if let Some(decision) = self.first_match(Some(name), Some(ip)) {
                    tracing::trace!(
                        domain = name,
                        %ip,
                        decision = decision.as_str(),
                        "matched after resolve"
                    );
                    return decision.clone();
                }
            }
        }

        Decision::Proxy
    }
}

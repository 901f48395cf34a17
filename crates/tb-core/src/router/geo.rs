//! GeoIP / geosite tables for category matchers.
//!
//! Text formats, one entry per line, `#` comments allowed:
//! - IP:   `CIDR,COUNTRY`   e.g. `1.0.1.0/24,CN`
//! - Site: `DOMAIN,COUNTRY` e.g. `baidu.com,CN`
//!
//! Site entries match the domain itself and all of its subdomains.

use ipnet::IpNet;
use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;
use tb_types::{IssueCode, TunnelError};

#[derive(Debug, Clone, Default)]
pub struct GeoData {
    ip: HashMap<String, Vec<IpNet>>,
    site: HashMap<String, Vec<String>>,
}

impl GeoData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(mut self, code: &str, nets: impl IntoIterator<Item = IpNet>) -> Self {
        self.ip
            .entry(code.to_ascii_lowercase())
            .or_default()
            .extend(nets);
        self
    }

    pub fn with_site<S: Into<String>>(
        mut self,
        code: &str,
        domains: impl IntoIterator<Item = S>,
    ) -> Self {
        self.site
            .entry(code.to_ascii_lowercase())
            .or_default()
            .extend(domains.into_iter().map(|d| d.into().to_ascii_lowercase()));
        self
    }

    /// Merge `CIDR,COUNTRY` lines.
    pub fn load_ip_text(mut self, text: &str) -> Result<Self, TunnelError> {
        for (lineno, line) in entries(text) {
            let (cidr, code) = split_entry(line, lineno, "geoip")?;
            let net = IpNet::from_str(cidr)
                .or_else(|_| IpAddr::from_str(cidr).map(IpNet::from))
                .map_err(|_| {
                    TunnelError::construction(
                        IssueCode::TypeMismatch,
                        format!("geoip:{lineno}"),
                        format!("invalid CIDR '{cidr}'"),
                    )
                })?;
            self = self.with_ip(code, [net]);
        }
        Ok(self)
    }

    /// Merge `DOMAIN,COUNTRY` lines.
    pub fn load_site_text(mut self, text: &str) -> Result<Self, TunnelError> {
        for (lineno, line) in entries(text) {
            let (domain, code) = split_entry(line, lineno, "geosite")?;
            self = self.with_site(code, [domain]);
        }
        Ok(self)
    }

    pub fn ip_in(&self, code: &str, ip: &IpAddr) -> bool {
        self.ip
            .get(code)
            .is_some_and(|nets| nets.iter().any(|n| n.contains(ip)))
    }

    pub fn site_in(&self, code: &str, domain: &str) -> bool {
        self.site
            .get(code)
            .is_some_and(|list| list.iter().any(|d| domain_or_subdomain(domain, d)))
    }
}

fn entries(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

fn split_entry<'a>(
    line: &'a str,
    lineno: usize,
    kind: &str,
) -> Result<(&'a str, &'a str), TunnelError> {
    match line.split_once(',') {
        Some((value, code)) if !value.trim().is_empty() && !code.trim().is_empty() => {
            Ok((value.trim(), code.trim()))
        }
        _ => Err(TunnelError::construction(
            IssueCode::TypeMismatch,
            format!("{kind}:{lineno}"),
            format!("expected 'VALUE,COUNTRY', got '{line}'"),
        )),
    }
}

/// `domain` equals `base` or is a subdomain of it. Both lowercase.
pub(crate) fn domain_or_subdomain(domain: &str, base: &str) -> bool {
    domain == base
        || (domain.len() > base.len()
            && domain.ends_with(base)
            && domain.as_bytes()[domain.len() - base.len() - 1] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_ip_and_site_tables() {
        let geo = GeoData::new()
            .load_ip_text("# comment\n1.0.1.0/24,CN\n\n240e::/20,cn\n8.8.8.8,US\n")
            .unwrap()
            .load_site_text("baidu.com,CN\nqq.com,cn\n")
            .unwrap();

        assert!(geo.ip_in("cn", &"1.0.1.77".parse().unwrap()));
        assert!(geo.ip_in("cn", &"240e:1::1".parse().unwrap()));
        assert!(geo.ip_in("us", &"8.8.8.8".parse().unwrap()));
        assert!(!geo.ip_in("cn", &"8.8.8.8".parse().unwrap()));
        assert!(!geo.ip_in("jp", &"1.0.1.77".parse().unwrap()));

        assert!(geo.site_in("cn", "baidu.com"));
        assert!(geo.site_in("cn", "map.baidu.com"));
        assert!(!geo.site_in("cn", "notbaidu.com"));
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = GeoData::new().load_ip_text("1.0.1.0/24\n").unwrap_err();
        assert!(err.to_string().contains("geoip:1"));

        let err = GeoData::new().load_ip_text("ok,CN\n").unwrap_err();
        assert!(err.to_string().contains("invalid CIDR"));
    }

    #[test]
    fn subdomain_boundary() {
        assert!(domain_or_subdomain("a.example.com", "example.com"));
        assert!(domain_or_subdomain("example.com", "example.com"));
        assert!(!domain_or_subdomain("badexample.com", "example.com"));
        assert!(!domain_or_subdomain("com", "example.com"));
    }
}

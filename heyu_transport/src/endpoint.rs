//! Hub endpoint parsing: `host[:port]`, with bracketed IPv6 literals.
//!
//! Grounded on `heyu.util.HUB_RE`/`parse_hub`: a hostname or bracketed IPv6
//! address, optionally followed by `:port`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TransportError;

/// Default HeyU hub port, matching `heyu.util.HEYU_PORT`.
pub const DEFAULT_PORT: u16 = 4859;

static HUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<hostname>[^:\s\[\]]+|\[[0-9a-fA-F:]+\])(?::(?P<port>\d+))?$")
        .expect("HUB_RE is a valid static pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    /// Parses a hub spec such as `"notify.example.com"`, `"10.0.0.1:5000"`,
    /// or `"[::1]:4859"`. A bare host defaults to [`DEFAULT_PORT`].
    pub fn parse(spec: &str) -> Result<Self, TransportError> {
        let captures = HUB_RE
            .captures(spec)
            .ok_or_else(|| TransportError::InvalidEndpoint(spec.to_string()))?;

        let hostname = captures
            .name("hostname")
            .ok_or_else(|| TransportError::InvalidEndpoint(spec.to_string()))?
            .as_str();
        let host = hostname
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(hostname)
            .to_string();

        let port = match captures.name("port") {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| TransportError::InvalidEndpoint(spec.to_string()))?,
            None => DEFAULT_PORT,
        };

        Ok(Endpoint { host, port })
    }

    pub fn to_socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_defaults_port() {
        let ep = Endpoint::parse("notify.example.com").unwrap();
        assert_eq!(ep.host, "notify.example.com");
        assert_eq!(ep.port, DEFAULT_PORT);
    }

    #[test]
    fn host_with_explicit_port() {
        let ep = Endpoint::parse("10.0.0.1:5000").unwrap();
        assert_eq!(ep.host, "10.0.0.1");
        assert_eq!(ep.port, 5000);
    }

    #[test]
    fn bracketed_ipv6_strips_brackets() {
        let ep = Endpoint::parse("[::1]:4859").unwrap();
        assert_eq!(ep.host, "::1");
        assert_eq!(ep.port, 4859);
    }

    #[test]
    fn bracketed_ipv6_without_port() {
        let ep = Endpoint::parse("[fe80::1]").unwrap();
        assert_eq!(ep.host, "fe80::1");
        assert_eq!(ep.port, DEFAULT_PORT);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Endpoint::parse("not a host").is_err());
    }
}

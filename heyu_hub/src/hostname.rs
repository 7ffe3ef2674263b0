//! Resolves the "origin host" a fanned-out `notify`'s `app_name` is
//! prefixed with.
//!
//! Grounded on `heyu.hub.HubApplication.__init__`'s hostname resolution:
//! the hub's own FQDN when the peer is loopback, else the reverse-resolved
//! name of the peer, falling back to the bare address on lookup failure.

use std::net::IpAddr;

/// Resolves the origin host for a peer at `peer_ip`.
pub fn resolve_origin_host(peer_ip: IpAddr) -> String {
    if peer_ip.is_loopback() {
        return dns_lookup::get_hostname().unwrap_or_else(|_| "localhost".to_string());
    }

    dns_lookup::lookup_addr(&peer_ip).unwrap_or_else(|_| peer_ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn loopback_resolves_to_some_hostname() {
        let host = resolve_origin_host(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!host.is_empty());
    }

    #[test]
    fn unresolvable_address_falls_back_to_literal() {
        // TEST-NET-1, guaranteed not to reverse-resolve in a test sandbox.
        let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 123));
        let host = resolve_origin_host(addr);
        assert!(!host.is_empty());
    }
}

//! Client IP extraction
//!
//! Resolves the client address behind proxies from X-Forwarded-For with
//! validation, so spoofed headers cannot inject arbitrary strings into
//! security logs.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Client address attached to authenticated requests. Holds "unknown" when no
/// trustworthy address could be derived.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the client IP from headers, falling back to the peer socket.
///
/// `trusted_proxies` is the number of proxy hops in front of the server; the
/// client address sits immediately before them in the X-Forwarded-For chain.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<&std::net::SocketAddr>,
    trusted_proxies: usize,
) -> ClientIp {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = forwarded_for_client(value, trusted_proxies) {
            return ClientIp(ip);
        }
    }

    // X-Real-IP carries a single address set by some proxies.
    if let Some(value) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        if let Ok(ip) = value.trim().parse::<IpAddr>() {
            return ClientIp(ip.to_string());
        }
    }

    match peer {
        Some(addr) => ClientIp(addr.ip().to_string()),
        None => ClientIp("unknown".to_string()),
    }
}

/// Pick the client hop out of an X-Forwarded-For chain (`client, proxy1, ...`).
///
/// With zero trusted proxies the whole header is client-controlled, so only
/// the nearest hop is considered. A chain shorter than the trusted count also
/// degrades to the nearest hop. Candidates must parse as an IP address.
fn forwarded_for_client(header_value: &str, trusted_proxies: usize) -> Option<String> {
    let hops: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let candidate = if trusted_proxies == 0 || hops.len() <= trusted_proxies {
        *hops.last()?
    } else {
        hops[hops.len() - trusted_proxies - 1]
    };

    candidate.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_forwarded_for_single_hop() {
        assert_eq!(
            forwarded_for_client("203.0.113.7", 0),
            Some("203.0.113.7".to_string())
        );
        assert_eq!(
            forwarded_for_client("203.0.113.7", 1),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_forwarded_for_behind_one_proxy() {
        assert_eq!(
            forwarded_for_client("203.0.113.7, 10.0.0.1", 1),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_forwarded_for_behind_two_proxies() {
        assert_eq!(
            forwarded_for_client("203.0.113.7, 10.0.0.1, 10.0.0.2", 2),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_forwarded_for_untrusted_uses_nearest_hop() {
        assert_eq!(
            forwarded_for_client("203.0.113.7, 10.0.0.1", 0),
            Some("10.0.0.1".to_string())
        );
    }

    #[test]
    fn test_forwarded_for_rejects_garbage() {
        assert_eq!(forwarded_for_client("not.an.ip.address", 0), None);
        assert_eq!(forwarded_for_client("", 0), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let headers = headers_with("x-forwarded-for", "203.0.113.7");
        assert_eq!(client_ip(&headers, None, 0).as_str(), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_real_ip_fallback() {
        let headers = headers_with("x-real-ip", "198.51.100.4");
        assert_eq!(client_ip(&headers, None, 1).as_str(), "198.51.100.4");
    }

    #[test]
    fn test_client_ip_socket_fallback() {
        let headers = HeaderMap::new();
        let peer = std::net::SocketAddr::from(([127, 0, 0, 1], 8080));
        assert_eq!(client_ip(&headers, Some(&peer), 1).as_str(), "127.0.0.1");
    }

    #[test]
    fn test_client_ip_unknown_without_sources() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, None, 1).as_str(), "unknown");
    }
}

//! URL admission policy for remote avatar fetches
//!
//! Validates attacker-supplied URLs before the server dereferences them:
//! - Restricts URL schemes to a configured set (https only by default)
//! - Rejects private/internal IP addresses and internal hostnames
//! - Restricts hostnames to an exact-match allowlist
//!
//! Validation is purely lexical. Hostnames are never resolved, so a DNS name
//! that resolves to a private address is not caught at this layer.

use std::net::{IpAddr, Ipv6Addr};

use url::{Host, Url};

use crate::error::AppError;

/// A URL that passed [`UrlPolicy::validate`]. Constructing one any other way
/// is not possible, so downstream fetch code can rely on the policy holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl std::fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a URL was refused admission
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlRejection {
    #[error("Invalid URL format: {0}")]
    Malformed(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("URL scheme '{0}' is not allowed")]
    SchemeNotAllowed(String),

    #[error("Private/internal hosts are not allowed")]
    PrivateHost,

    #[error("URL hostname '{0}' is not in the allowed list")]
    HostNotAllowed(String),
}

impl From<UrlRejection> for AppError {
    fn from(rejection: UrlRejection) -> Self {
        match rejection {
            UrlRejection::Malformed(_) | UrlRejection::MissingHost => {
                AppError::InvalidInput(rejection.to_string())
            }
            UrlRejection::SchemeNotAllowed(_)
            | UrlRejection::PrivateHost
            | UrlRejection::HostNotAllowed(_) => AppError::Forbidden(rejection.to_string()),
        }
    }
}

/// Admission policy for remote image URLs. Pure and synchronous; performs no
/// network access and never panics on malformed input.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    allowed_schemes: Vec<String>,
    host_allowlist: Vec<String>,
}

impl UrlPolicy {
    pub fn new(allowed_schemes: Vec<String>, host_allowlist: Vec<String>) -> Self {
        Self {
            allowed_schemes: allowed_schemes
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
            host_allowlist: host_allowlist
                .into_iter()
                .map(|h| h.to_lowercase())
                .collect(),
        }
    }

    pub fn from_avatar_config(avatar: &crate::config::AvatarConfig) -> Self {
        Self::new(
            avatar.allowed_schemes.clone(),
            avatar.host_allowlist.clone(),
        )
    }

    /// Validate a raw URL string.
    ///
    /// Checks run in order: parse, scheme, private-host denylist, hostname
    /// allowlist. The first failing check decides the rejection reason; a URL
    /// pointing at `10.0.0.1` reports [`UrlRejection::PrivateHost`] even
    /// though it would also fail the allowlist.
    pub fn validate(&self, raw: &str) -> Result<ValidatedUrl, UrlRejection> {
        let parsed =
            Url::parse(raw.trim()).map_err(|e| UrlRejection::Malformed(e.to_string()))?;

        let scheme = parsed.scheme();
        if !self.allowed_schemes.iter().any(|s| s.as_str() == scheme) {
            return Err(UrlRejection::SchemeNotAllowed(scheme.to_string()));
        }

        let host = match parsed.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.to_lowercase();
                if is_internal_hostname(&domain) {
                    return Err(UrlRejection::PrivateHost);
                }
                domain
            }
            Some(Host::Ipv4(ip)) => {
                if is_private_ip(&IpAddr::V4(ip)) {
                    return Err(UrlRejection::PrivateHost);
                }
                ip.to_string()
            }
            Some(Host::Ipv6(ip)) => {
                if is_private_ip(&IpAddr::V6(ip)) {
                    return Err(UrlRejection::PrivateHost);
                }
                ip.to_string()
            }
            None => return Err(UrlRejection::MissingHost),
        };

        // Exact hostname match only; subdomains of allowed hosts are not
        // admitted unless listed themselves.
        if !self.host_allowlist.iter().any(|allowed| *allowed == host) {
            return Err(UrlRejection::HostNotAllowed(host));
        }

        Ok(ValidatedUrl(parsed))
    }
}

/// Check if a hostname names localhost or a common internal zone
fn is_internal_hostname(host: &str) -> bool {
    host == "localhost"
        || host.ends_with(".local")
        || host.contains(".internal")
        || host.contains(".corp")
}

/// Check if an IP address is private/internal
///
/// Returns true for:
/// - IPv4 private ranges: 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
/// - IPv4 localhost: 127.0.0.0/8
/// - IPv4 link-local: 169.254.0.0/16
/// - IPv4 multicast: 224.0.0.0/4
/// - IPv4 reserved: 0.0.0.0/8
/// - IPv6 loopback: ::1
/// - IPv6 link-local: fe80::/10
/// - IPv6 unique local: fc00::/7
/// - IPv6 unspecified: ::
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            // Private IP ranges
            octets[0] == 10 // 10.0.0.0/8
                || (octets[0] == 172 && octets[1] >= 16 && octets[1] <= 31) // 172.16.0.0/12
                || (octets[0] == 192 && octets[1] == 168) // 192.168.0.0/16
                || octets[0] == 127 // 127.0.0.0/8 (localhost)
                || (octets[0] == 169 && octets[1] == 254) // 169.254.0.0/16 (link-local)
                || (octets[0] >= 224 && octets[0] <= 239) // 224.0.0.0/4 (multicast)
                || octets[0] == 0 // 0.0.0.0/8 (reserved)
        }
        IpAddr::V6(ipv6) => {
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

/// Check if IPv6 address is link-local (fe80::/10)
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    let segments = ip.segments();
    segments[0] & 0xffc0 == 0xfe80 // fe80::/10
}

/// Check if IPv6 address is unique local (fc00::/7)
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    let segments = ip.segments();
    segments[0] & 0xfe00 == 0xfc00 // fc00::/7
}

/// Derive the storage extension from a validated URL.
///
/// Takes the extension of the final path segment, lowercased, when it is in
/// `allowed`; anything else (missing, unknown, or non-image) maps to "jpg".
/// Query strings never contribute.
pub fn infer_extension(url: &ValidatedUrl, allowed: &[String]) -> String {
    const DEFAULT_EXTENSION: &str = "jpg";

    let candidate = url
        .as_url()
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|segment| {
            let (stem, ext) = segment.rsplit_once('.')?;
            // Dotfile-style segments like "/.svg" carry no extension
            if stem.is_empty() {
                None
            } else {
                Some(ext.to_lowercase())
            }
        });

    match candidate {
        Some(ext) if allowed.iter().any(|a| a.as_str() == ext) => ext,
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

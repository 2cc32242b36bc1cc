//! Per-request DNS overrides written as `host:port:address`.
//!
//! # Design
//! The notation is libcurl's `CURLOPT_RESOLVE` entry format, which callers of
//! this adapter already use. An entry pins one `host:port` pair to one or more
//! addresses for a single request; it never touches process-wide resolution.
//! A leading `+` is accepted and ignored. Removal entries (`-host:port`) make
//! no sense for a one-shot request and are rejected.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use reqwest::Url;

use crate::error::PostError;

/// A parsed `host:port:address[,address...]` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOverride {
    host: String,
    port: u16,
    addrs: Vec<IpAddr>,
}

impl ResolveOverride {
    /// Build an override directly. The host is stored lowercased since URL
    /// hosts are compared that way.
    pub fn new(host: &str, port: u16, addrs: Vec<IpAddr>) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
            port,
            addrs,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }

    /// The addresses paired with the overridden port, in the order given.
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.addrs
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .collect()
    }

    /// Whether this entry applies to `url`: same host and same effective port.
    pub fn matches(&self, url: &Url) -> bool {
        let host_matches = url
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.host));
        host_matches && url.port_or_known_default() == Some(self.port)
    }
}

impl FromStr for ResolveOverride {
    type Err = PostError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| PostError::InvalidResolve {
            entry: entry.to_string(),
            reason,
        };

        let trimmed = entry.trim();
        if trimmed.starts_with('-') {
            return Err(invalid("removal entries are not supported"));
        }
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let mut parts = trimmed.splitn(3, ':');
        let host = parts.next().unwrap_or_default();
        let port = parts.next().ok_or_else(|| invalid("missing port"))?;
        let addrs = parts.next().ok_or_else(|| invalid("missing address"))?;

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number in 0..=65535"))?;

        let addrs = addrs
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                let bare = addr
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .unwrap_or(addr);
                bare.parse::<IpAddr>()
                    .map_err(|_| invalid("address is not an IP literal"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if addrs.is_empty() {
            return Err(invalid("missing address"));
        }

        Ok(Self::new(host, port, addrs))
    }
}

impl fmt::Display for ResolveOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.host, self.port)?;
        for (i, addr) in self.addrs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match addr {
                IpAddr::V4(v4) => write!(f, "{v4}")?,
                IpAddr::V6(v6) => write!(f, "[{v6}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn parses_single_ipv4_entry() {
        let entry: ResolveOverride = "example.test:80:127.0.0.1".parse().unwrap();
        assert_eq!(entry.host(), "example.test");
        assert_eq!(entry.port(), 80);
        assert_eq!(entry.socket_addrs(), vec!["127.0.0.1:80".parse().unwrap()]);
    }

    #[test]
    fn unbracketed_ipv6_is_accepted() {
        let entry: ResolveOverride = "example.test:443:::1".parse().unwrap();
        assert_eq!(entry.addrs(), &["::1".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn matches_default_port_for_scheme() {
        let entry: ResolveOverride = "example.test:80:127.0.0.1".parse().unwrap();
        assert!(entry.matches(&url("http://example.test/echo")));
        assert!(entry.matches(&url("http://EXAMPLE.test:80/")));
        assert!(!entry.matches(&url("https://example.test/")));
        assert!(!entry.matches(&url("http://example.test:8080/")));
        assert!(!entry.matches(&url("http://other.test/")));
    }

    #[test]
    fn display_brackets_ipv6() {
        let entry: ResolveOverride = "a.test:8080:127.0.0.1,[::1]".parse().unwrap();
        assert_eq!(entry.to_string(), "a.test:8080:127.0.0.1,[::1]");
    }

    #[test]
    fn removal_entry_is_rejected() {
        let err = "-example.test:80".parse::<ResolveOverride>().unwrap_err();
        assert!(matches!(err, PostError::InvalidResolve { .. }));
    }
}

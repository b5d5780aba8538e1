//! Proxy records and the proxy-list parser

mod pool;

pub use pool::{ProbeOutcome, ProxyPool, ProxyValidator, ValidationReport};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;

static PROXY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})@([A-Za-z0-9_]+):([A-Za-z0-9_]+)$")
        .expect("proxy line pattern is valid")
});

/// Health of a record derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyHealth {
    Eligible,
    RateLimited,
    AuthFailed,
}

/// One credentialed HTTP proxy and its health flags.
/// Flags only ever go from `false` to `true` during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRecord {
    endpoint: String,
    host: Ipv4Addr,
    port: u16,
    rate_limited: bool,
    auth_failed: bool,
}

impl ProxyRecord {
    pub fn new(host: Ipv4Addr, port: u16, user: &str, pass: &str) -> Self {
        Self {
            endpoint: format!("http://{}:{}@{}:{}", user, pass, host, port),
            host,
            port,
            rate_limited: false,
            auth_failed: false,
        }
    }

    /// Parse a single `ip:port@user:pass` line
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = PROXY_LINE.captures(line.trim())?;
        let host: Ipv4Addr = caps[1].parse().ok()?;
        let port: u16 = caps[2].parse().ok().filter(|p| *p != 0)?;
        Some(Self::new(host, port, &caps[3], &caps[4]))
    }

    /// Full proxy URL including credentials. Never log this.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `ip:port` without credentials, safe for logs
    pub fn redacted(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }

    pub fn is_auth_failed(&self) -> bool {
        self.auth_failed
    }

    pub fn mark_rate_limited(&mut self) {
        self.rate_limited = true;
    }

    pub fn mark_auth_failed(&mut self) {
        self.auth_failed = true;
    }

    pub fn health(&self) -> ProxyHealth {
        if self.auth_failed {
            ProxyHealth::AuthFailed
        } else if self.rate_limited {
            ProxyHealth::RateLimited
        } else {
            ProxyHealth::Eligible
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.health() == ProxyHealth::Eligible
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

/// Parse a newline-delimited proxy list. Lines that don't match are skipped.
pub fn parse(source: &str) -> Vec<ProxyRecord> {
    source.lines().filter_map(ProxyRecord::parse_line).collect()
}

/// Read and parse a proxy list file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<ProxyRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read proxy list {}", path.display()))?;
    Ok(parse(&content))
}

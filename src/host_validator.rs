//! Decides whether a target host may be fetched.
//!
//! Every address a hostname resolves to is classified; a single reserved
//! address anywhere in the set blocks the request. Results are never cached:
//! each redirect hop is resolved and classified again.

use async_trait::async_trait;
use serde::Serialize;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::errors::InspectError;

/// IPv4 blocks that are never fetched: (network, prefix length, label)
const RESERVED_V4: &[(Ipv4Addr, u8, &str)] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8, "0.0.0.0/8"),
    (Ipv4Addr::new(10, 0, 0, 0), 8, "10.0.0.0/8"),
    (Ipv4Addr::new(100, 64, 0, 0), 10, "100.64.0.0/10"),
    (Ipv4Addr::new(127, 0, 0, 0), 8, "127.0.0.0/8"),
    (Ipv4Addr::new(169, 254, 0, 0), 16, "169.254.0.0/16"),
    (Ipv4Addr::new(172, 16, 0, 0), 12, "172.16.0.0/12"),
    (Ipv4Addr::new(192, 168, 0, 0), 16, "192.168.0.0/16"),
];

/// IPv6 blocks that are never fetched
const RESERVED_V6: &[(Ipv6Addr, u8, &str)] = &[
    (Ipv6Addr::UNSPECIFIED, 128, "::/128"),
    (Ipv6Addr::LOCALHOST, 128, "::1/128"),
    (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7, "fc00::/7"),
    (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10, "fe80::/10"),
];

/// Whether an address may be contacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "class", content = "range", rename_all = "lowercase")]
pub enum AddressClass {
    Public,
    /// Private or reserved; carries the matching block
    Reserved(&'static str),
}

impl AddressClass {
    pub fn is_public(&self) -> bool {
        matches!(self, AddressClass::Public)
    }
}

/// Classify one address. IPv4-mapped IPv6 addresses are judged as IPv4.
pub fn classify(ip: IpAddr) -> AddressClass {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => classify_v4(v4),
            None => classify_v6(v6),
        },
    }
}

fn classify_v4(ip: Ipv4Addr) -> AddressClass {
    let bits = u32::from(ip);
    RESERVED_V4
        .iter()
        .find(|(net, prefix, _)| {
            let mask = u32::MAX << (32 - u32::from(*prefix));
            bits & mask == u32::from(*net) & mask
        })
        .map(|(_, _, label)| AddressClass::Reserved(label))
        .unwrap_or(AddressClass::Public)
}

fn classify_v6(ip: Ipv6Addr) -> AddressClass {
    let bits = u128::from(ip);
    RESERVED_V6
        .iter()
        .find(|(net, prefix, _)| {
            let mask = u128::MAX << (128 - u32::from(*prefix));
            bits & mask == u128::from(*net) & mask
        })
        .map(|(_, _, label)| AddressClass::Reserved(label))
        .unwrap_or(AddressClass::Public)
}

/// Name resolution seam; production uses [`SystemResolver`]
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Every address `host` maps to, both families
    async fn lookup(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system via `tokio::net::lookup_host`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// One resolved address and its verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedAddr {
    pub addr: IpAddr,
    #[serde(flatten)]
    pub class: AddressClass,
}

/// All addresses a host mapped to at validation time
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAddressSet {
    pub host: String,
    pub addrs: Vec<ClassifiedAddr>,
}

impl ResolvedAddressSet {
    fn new(host: &str, ips: Vec<IpAddr>) -> Self {
        let mut addrs: Vec<ClassifiedAddr> = Vec::with_capacity(ips.len());
        for ip in ips {
            if addrs.iter().any(|a| a.addr == ip) {
                continue;
            }
            addrs.push(ClassifiedAddr {
                addr: ip,
                class: classify(ip),
            });
        }
        Self {
            host: host.to_string(),
            addrs,
        }
    }

    /// First reserved address, if any
    pub fn first_reserved(&self) -> Option<&ClassifiedAddr> {
        self.addrs.iter().find(|a| !a.class.is_public())
    }

    pub fn is_public(&self) -> bool {
        !self.addrs.is_empty() && self.first_reserved().is_none()
    }

    /// `SecurityBlocked` naming the first reserved address, if there is one
    pub fn blocked_error(&self) -> Option<InspectError> {
        let bad = self.first_reserved()?;
        let range = match bad.class {
            AddressClass::Reserved(range) => range,
            AddressClass::Public => "",
        };
        Some(InspectError::SecurityBlocked {
            host: self.host.clone(),
            addr: bad.addr,
            range,
        })
    }
}

/// Resolves and classifies target hosts
#[derive(Clone)]
pub struct HostValidator {
    resolver: Arc<dyn Resolver>,
}

impl Default for HostValidator {
    fn default() -> Self {
        Self::new(Arc::new(SystemResolver))
    }
}

impl HostValidator {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Resolve and classify without deciding; used for reporting
    pub async fn resolve(&self, host: &Host<&str>, port: u16) -> Result<ResolvedAddressSet, InspectError> {
        let (name, ips) = match host {
            Host::Ipv4(v4) => (v4.to_string(), vec![IpAddr::V4(*v4)]),
            Host::Ipv6(v6) => (v6.to_string(), vec![IpAddr::V6(*v6)]),
            Host::Domain(domain) => {
                let ips = self.resolver.lookup(domain, port).await.map_err(|e| {
                    InspectError::Network(format!("Failed to resolve {}: {}", domain, e))
                })?;
                (domain.to_string(), ips)
            }
        };

        if ips.is_empty() {
            return Err(InspectError::Network(format!(
                "No addresses found for {}",
                name
            )));
        }

        Ok(ResolvedAddressSet::new(&name, ips))
    }

    /// Pass only if every address of the URL's host is public
    pub async fn validate(&self, url: &Url) -> Result<ResolvedAddressSet, InspectError> {
        let host = url
            .host()
            .ok_or_else(|| InspectError::invalid("URL has no host"))?;
        let port = url.port_or_known_default().unwrap_or(80);

        let set = self.resolve(&host, port).await?;

        if let Some(err) = set.blocked_error() {
            log_blocked(&err);
            return Err(err);
        }

        debug!("Host {} resolved to {} public address(es)", set.host, set.addrs.len());
        Ok(set)
    }

    /// Resolver for the HTTP client, so the address connected to is classified too
    pub fn connect_guard(&self) -> ConnectGuard {
        ConnectGuard {
            resolver: self.resolver.clone(),
        }
    }
}

fn log_blocked(err: &InspectError) {
    if let InspectError::SecurityBlocked { host, addr, range } = err {
        warn!("Blocked target {}: {} is in reserved range {}", host, addr, range);
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connect-time DNS for `reqwest`.
///
/// Validation and connection each resolve the host, and the answers may
/// differ. Every connect-time answer is classified with the same rules; a
/// reserved address fails the connection with `SecurityBlocked`.
#[derive(Clone)]
pub struct ConnectGuard {
    resolver: Arc<dyn Resolver>,
}

impl Resolve for ConnectGuard {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(guarded_lookup(
            self.resolver.clone(),
            name.as_str().to_string(),
        ))
    }
}

async fn guarded_lookup(resolver: Arc<dyn Resolver>, host: String) -> Result<Addrs, BoxError> {
    let ips = resolver.lookup(&host, 0).await?;
    let set = ResolvedAddressSet::new(&host, ips);
    if let Some(err) = set.blocked_error() {
        log_blocked(&err);
        return Err(Box::new(err));
    }
    if set.addrs.is_empty() {
        return Err(format!("No addresses found for {}", host).into());
    }

    debug!("Connecting to {} via {} checked address(es)", host, set.addrs.len());
    let addrs: Vec<SocketAddr> = set
        .addrs
        .into_iter()
        .map(|a| SocketAddr::new(a.addr, 0))
        .collect();
    Ok(Box::new(addrs.into_iter()))
}

#[cfg(test)]
#[path = "host_validator_test.rs"]
mod host_validator_test;

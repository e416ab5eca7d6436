use anyhow::Result;
use serde::Serialize;
use std::net::IpAddr;
use tracing::info;
use url::Url;

use pagepick::host_validator::{AddressClass, ClassifiedAddr};
use pagepick::types::OutputFormat;
use pagepick::{HostValidator, InspectError, ResolvedAddressSet};

#[derive(Debug, Serialize)]
pub struct HostReport {
    pub host: String,
    pub allowed: bool,
    pub addrs: Vec<ClassifiedAddr>,
}

impl From<ResolvedAddressSet> for HostReport {
    fn from(set: ResolvedAddressSet) -> Self {
        Self {
            allowed: set.is_public(),
            host: set.host,
            addrs: set.addrs,
        }
    }
}

/// URL used to validate a bare host; IPv6 literals get brackets
pub fn probe_url(host: &str, port: u16) -> Result<Url, InspectError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(InspectError::InvalidInput("Missing host".to_string()));
    }
    let authority = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{}]:{}", v6, port),
        _ => format!("{}:{}", host, port),
    };
    Url::parse(&format!("http://{}/", authority))
        .map_err(|e| InspectError::InvalidInput(format!("Invalid host '{}': {}", host, e)))
}

pub async fn handle_check_host(host: String, port: u16, format: OutputFormat) -> Result<()> {
    info!("Checking host {}", host);
    let url = probe_url(&host, port)?;
    let parsed = url
        .host()
        .ok_or_else(|| InspectError::InvalidInput(format!("Invalid host '{}'", host)))?;

    let set = HostValidator::default().resolve(&parsed, port).await?;
    let blocked = set.first_reserved().cloned();
    let report = HostReport::from(set);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Simple => {
            println!(
                "{}: {}",
                report.host,
                if report.allowed { "allowed" } else { "BLOCKED" }
            );
            for entry in &report.addrs {
                match entry.class {
                    AddressClass::Public => println!("  {} public", entry.addr),
                    AddressClass::Reserved(range) => println!("  {} reserved ({})", entry.addr, range),
                }
            }
        }
    }

    if let Some(bad) = blocked
        && let AddressClass::Reserved(range) = bad.class
    {
        return Err(InspectError::SecurityBlocked {
            host: report.host,
            addr: bad.addr,
            range,
        }
        .into());
    }
    Ok(())
}

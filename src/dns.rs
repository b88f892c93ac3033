/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::IpAddr;

use trust_dns_resolver::TokioAsyncResolver;

use crate::error::{Error, Result};

/// Resolve a hostname (or parse a literal address) to a single IP, taking
/// the first answer when the name resolves to several.
pub async fn resolve(host_name: &str) -> Result<IpAddr> {
    if let Ok(addr) = host_name.parse::<IpAddr>() {
        return Ok(addr);
    }
    let response = TokioAsyncResolver::tokio_from_system_conf()
        .map_err(|e| Error::DnsIo(host_name.to_string(), e))?
        .lookup_ip(host_name)
        .await
        .map_err(|e| Error::Dns(host_name.to_string(), e))?;
    response
        .iter()
        .next()
        .ok_or_else(|| Error::DnsEmpty(host_name.to_string()))
}

// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Address of this member as seen by the coordinator.

use std::net::{IpAddr, Ipv4Addr};

use tracing::debug;

use crate::error::{Error, Result};

/// Resolve the host part of the local coordinator URL.
///
/// An explicit override wins: IPv4 literals are used as-is, anything else is
/// treated as IPv6 and bracketed. Without an override the first IPv4 address
/// of `interface` is used.
pub fn resolve_local_host(override_ip: Option<&str>, interface: &str) -> Result<String> {
    if let Some(ip) = override_ip.map(str::trim).filter(|ip| !ip.is_empty()) {
        return Ok(format_host(ip));
    }

    let addr = interface_ipv4(interface)?;
    debug!(interface, address = %addr, "Resolved local address from interface");
    Ok(addr.to_string())
}

/// Format an address for use as the host part of a URL.
pub fn format_host(ip: &str) -> String {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.to_string(),
        _ if ip.starts_with('[') => ip.to_string(),
        _ => format!("[{}]", ip),
    }
}

fn interface_ipv4(interface: &str) -> Result<Ipv4Addr> {
    let addrs = nix::ifaddrs::getifaddrs()
        .map_err(|e| Error::HostResolution(format!("cannot list interfaces: {}", e)))?;

    addrs
        .filter(|ifaddr| ifaddr.interface_name == interface)
        .find_map(|ifaddr| {
            ifaddr
                .address
                .as_ref()
                .and_then(|addr| addr.as_sockaddr_in())
                .map(|sin| Ipv4Addr::from(sin.ip()))
        })
        .ok_or_else(|| {
            Error::HostResolution(format!("no IPv4 address on interface {}", interface))
        })
}

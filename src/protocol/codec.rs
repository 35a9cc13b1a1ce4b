//! Address and port encoding shared by requests and replies.
//!
//! Ports are always two bytes, most significant first. Address fields take
//! one of three shapes selected by ATYP:
//!
//! ```text
//! IPv4:   4 bytes
//! IPv6:   16 bytes
//! Domain: 1 length byte + 1..=255 ASCII bytes, no terminating NUL
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{ProxyError, Result};
use crate::types::{AddressType, TargetAddr};

/// Longest domain name that fits the one-byte length prefix
pub const MAX_DOMAIN_LEN: usize = 255;

/// Classify a host string as an IPv4 literal, an IPv6 literal or a domain name.
pub fn classify(host: &str) -> AddressType {
    if host.parse::<Ipv4Addr>().is_ok() {
        AddressType::IPv4
    } else if host.parse::<Ipv6Addr>().is_ok() {
        AddressType::IPv6
    } else {
        AddressType::DomainName
    }
}

/// Encode `host` as the address field for `atyp`.
///
/// Fails with a config error, before any I/O, if the host does not parse as
/// the requested IP family or if a domain name is empty, non-ASCII or longer
/// than 255 bytes.
pub fn encode_address(atyp: AddressType, host: &str) -> Result<Vec<u8>> {
    match atyp {
        AddressType::IPv4 => {
            let ip: Ipv4Addr = host
                .parse()
                .map_err(|_| ProxyError::config(format!("Invalid IPv4 address: {}", host)))?;
            Ok(ip.octets().to_vec())
        }
        AddressType::IPv6 => {
            let ip: Ipv6Addr = host
                .parse()
                .map_err(|_| ProxyError::config(format!("Invalid IPv6 address: {}", host)))?;
            Ok(ip.octets().to_vec())
        }
        AddressType::DomainName => {
            if !host.is_ascii() {
                return Err(ProxyError::config(format!(
                    "Domain name must be ASCII: {}",
                    host
                )));
            }
            let name = host.as_bytes();
            if name.is_empty() || name.len() > MAX_DOMAIN_LEN {
                return Err(ProxyError::config(format!(
                    "Domain name length {} out of range 1..={}",
                    name.len(),
                    MAX_DOMAIN_LEN
                )));
            }
            let mut addr = Vec::with_capacity(1 + name.len());
            addr.push(name.len() as u8);
            addr.extend_from_slice(name);
            Ok(addr)
        }
    }
}

/// Classify and encode in one step.
pub fn encode_host(host: &str) -> Result<(AddressType, Vec<u8>)> {
    let atyp = classify(host);
    let addr = encode_address(atyp, host)?;
    Ok((atyp, addr))
}

pub fn encode_port(port: u16) -> [u8; 2] {
    port.to_be_bytes()
}

pub fn decode_port(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Check a port taken from configuration text. 0 and anything above 65535
/// are rejected.
pub fn validate_port(port: u32) -> Result<u16> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ProxyError::config(format!(
            "Invalid port {}: must be between 1 and 65535",
            port
        ))),
    }
}

/// Decode an address field of type `atyp` from the front of `data`.
///
/// Returns the address and the number of bytes it occupied.
pub fn decode_address(atyp: AddressType, data: &[u8]) -> Result<(TargetAddr, usize)> {
    match atyp {
        AddressType::IPv4 => {
            let octets: [u8; 4] = data
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| ProxyError::protocol("Truncated IPv4 address"))?;
            Ok((TargetAddr::Ipv4(Ipv4Addr::from(octets)), 4))
        }
        AddressType::IPv6 => {
            let octets: [u8; 16] = data
                .get(..16)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| ProxyError::protocol("Truncated IPv6 address"))?;
            Ok((TargetAddr::Ipv6(Ipv6Addr::from(octets)), 16))
        }
        AddressType::DomainName => {
            let len = *data
                .first()
                .ok_or_else(|| ProxyError::protocol("Missing domain length"))?
                as usize;
            let name = data
                .get(1..1 + len)
                .ok_or_else(|| ProxyError::protocol("Truncated domain name"))?;
            let name = String::from_utf8_lossy(name).into_owned();
            Ok((TargetAddr::Domain(name), 1 + len))
        }
    }
}

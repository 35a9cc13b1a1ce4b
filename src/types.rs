use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{ProxyError, Result};
use crate::protocol::codec::validate_port;

/// SOCKS protocol version byte
pub const SOCKS5_VERSION: u8 = 0x05;

/// RSV field value
pub const SOCKS5_RESERVED: u8 = 0x00;

/// Authentication method identifier (RFC 1928 section 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// X'00' NO AUTHENTICATION REQUIRED
    NoAuth,
    /// X'01' GSSAPI (declared, not implemented)
    Gssapi,
    /// X'02' USERNAME/PASSWORD
    UsernamePassword,
    /// X'FF' NO ACCEPTABLE METHODS
    NoAcceptable,
    /// X'03'..X'FE': IANA assigned or private
    Other(u8),
}

impl From<u8> for AuthMethod {
    fn from(value: u8) -> Self {
        match value {
            0x00 => AuthMethod::NoAuth,
            0x01 => AuthMethod::Gssapi,
            0x02 => AuthMethod::UsernamePassword,
            0xFF => AuthMethod::NoAcceptable,
            other => AuthMethod::Other(other),
        }
    }
}

impl From<AuthMethod> for u8 {
    fn from(method: AuthMethod) -> Self {
        match method {
            AuthMethod::NoAuth => 0x00,
            AuthMethod::Gssapi => 0x01,
            AuthMethod::UsernamePassword => 0x02,
            AuthMethod::NoAcceptable => 0xFF,
            AuthMethod::Other(value) => value,
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::NoAuth => f.write_str("no authentication required"),
            AuthMethod::Gssapi => f.write_str("GSSAPI"),
            AuthMethod::UsernamePassword => f.write_str("username/password"),
            AuthMethod::NoAcceptable => f.write_str("no acceptable methods"),
            AuthMethod::Other(value) => write!(f, "method 0x{:02x}", value),
        }
    }
}

/// Address type tag (ATYP)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    IPv4,
    DomainName,
    IPv6,
}

impl TryFrom<u8> for AddressType {
    type Error = ProxyError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(AddressType::IPv4),
            0x03 => Ok(AddressType::DomainName),
            0x04 => Ok(AddressType::IPv6),
            other => Err(ProxyError::protocol(format!(
                "Unknown address type: 0x{:02x}",
                other
            ))),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(atyp: AddressType) -> Self {
        match atyp {
            AddressType::IPv4 => 0x01,
            AddressType::DomainName => 0x03,
            AddressType::IPv6 => 0x04,
        }
    }
}

/// Request command (CMD). Only `Connect` is ever sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Bind,
    UdpAssociate,
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Connect => 0x01,
            Command::Bind => 0x02,
            Command::UdpAssociate => 0x03,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ProxyError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Command::Connect),
            0x02 => Ok(Command::Bind),
            0x03 => Ok(Command::UdpAssociate),
            other => Err(ProxyError::protocol(format!(
                "Unknown command: 0x{:02x}",
                other
            ))),
        }
    }
}

/// Reply field (REP) of a request reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyStatus {
    Succeeded,
    GeneralFailure,
    ConnectionNotAllowed,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    /// X'09'..X'FF'
    Unassigned(u8),
}

impl ReplyStatus {
    /// Human-readable reason, as listed in RFC 1928 section 6.
    pub fn message(&self) -> &'static str {
        match self {
            ReplyStatus::Succeeded => "succeeded",
            ReplyStatus::GeneralFailure => "general SOCKS server failure",
            ReplyStatus::ConnectionNotAllowed => "connection not allowed by ruleset",
            ReplyStatus::NetworkUnreachable => "Network unreachable",
            ReplyStatus::HostUnreachable => "Host unreachable",
            ReplyStatus::ConnectionRefused => "Connection refused",
            ReplyStatus::TtlExpired => "TTL expired",
            ReplyStatus::CommandNotSupported => "Command not supported",
            ReplyStatus::AddressTypeNotSupported => "Address type not supported",
            ReplyStatus::Unassigned(_) => "unassigned",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReplyStatus::Succeeded)
    }
}

impl From<u8> for ReplyStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ReplyStatus::Succeeded,
            0x01 => ReplyStatus::GeneralFailure,
            0x02 => ReplyStatus::ConnectionNotAllowed,
            0x03 => ReplyStatus::NetworkUnreachable,
            0x04 => ReplyStatus::HostUnreachable,
            0x05 => ReplyStatus::ConnectionRefused,
            0x06 => ReplyStatus::TtlExpired,
            0x07 => ReplyStatus::CommandNotSupported,
            0x08 => ReplyStatus::AddressTypeNotSupported,
            other => ReplyStatus::Unassigned(other),
        }
    }
}

impl From<ReplyStatus> for u8 {
    fn from(status: ReplyStatus) -> Self {
        match status {
            ReplyStatus::Succeeded => 0x00,
            ReplyStatus::GeneralFailure => 0x01,
            ReplyStatus::ConnectionNotAllowed => 0x02,
            ReplyStatus::NetworkUnreachable => 0x03,
            ReplyStatus::HostUnreachable => 0x04,
            ReplyStatus::ConnectionRefused => 0x05,
            ReplyStatus::TtlExpired => 0x06,
            ReplyStatus::CommandNotSupported => 0x07,
            ReplyStatus::AddressTypeNotSupported => 0x08,
            ReplyStatus::Unassigned(value) => value,
        }
    }
}

/// Decoded address field of a request or reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Domain(String),
}

impl TargetAddr {
    pub fn address_type(&self) -> AddressType {
        match self {
            TargetAddr::Ipv4(_) => AddressType::IPv4,
            TargetAddr::Ipv6(_) => AddressType::IPv6,
            TargetAddr::Domain(_) => AddressType::DomainName,
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ipv4(ip) => write!(f, "{}", ip),
            TargetAddr::Ipv6(ip) => write!(f, "{}", ip),
            TargetAddr::Domain(name) => f.write_str(name),
        }
    }
}

/// Host and port of a proxy server or a destination.
///
/// Construction validates the host is non-empty and the port is in
/// 1..=65535, so a held `Endpoint` never needs re-checking before I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

/// Address of the SOCKS5 server.
pub type ProxyEndpoint = Endpoint;

/// Address the proxy is asked to CONNECT to.
pub type DestinationEndpoint = Endpoint;

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(ProxyError::config("Host must not be empty"));
        }
        let port = validate_port(u32::from(port))?;
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ProxyError;

    /// Parses `host:port` or `[ipv6]:port`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let end = rest
                .find(']')
                .ok_or_else(|| ProxyError::config(format!("Unterminated IPv6 literal: {}", s)))?;
            let port = rest[end + 1..]
                .strip_prefix(':')
                .ok_or_else(|| ProxyError::config(format!("Missing port: {}", s)))?;
            (&rest[..end], port)
        } else {
            s.rsplit_once(':')
                .ok_or_else(|| ProxyError::config(format!("Missing port: {}", s)))?
        };

        let port: u32 = port
            .parse()
            .map_err(|_| ProxyError::config(format!("Invalid port: {}", port)))?;
        let port = validate_port(port)?;
        Endpoint::new(host, port)
    }
}

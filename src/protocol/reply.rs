//! Reply records.
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```
//!
//! Exactly the bytes ATYP implies are consumed, so anything the destination
//! sends right after the reply stays in the stream for the caller.

use std::io::Read;

use tracing::{debug, trace};

use super::codec::decode_port;
use crate::error::{ProxyError, Result};
use crate::types::{AddressType, ReplyStatus, TargetAddr, SOCKS5_VERSION};

/// Decoded reply record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub bound_addr: TargetAddr,
    pub bound_port: u16,
}

impl Reply {
    /// `BND.ADDR:BND.PORT` as text.
    pub fn bound_socket(&self) -> String {
        match self.bound_addr {
            TargetAddr::Ipv6(ip) => format!("[{}]:{}", ip, self.bound_port),
            ref other => format!("{}:{}", other, self.bound_port),
        }
    }
}

/// Read one reply record from `stream`.
///
/// A non-success REP is not an error here; the status is returned for the
/// caller to inspect. Errors are reserved for I/O failures and malformed
/// records (wrong version, unknown ATYP). When REP already reports a
/// failure and the bound address is missing or malformed, that failure is
/// returned as a protocol error carrying the status.
pub fn read_reply<S: Read>(stream: &mut S) -> Result<Reply> {
    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .map_err(|e| ProxyError::transport("Failed to read reply", e))?;
    trace!(bytes = ?header, "Reply header");

    if header[0] != SOCKS5_VERSION {
        return Err(ProxyError::protocol(format!(
            "Invalid SOCKS version in reply: {}",
            header[0]
        )));
    }

    let status = ReplyStatus::from(header[1]);
    let (bound_addr, bound_port) = match read_bound(stream, header[3]) {
        Ok(bound) => bound,
        // A refusal is still a refusal when the server hangs up early
        Err(e) if !status.is_success() => {
            debug!(status = status.message(), error = %e, "Failure reply with truncated tail");
            return Err(ProxyError::reply(status));
        }
        Err(e) => return Err(e),
    };

    let reply = Reply {
        status,
        bound_addr,
        bound_port,
    };
    debug!(status = status.message(), bound = %reply.bound_socket(), "Received reply");
    Ok(reply)
}

fn read_bound<S: Read>(stream: &mut S, atyp: u8) -> Result<(TargetAddr, u16)> {
    let bound_addr = match AddressType::try_from(atyp)? {
        AddressType::IPv4 => {
            let mut octets = [0u8; 4];
            read_field(stream, &mut octets, "IPv4 address")?;
            TargetAddr::Ipv4(octets.into())
        }
        AddressType::IPv6 => {
            let mut octets = [0u8; 16];
            read_field(stream, &mut octets, "IPv6 address")?;
            TargetAddr::Ipv6(octets.into())
        }
        AddressType::DomainName => {
            let mut len = [0u8; 1];
            read_field(stream, &mut len, "domain length")?;
            let mut name = vec![0u8; len[0] as usize];
            read_field(stream, &mut name, "domain")?;
            TargetAddr::Domain(String::from_utf8_lossy(&name).into_owned())
        }
    };

    let mut port = [0u8; 2];
    read_field(stream, &mut port, "port")?;
    Ok((bound_addr, decode_port(port)))
}

/// Read just the reply status.
pub fn parse_reply<S: Read>(stream: &mut S) -> Result<ReplyStatus> {
    read_reply(stream).map(|reply| reply.status)
}

fn read_field<S: Read>(stream: &mut S, buf: &mut [u8], what: &str) -> Result<()> {
    stream
        .read_exact(buf)
        .map_err(|e| ProxyError::transport(format!("Failed to read {}", what), e))
}

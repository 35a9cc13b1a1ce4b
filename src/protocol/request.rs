//! Request records.
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```

use std::io::Write;

use tracing::{debug, trace};

use super::codec::{decode_address, decode_port, encode_host, encode_port};
use crate::error::{ProxyError, Result};
use crate::types::{
    AddressType, Command, DestinationEndpoint, TargetAddr, SOCKS5_RESERVED, SOCKS5_VERSION,
};

/// Build the request record for `cmd` against `dest`.
pub fn build_request(cmd: Command, dest: &DestinationEndpoint) -> Result<Vec<u8>> {
    let (atyp, dst_addr) = encode_host(dest.host())?;
    let mut req = Vec::with_capacity(6 + dst_addr.len());
    req.extend_from_slice(&[SOCKS5_VERSION, u8::from(cmd), SOCKS5_RESERVED, u8::from(atyp)]);
    req.extend_from_slice(&dst_addr);
    req.extend_from_slice(&encode_port(dest.port()));
    Ok(req)
}

/// Build and write a request record.
pub fn send_request<S: Write>(
    stream: &mut S,
    cmd: Command,
    dest: &DestinationEndpoint,
) -> Result<()> {
    let req = build_request(cmd, dest)?;
    debug!(?cmd, destination = %dest, "Sending request");
    trace!(bytes = ?req, "Request record");

    stream
        .write_all(&req)
        .map_err(|e| ProxyError::transport("Failed to send request", e))?;
    stream
        .flush()
        .map_err(|e| ProxyError::transport("Failed to send request", e))
}

/// Decode a complete request record back into its command, address and port.
pub fn parse_request(data: &[u8]) -> Result<(Command, TargetAddr, u16)> {
    if data.len() < 4 {
        return Err(ProxyError::protocol("Truncated request header"));
    }
    if data[0] != SOCKS5_VERSION {
        return Err(ProxyError::protocol(format!(
            "Invalid SOCKS version in request: {}",
            data[0]
        )));
    }
    let cmd = Command::try_from(data[1])?;
    let atyp = AddressType::try_from(data[3])?;
    let (addr, used) = decode_address(atyp, &data[4..])?;

    let port_at = 4 + used;
    let port: [u8; 2] = data
        .get(port_at..port_at + 2)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| ProxyError::protocol("Truncated request port"))?;
    if data.len() != port_at + 2 {
        return Err(ProxyError::protocol("Trailing bytes after request"));
    }

    Ok((cmd, addr, decode_port(port)))
}

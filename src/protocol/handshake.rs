//! Method negotiation.
//!
//! The client always offers exactly one method, the one its configured
//! [`Authentication`](super::auth::Authentication) implements:
//!
//! ```text
//! client: +----+----------+----------+    server: +----+--------+
//!         |VER | NMETHODS | METHODS  |            |VER | METHOD |
//!         +----+----------+----------+            +----+--------+
//!         | 5  |    1     |    1     |            | 1  |   1    |
//!         +----+----------+----------+            +----+--------+
//! ```

use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::error::{ProxyError, Result};
use crate::types::{AuthMethod, SOCKS5_VERSION};

/// Build the version identifier/method selection message.
pub fn greeting(preferred: AuthMethod) -> [u8; 3] {
    [SOCKS5_VERSION, 1, u8::from(preferred)]
}

/// Offer `preferred` and return whatever method the server selected.
///
/// X'FF' comes back as [`AuthMethod::NoAcceptable`]; comparing the result
/// against the offer is the caller's job.
pub fn negotiate<S: Read + Write>(stream: &mut S, preferred: AuthMethod) -> Result<AuthMethod> {
    let req = greeting(preferred);
    debug!(method = %preferred, "Offering authentication method");
    trace!(bytes = ?req, "Method selection request");

    stream
        .write_all(&req)
        .map_err(|e| ProxyError::transport("Failed to send negotiation", e))?;
    stream
        .flush()
        .map_err(|e| ProxyError::transport("Failed to send negotiation", e))?;

    let mut resp = [0u8; 2];
    stream
        .read_exact(&mut resp)
        .map_err(|e| ProxyError::transport("Failed to read negotiation response", e))?;

    if resp[0] != SOCKS5_VERSION {
        return Err(ProxyError::protocol(format!(
            "Invalid SOCKS version: {}",
            resp[0]
        )));
    }

    let selected = AuthMethod::from(resp[1]);
    debug!(method = %selected, "Server selected authentication method");
    Ok(selected)
}

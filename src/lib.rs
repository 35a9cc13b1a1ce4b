//! SOCKS5 client handshake - RFC 1928 CONNECT with RFC 1929 username/password
//!
//! Given a blocking byte stream to a SOCKS5 proxy (or the proxy's address),
//! this library:
//! - Offers exactly one authentication method and checks the server's choice
//! - Runs the username/password sub-negotiation when configured
//! - Sends a CONNECT request for an IPv4, IPv6 or domain-name destination
//! - Decodes the reply and maps failure codes to typed errors
//!
//! After a successful `connect` the stream is a direct tunnel to the
//! destination.
//!
//! # Example
//!
//! ```no_run
//! use std::io::{Read, Write};
//! use socks5_connect::{Authentication, ProxyClient, ProxyError};
//!
//! let mut client = ProxyClient::new("127.0.0.1", 1080)
//!     .with_authentication(Authentication::username_password("user", "secret")?);
//!
//! let stream = client.connect("example.com", 80)?;
//! stream.write_all(b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n").ok();
//! let mut response = Vec::new();
//! stream.read_to_end(&mut response).ok();
//! # Ok::<(), ProxyError>(())
//! ```
//!
//! # Errors
//!
//! | Kind | Raised when | Retry? |
//! |------|-------------|--------|
//! | `Configuration` | bad host/port, oversized domain, client reused | no |
//! | `NegotiationMismatch` | server picked another method (or X'FF') | no |
//! | `AccessDenied` | credentials rejected | with new credentials |
//! | `Protocol` | REP != succeeded, malformed record | no |
//! | `Transport` | I/O error, timeout, short read | yes |

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod stream;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use client::{ClientState, ProxyClient};
pub use config::{parse_proxy_url, Socks5Options, DEFAULT_CONNECT_TIMEOUT, DEFAULT_SOCKS5_PORT};
pub use error::{ProxyError, ProxyErrorKind, Result};
pub use protocol::{Authentication, Credentials, Reply};
pub use stream::ProxyStream;
pub use transport::Socks5Transport;
pub use types::{
    AddressType, AuthMethod, Command, DestinationEndpoint, Endpoint, ProxyEndpoint, ReplyStatus,
    TargetAddr,
};

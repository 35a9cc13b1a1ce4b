//! SOCKS5 client protocol steps.
//!
//! - `codec`: address-type classification and address/port encoding
//! - `auth`: authentication methods and their sub-negotiations
//! - `handshake`: method negotiation
//! - `request`: request record encoding
//! - `reply`: reply record decoding

pub mod auth;
pub mod codec;
pub mod handshake;
pub mod reply;
pub mod request;

pub use auth::{Authentication, Credentials};
pub use codec::{classify, encode_address, encode_host, validate_port, MAX_DOMAIN_LEN};
pub use handshake::negotiate;
pub use reply::{parse_reply, read_reply, Reply};
pub use request::{build_request, parse_request, send_request};

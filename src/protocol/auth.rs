//! Authentication methods the client can offer.
//!
//! Each variant knows its method id and how to run its own sub-negotiation
//! once the server has selected it. Adding a method (GSSAPI, for one) means
//! adding a variant here; the handshake itself only ever sees `method()`.

use std::fmt;
use std::io::{Read, Write};

use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::types::AuthMethod;

/// Sub-negotiation version for username/password (RFC 1929)
pub const USERPASS_VERSION: u8 = 0x01;

/// STATUS value meaning the credentials were accepted
pub const USERPASS_SUCCESS: u8 = 0x00;

const MAX_FIELD_LEN: usize = 255;

/// Username and password for RFC 1929 authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Both fields must be 1 to 255 ASCII bytes.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        check_field("username", &username)?;
        check_field("password", &password)?;
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Build the sub-negotiation request.
    ///
    /// ```text
    /// +----+------+----------+------+----------+
    /// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    /// +----+------+----------+------+----------+
    /// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    /// +----+------+----------+------+----------+
    /// ```
    pub fn to_packet(&self) -> Vec<u8> {
        let user = self.username.as_bytes();
        let pass = self.password.as_bytes();
        let mut packet = Vec::with_capacity(3 + user.len() + pass.len());
        packet.push(USERPASS_VERSION);
        packet.push(user.len() as u8);
        packet.extend_from_slice(user);
        packet.push(pass.len() as u8);
        packet.extend_from_slice(pass);
        packet
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn check_field(name: &str, value: &str) -> Result<()> {
    if !value.is_ascii() {
        return Err(ProxyError::config(format!("{} must be ASCII", name)));
    }
    if value.is_empty() || value.len() > MAX_FIELD_LEN {
        return Err(ProxyError::config(format!(
            "{} length {} out of range 1..={}",
            name,
            value.len(),
            MAX_FIELD_LEN
        )));
    }
    Ok(())
}

/// Authentication method offered during negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Authentication {
    /// X'00': nothing is exchanged after method selection
    #[default]
    NoAuth,
    /// X'02': RFC 1929 sub-negotiation
    UsernamePassword(Credentials),
}

impl Authentication {
    pub fn username_password(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Authentication::UsernamePassword(Credentials::new(username, password)?))
    }

    /// Method id sent in the single-entry METHODS list.
    pub fn method(&self) -> AuthMethod {
        match self {
            Authentication::NoAuth => AuthMethod::NoAuth,
            Authentication::UsernamePassword(_) => AuthMethod::UsernamePassword,
        }
    }

    /// Run the method-specific sub-negotiation.
    ///
    /// Returns `Ok(false)` when the server rejected the credentials; I/O
    /// failures are errors. A rejection is final, nothing is retried.
    pub fn authenticate<S: Read + Write>(&self, stream: &mut S) -> Result<bool> {
        match self {
            Authentication::NoAuth => Ok(true),
            Authentication::UsernamePassword(creds) => {
                debug!(username = creds.username(), "Sending username/password");
                stream
                    .write_all(&creds.to_packet())
                    .map_err(|e| ProxyError::transport("Failed to send credentials", e))?;
                stream
                    .flush()
                    .map_err(|e| ProxyError::transport("Failed to send credentials", e))?;

                // +----+--------+
                // |VER | STATUS |
                // +----+--------+
                let mut resp = [0u8; 2];
                stream
                    .read_exact(&mut resp)
                    .map_err(|e| ProxyError::transport("Failed to read auth response", e))?;

                debug!(status = resp[1], "Username/password response");
                Ok(resp[1] == USERPASS_SUCCESS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ScriptedStream;

    #[test]
    fn test_credentials_packet() {
        let creds = Credentials::new("user", "secret").unwrap();
        assert_eq!(creds.to_packet(), b"\x01\x04user\x06secret".to_vec());
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("", "pw").is_err());
        assert!(Credentials::new("user", "").is_err());
        assert!(Credentials::new("u".repeat(256), "pw").is_err());
        assert!(Credentials::new("user", "p".repeat(256)).is_err());
        assert!(Credentials::new("usér", "pw").is_err());
        assert!(Credentials::new("u".repeat(255), "p".repeat(255)).is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_no_auth_is_silent() {
        let auth = Authentication::default();
        assert_eq!(auth.method(), AuthMethod::NoAuth);
        let mut stream = ScriptedStream::new(Vec::new());
        assert!(auth.authenticate(&mut stream).unwrap());
        assert!(stream.written().is_empty());
    }

    #[test]
    fn test_username_password_success() {
        let auth = Authentication::username_password("user", "pass").unwrap();
        assert_eq!(auth.method(), AuthMethod::UsernamePassword);
        let mut stream = ScriptedStream::new(vec![0x01, 0x00]);
        assert!(auth.authenticate(&mut stream).unwrap());
        assert_eq!(stream.written(), b"\x01\x04user\x04pass");
    }

    #[test]
    fn test_username_password_rejected() {
        let auth = Authentication::username_password("user", "wrong").unwrap();
        let mut stream = ScriptedStream::new(vec![0x01, 0x01]);
        assert!(!auth.authenticate(&mut stream).unwrap());
    }

    #[test]
    fn test_username_password_short_reply_is_transport_error() {
        let auth = Authentication::username_password("user", "pass").unwrap();
        let mut stream = ScriptedStream::new(vec![0x01]);
        let err = auth.authenticate(&mut stream).unwrap_err();
        assert!(err.is_retryable());
    }
}

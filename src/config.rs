//! Proxy configuration.

use std::time::Duration;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use url::Url;

use crate::error::{ProxyError, Result};
use crate::protocol::auth::Authentication;
use crate::protocol::codec::validate_port;
use crate::types::ProxyEndpoint;

/// Default SOCKS port
pub const DEFAULT_SOCKS5_PORT: u16 = 1080;

/// Default timeout for connecting to the proxy
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for creating a `ProxyClient`.
///
/// Deserializable so it can sit inside a larger config file:
///
/// ```json
/// { "host": "127.0.0.1", "port": 1080, "username": "u", "password": "p", "timeout_ms": 5000 }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Socks5Options {
    /// Proxy host name or IP address
    pub host: String,
    /// Proxy port. Wider than u16 so out-of-range values are reported rather
    /// than truncated.
    pub port: u32,
    /// Username for RFC 1929 authentication
    pub username: Option<String>,
    /// Password for RFC 1929 authentication
    pub password: Option<String>,
    /// I/O timeout in milliseconds, applied to connect, read and write
    pub timeout_ms: Option<u64>,
}

impl Socks5Options {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ProxyError::config(format!("Invalid proxy options: {}", e)))
    }

    /// Check the options and split them into endpoint and authentication.
    pub fn validate(&self) -> Result<(ProxyEndpoint, Authentication)> {
        if self.host.is_empty() {
            return Err(ProxyError::config("Proxy server address was not specified"));
        }
        let port = validate_port(self.port)?;
        check_timeout(self.timeout())?;
        let endpoint = ProxyEndpoint::new(self.host.clone(), port)?;

        let auth = match (&self.username, &self.password) {
            (Some(user), Some(pass)) => {
                Authentication::username_password(user.clone(), pass.clone())?
            }
            (None, None) => Authentication::NoAuth,
            _ => return Err(ProxyError::config("username and password must be given together")),
        };
        Ok((endpoint, auth))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Reject a zero timeout, which the socket layer refuses as an I/O error.
pub(crate) fn check_timeout(timeout: Option<Duration>) -> Result<()> {
    match timeout {
        Some(dur) if dur.is_zero() => Err(ProxyError::config(
            "Timeout must be greater than zero; use None to disable it",
        )),
        _ => Ok(()),
    }
}

/// Parse `socks5://[user:pass@]host[:port]`.
///
/// `socks5h` is accepted as a synonym; host names are always sent to the
/// proxy unresolved either way. Percent-encoded user info is decoded.
pub fn parse_proxy_url(text: &str) -> Result<(ProxyEndpoint, Authentication)> {
    let url = Url::parse(text.trim())
        .map_err(|e| ProxyError::config(format!("Invalid proxy URL: {}", e)))?;

    match url.scheme() {
        "socks5" | "socks5h" => {}
        other => {
            return Err(ProxyError::config(format!(
                "Unsupported scheme for SOCKS5 proxy: {}",
                other
            )))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| ProxyError::config("Proxy URL has no host"))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let endpoint = ProxyEndpoint::new(host, url.port().unwrap_or(DEFAULT_SOCKS5_PORT))?;

    let auth = if url.username().is_empty() {
        Authentication::NoAuth
    } else {
        let username = percent_decode(url.username())?;
        let password = percent_decode(url.password().unwrap_or_default())?;
        Authentication::username_password(username, password)?
    };
    Ok((endpoint, auth))
}

fn percent_decode(text: &str) -> Result<String> {
    percent_decode_str(text)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| ProxyError::config("Proxy URL user info is not UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyErrorKind;
    use crate::types::AuthMethod;

    #[test]
    fn test_options_from_json() {
        let opts = Socks5Options::from_json(
            r#"{"host": "10.0.0.1", "port": 1080, "username": "u", "password": "p",
                "timeout_ms": 2500}"#,
        )
        .unwrap();
        let (endpoint, auth) = opts.validate().unwrap();
        assert_eq!(endpoint.to_string(), "10.0.0.1:1080");
        assert_eq!(auth.method(), AuthMethod::UsernamePassword);
        assert_eq!(opts.timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_options_reject_bad_port() {
        for port in [0u32, 65536] {
            let opts = Socks5Options {
                host: "proxy".into(),
                port,
                ..Default::default()
            };
            assert!(matches!(opts.validate(), Err(ProxyError::ConfigError(_))));
        }
    }

    #[test]
    fn test_options_require_host() {
        let opts = Socks5Options {
            port: 1080,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_options_reject_zero_timeout() {
        let opts = Socks5Options::from_json(r#"{"host": "proxy", "port": 1080, "timeout_ms": 0}"#)
            .unwrap();
        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), ProxyErrorKind::Configuration);
        assert!(check_timeout(None).is_ok());
        assert!(check_timeout(Some(Duration::from_millis(1))).is_ok());
    }

    #[test]
    fn test_options_half_credentials() {
        let opts = Socks5Options {
            host: "proxy".into(),
            port: 1080,
            username: Some("u".into()),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_options_unknown_field() {
        assert!(Socks5Options::from_json(r#"{"host": "a", "port": 1, "proxy": 2}"#).is_err());
    }

    #[test]
    fn test_parse_proxy_url() {
        let (endpoint, auth) = parse_proxy_url("socks5://127.0.0.1:9050").unwrap();
        assert_eq!(endpoint.port(), 9050);
        assert_eq!(auth, Authentication::NoAuth);

        let (endpoint, auth) = parse_proxy_url("socks5h://proxy.example.com").unwrap();
        assert_eq!(endpoint.host(), "proxy.example.com");
        assert_eq!(endpoint.port(), DEFAULT_SOCKS5_PORT);
        assert_eq!(auth.method(), AuthMethod::NoAuth);
    }

    #[test]
    fn test_parse_proxy_url_with_auth() {
        let (_, auth) = parse_proxy_url("socks5://alice:p%40ss@[::1]:1080").unwrap();
        match auth {
            Authentication::UsernamePassword(creds) => {
                assert_eq!(creds.username(), "alice");
                assert_eq!(creds.password(), "p@ss");
            }
            _ => panic!("expected username/password"),
        }
    }

    #[test]
    fn test_parse_proxy_url_ipv6_host() {
        let (endpoint, _) = parse_proxy_url("socks5://[::1]:1080").unwrap();
        assert_eq!(endpoint.host(), "::1");
    }

    #[test]
    fn test_parse_proxy_url_rejects() {
        assert!(parse_proxy_url("http://proxy:8080").is_err());
        assert!(parse_proxy_url("socks5://proxy:65536").is_err());
        assert!(parse_proxy_url("socks5://proxy:0").is_err());
        assert!(parse_proxy_url("socks5://user@proxy:1080").is_err());
    }
}

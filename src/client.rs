//! SOCKS5 client.
//!
//! Drives one CONNECT negotiation over one stream: method negotiation,
//! authentication, request, reply. On success the stream is a plain tunnel
//! to the destination.

use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{check_timeout, parse_proxy_url, Socks5Options, DEFAULT_CONNECT_TIMEOUT};
use crate::error::{ProxyError, Result};
use crate::protocol::auth::Authentication;
use crate::protocol::codec::encode_host;
use crate::protocol::handshake::negotiate;
use crate::protocol::reply::read_reply;
use crate::protocol::request::send_request;
use crate::stream::ProxyStream;
use crate::types::{Command, DestinationEndpoint, ProxyEndpoint};

/// Where a client is in its single-use lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No negotiation attempted yet
    Idle,
    /// CONNECT succeeded; the stream is tunneled to the destination
    Ready,
    /// A negotiation step failed; the stream must be discarded
    Failed,
}

/// SOCKS5 CONNECT client.
///
/// Either dials the proxy itself (`new`, `from_url`, `with_options`) or
/// takes over a stream the caller already connected (`with_stream`). A
/// client negotiates once; connecting to another destination needs a new
/// client and a new stream.
pub struct ProxyClient<S = TcpStream> {
    proxy_host: String,
    proxy_port: u16,
    stream: Option<S>,
    auth: Authentication,
    timeout: Option<Duration>,
    state: ClientState,
}

impl ProxyClient<TcpStream> {
    /// Client that will open a TCP connection to `host:port` on `connect`.
    ///
    /// The proxy address is validated when `connect` runs, not here.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_proxy(host, port)
    }

    /// Create a client from `socks5://[user:pass@]host[:port]`.
    pub fn from_url(url: &str) -> Result<Self> {
        let (proxy, auth) = parse_proxy_url(url)?;
        Ok(Self::new(proxy.host(), proxy.port()).with_authentication(auth))
    }

    /// Create a client from deserialized options.
    pub fn with_options(opts: &Socks5Options) -> Result<Self> {
        let (proxy, auth) = opts.validate()?;
        let mut client = Self::new(proxy.host(), proxy.port()).with_authentication(auth);
        client.timeout = opts.timeout();
        Ok(client)
    }
}

impl<S: ProxyStream> ProxyClient<S> {
    /// Client that opens its stream through `S::open` on `connect`.
    pub fn with_proxy(host: impl Into<String>, port: u16) -> Self {
        Self {
            proxy_host: host.into(),
            proxy_port: port,
            stream: None,
            auth: Authentication::NoAuth,
            timeout: None,
            state: ClientState::Idle,
        }
    }

    /// Client over an existing connection to the proxy.
    pub fn with_stream(stream: S) -> Self {
        Self {
            proxy_host: String::new(),
            proxy_port: 0,
            stream: Some(stream),
            auth: Authentication::NoAuth,
            timeout: None,
            state: ClientState::Idle,
        }
    }

    /// Set the authentication method to offer.
    pub fn with_authentication(mut self, auth: Authentication) -> Self {
        self.auth = auth;
        self
    }

    /// Set the I/O timeout. It bounds the proxy connect and is applied as
    /// read and write timeout on the stream before negotiation starts.
    /// A zero duration is rejected by `connect` as a config error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn set_authentication(&mut self, auth: Authentication) {
        self.auth = auth;
    }

    /// Change the I/O timeout, applying it to the stream at once if one is
    /// already held.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        check_timeout(timeout)?;
        self.timeout = timeout;
        if let Some(stream) = self.stream.as_ref() {
            apply_timeout(stream, timeout)?;
        }
        Ok(())
    }

    pub fn authentication(&self) -> &Authentication {
        &self.auth
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ClientState::Ready
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn stream_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    /// Give up the stream, whatever state the client is in.
    pub fn into_stream(self) -> Option<S> {
        self.stream
    }

    /// Negotiate a CONNECT to `host:port` through the proxy.
    ///
    /// Argument and configuration problems are reported before any I/O. Any
    /// later failure leaves the client `Failed` with the stream still held;
    /// drop the client or call [`close`](Self::close) to release it.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<&mut S> {
        if host.is_empty() {
            return Err(ProxyError::config("Destination host must not be empty"));
        }
        if port == 0 {
            return Err(ProxyError::config("Destination port must be between 1 and 65535"));
        }
        if self.state != ClientState::Idle {
            return Err(ProxyError::config(format!(
                "Client already used ({:?}); create a new one per destination",
                self.state
            )));
        }
        check_timeout(self.timeout)?;
        let dest = DestinationEndpoint::new(host, port)?;
        // Oversized or non-ASCII domains fail here, before the proxy is dialed
        encode_host(dest.host())?;

        if self.stream.is_none() {
            let proxy = self.proxy_endpoint()?;
            let timeout = self.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
            debug!(proxy = %proxy, "Opening proxy connection");
            let stream = S::open(&proxy, timeout).map_err(|e| {
                self.state = ClientState::Failed;
                ProxyError::transport(format!("Failed to connect to proxy {}", proxy), e)
            })?;
            self.stream = Some(stream);
        }

        let auth = &self.auth;
        let timeout = self.timeout;
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(ProxyError::config("No proxy stream available")),
        };

        match run_connect(stream, auth, timeout, &dest) {
            Ok(()) => {
                self.state = ClientState::Ready;
                debug!(destination = %dest, "SOCKS5 tunnel established");
                Ok(stream)
            }
            Err(e) => {
                self.state = ClientState::Failed;
                warn!(destination = %dest, error = %e, "SOCKS5 connect failed");
                Err(e)
            }
        }
    }

    /// Shut down and release the stream.
    pub fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!("Closing proxy stream");
            stream
                .shutdown()
                .map_err(|e| ProxyError::transport("Failed to close proxy stream", e))?;
        }
        Ok(())
    }

    fn proxy_endpoint(&self) -> Result<ProxyEndpoint> {
        if self.proxy_host.is_empty() {
            return Err(ProxyError::config("Proxy server address was not specified"));
        }
        if self.proxy_port == 0 {
            return Err(ProxyError::config("Invalid proxy port: must be between 1 and 65535"));
        }
        ProxyEndpoint::new(self.proxy_host.clone(), self.proxy_port)
    }
}

fn apply_timeout<S: ProxyStream>(stream: &S, timeout: Option<Duration>) -> Result<()> {
    stream
        .set_read_timeout(timeout)
        .map_err(|e| ProxyError::transport("Failed to set read timeout", e))?;
    stream
        .set_write_timeout(timeout)
        .map_err(|e| ProxyError::transport("Failed to set write timeout", e))
}

fn run_connect<S: ProxyStream>(
    stream: &mut S,
    auth: &Authentication,
    timeout: Option<Duration>,
    dest: &DestinationEndpoint,
) -> Result<()> {
    if timeout.is_some() {
        apply_timeout(stream, timeout)?;
    }

    let offered = auth.method();
    let selected = negotiate(stream, offered)?;
    if selected != offered {
        return Err(ProxyError::NegotiationMismatch { offered, selected });
    }

    if !auth.authenticate(stream)? {
        return Err(ProxyError::AccessDenied);
    }

    send_request(stream, Command::Connect, dest)?;

    let reply = read_reply(stream)?;
    if !reply.status.is_success() {
        return Err(ProxyError::reply(reply.status));
    }
    Ok(())
}

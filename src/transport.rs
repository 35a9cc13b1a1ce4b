//! Duplex stream to a destination behind a SOCKS5 proxy.
//!
//! Wraps a [`ProxyClient`] and one destination so higher layers can treat
//! the tunnel as an ordinary `Read + Write` stream with `open`/`close`.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::client::ProxyClient;
use crate::error::Result;
use crate::protocol::auth::Authentication;
use crate::stream::ProxyStream;

/// Stream to `destination` through a SOCKS5 proxy.
///
/// Reads and writes fail with `NotConnected` until [`open`](Self::open) has
/// negotiated the tunnel, and again after [`close`](Self::close).
pub struct Socks5Transport<S = TcpStream> {
    client: ProxyClient<S>,
    dest_host: String,
    dest_port: u16,
}

impl Socks5Transport<TcpStream> {
    /// Transport that dials `proxy_host:proxy_port` itself on `open`.
    pub fn new(
        dest_host: impl Into<String>,
        dest_port: u16,
        proxy_host: impl Into<String>,
        proxy_port: u16,
    ) -> Self {
        Self {
            client: ProxyClient::new(proxy_host, proxy_port),
            dest_host: dest_host.into(),
            dest_port,
        }
    }
}

impl<S: ProxyStream> Socks5Transport<S> {
    /// Transport over an existing connection to the proxy.
    pub fn with_stream(stream: S, dest_host: impl Into<String>, dest_port: u16) -> Self {
        Self {
            client: ProxyClient::with_stream(stream),
            dest_host: dest_host.into(),
            dest_port,
        }
    }

    pub fn with_authentication(mut self, auth: Authentication) -> Self {
        self.client.set_authentication(auth);
        self
    }

    pub fn set_authentication(&mut self, auth: Authentication) {
        self.client.set_authentication(auth);
    }

    /// Read/write timeout for the proxy stream, applied before negotiation.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.client.set_timeout(timeout)
    }

    pub fn destination(&self) -> (&str, u16) {
        (&self.dest_host, self.dest_port)
    }

    pub fn is_open(&self) -> bool {
        self.client.is_ready() && self.client.stream().is_some()
    }

    /// Run the full SOCKS5 negotiation for the destination.
    ///
    /// [`ProxyError::AccessDenied`](crate::ProxyError::AccessDenied) is
    /// passed through untouched so callers can ask for new credentials.
    pub fn open(&mut self) -> Result<()> {
        self.client.connect(&self.dest_host, self.dest_port)?;
        Ok(())
    }

    /// Release the proxy stream.
    pub fn close(&mut self) -> Result<()> {
        self.client.close()
    }

    fn stream_mut(&mut self) -> io::Result<&mut S> {
        if !self.client.is_ready() {
            return Err(not_connected());
        }
        self.client.stream_mut().ok_or_else(not_connected)
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "SOCKS5 transport is not open")
}

impl<S: ProxyStream> Read for Socks5Transport<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl<S: ProxyStream> Write for Socks5Transport<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream_mut()?.flush()
    }
}

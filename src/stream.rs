//! Byte stream to the proxy server.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
#[cfg(test)]
use std::{cell::Cell, rc::Rc};

use tracing::debug;

use crate::types::ProxyEndpoint;

/// Blocking duplex stream the handshake runs over.
///
/// `ProxyClient` either opens one itself through [`ProxyStream::open`] or
/// drives one the caller already connected.
pub trait ProxyStream: Read + Write + Sized {
    /// Open a new connection to the proxy server.
    fn open(proxy: &ProxyEndpoint, timeout: Duration) -> io::Result<Self>;

    /// Set read timeout
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()>;

    /// Set write timeout
    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()>;

    /// Shut down both directions of the stream
    fn shutdown(&self) -> io::Result<()>;
}

impl ProxyStream for TcpStream {
    fn open(proxy: &ProxyEndpoint, timeout: Duration) -> io::Result<Self> {
        let addrs: Vec<SocketAddr> = (proxy.host(), proxy.port()).to_socket_addrs()?.collect();

        let mut last_err = None;
        for addr in addrs {
            debug!(%addr, "Connecting to proxy");
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}", proxy),
            )
        }))
    }

    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }

    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, dur)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// In-memory stream replaying canned server bytes and recording writes.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ScriptedStream {
    input: io::Cursor<Vec<u8>>,
    written: Vec<u8>,
    read_timeout: Cell<Option<Duration>>,
    shut_down: Rc<Cell<bool>>,
}

#[cfg(test)]
impl ScriptedStream {
    pub(crate) fn new(input: Vec<u8>) -> Self {
        Self {
            input: io::Cursor::new(input),
            written: Vec::new(),
            read_timeout: Cell::new(None),
            shut_down: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.written
    }

    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout.get()
    }

    /// Flag set by `shutdown`, still readable after the stream is dropped.
    pub(crate) fn shutdown_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.shut_down)
    }

    /// Bytes the peer sent that nobody has read yet.
    pub(crate) fn unread(&self) -> &[u8] {
        let pos = self.input.position() as usize;
        &self.input.get_ref()[pos..]
    }
}

#[cfg(test)]
impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

#[cfg(test)]
impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl ProxyStream for ScriptedStream {
    fn open(_proxy: &ProxyEndpoint, _timeout: Duration) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "scripted streams cannot be dialed",
        ))
    }

    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        self.read_timeout.set(dur);
        Ok(())
    }

    fn set_write_timeout(&self, _dur: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> io::Result<()> {
        self.shut_down.set(true);
        Ok(())
    }
}

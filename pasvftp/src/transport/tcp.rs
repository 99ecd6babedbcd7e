//! # Tcp
//!
//! [`Transport`] over a plain [`TcpStream`]

use std::io::{ErrorKind, Read, Result, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use super::Transport;

/// Plain tcp transport.
///
/// The stream is blocking; [`Transport::available`] peeks in non-blocking mode.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
    eof: bool,
}

impl TcpTransport {
    /// Create an unconnected transport; each connect attempt gives up after `connect_timeout`
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            stream: None,
            connect_timeout,
            read_timeout: None,
            eof: false,
        }
    }

    /// Set the read timeout applied to every stream this transport opens
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Returns a reference to the underlying [`TcpStream`], if connected.
    pub fn get_ref(&self) -> Option<&TcpStream> {
        self.stream.as_ref()
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| std::io::Error::from(ErrorKind::NotConnected))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<()> {
        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        self.eof = false;
        Ok(())
    }

    fn available(&mut self) -> usize {
        if self.eof {
            return 0;
        }
        let Some(stream) = self.stream.as_ref() else {
            return 0;
        };
        if let Err(err) = stream.set_nonblocking(true) {
            trace!("cannot switch stream to non-blocking: {err}");
            return 0;
        }
        let mut buf = [0u8; 1024];
        let peeked = stream.peek(&mut buf);
        if let Err(err) = stream.set_nonblocking(false) {
            trace!("cannot switch stream back to blocking: {err}");
        }
        match peeked {
            Ok(0) => {
                trace!("peer closed the stream");
                self.eof = true;
                0
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::WouldBlock => 0,
            Err(err) => {
                debug!("stream failed: {err}");
                self.eof = true;
                0
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some() && !self.eof
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                trace!("shutdown failed: {err}");
            }
        }
        self.eof = false;
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.stream_mut()?.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(n)
    }
}

impl Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.stream_mut()?.flush()
    }
}

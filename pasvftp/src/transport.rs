//! # Transport
//!
//! The byte-stream capability the protocol engine is written against.
//! Any reliable duplex stream (a tcp socket, a tls wrapper, a modem link...)
//! can drive a session, as long as it implements [`Transport`].

mod tcp;

use std::io::{Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

pub use tcp::TcpTransport;

use crate::types::TransportError;

/// A function that creates a new, unconnected transport.
///
/// Each session asks for two of them: one for the control channel and one for the data channel.
pub type TransportBuilder<T> = dyn Fn() -> T + Send + Sync;

/// A reliable duplex byte stream.
///
/// `is_connected` must keep returning `true` while unread bytes remain, even if the peer
/// has already hung up: the data channel relies on this to deliver the tail of a transfer
/// before reporting end of stream.
pub trait Transport: Read + Write {
    /// Open the stream towards `addr`
    fn connect(&mut self, addr: SocketAddr) -> std::io::Result<()>;

    /// Amount of bytes which can be read right now without blocking
    fn available(&mut self) -> usize;

    /// Whether the stream is open or still holds unread bytes
    fn is_connected(&self) -> bool;

    /// Close the stream. Closing a closed stream does nothing
    fn close(&mut self);

    /// Address of the remote peer, if connected
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Connect `transport` to `addr`, trying up to `attempts` times and sleeping `backoff` in between.
///
/// A connect counts as successful only if the transport reports itself connected afterwards.
pub fn connect_with_retry<T: Transport + ?Sized>(
    transport: &mut T,
    addr: SocketAddr,
    attempts: usize,
    backoff: Duration,
) -> Result<(), TransportError> {
    debug!("Connecting to {addr}");
    // start from a clean state
    transport.close();
    for attempt in 1..=attempts {
        match transport.connect(addr) {
            Ok(()) if transport.is_connected() => {
                debug!("Connected to {addr} (attempt {attempt}/{attempts})");
                return Ok(());
            }
            Ok(()) => warn!("Connect to {addr} returned, but the transport is not connected"),
            Err(err) => debug!("Connect attempt {attempt}/{attempts} to {addr} failed: {err}"),
        }
        if attempt < attempts {
            std::thread::sleep(backoff);
        }
    }
    error!("{addr} is unreachable after {attempts} attempts");
    Err(TransportError::Unreachable { addr, attempts })
}

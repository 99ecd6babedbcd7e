//! # Data channel
//!
//! This module exposes the data stream where bytes must be written to/read from

use std::io::{BufRead, BufReader, Read, Result, Write};
use std::net::SocketAddr;
use std::time::Duration;

use crate::transport::{connect_with_retry, Transport};
use crate::types::FtpResult;

/// The per-operation data connection of a session.
///
/// It is only ever opened through passive mode negotiation and closed once the operation ends.
#[derive(Debug)]
pub struct DataChannel<T>
where
    T: Transport,
{
    reader: BufReader<T>,
}

impl<T> DataChannel<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        Self {
            reader: BufReader::new(transport),
        }
    }

    /// Connect to the address announced by the server. No reply is expected on a data connection
    pub fn connect(&mut self, addr: SocketAddr, attempts: usize, backoff: Duration) -> FtpResult<()> {
        self.discard_buffer();
        connect_with_retry(self.reader.get_mut(), addr, attempts, backoff)?;
        Ok(())
    }

    /// Whether the connection is open or buffered bytes remain
    pub fn is_connected(&self) -> bool {
        !self.reader.buffer().is_empty() || self.reader.get_ref().is_connected()
    }

    /// Amount of bytes readable without blocking
    pub fn available(&mut self) -> usize {
        self.reader.buffer().len() + self.reader.get_mut().available()
    }

    /// Read a line; the terminator (`eol`, and a trailing `\r` before it) is stripped.
    /// An empty string means either an empty line or the end of the stream.
    pub fn read_line_until(&mut self, eol: u8) -> Result<String> {
        let mut line = Vec::new();
        self.reader.read_until(eol, &mut line)?;
        if line.last() == Some(&eol) {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let line = String::from_utf8_lossy(&line).to_string();
        trace!("STREAM IN: {line:?}");
        Ok(line)
    }

    pub fn read_line(&mut self) -> Result<String> {
        self.read_line_until(b'\n')
    }

    /// Next byte, without consuming it
    pub fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    pub fn close(&mut self) {
        self.discard_buffer();
        self.reader.get_mut().close();
    }

    fn discard_buffer(&mut self) {
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
    }
}

impl<T> Read for DataChannel<T>
where
    T: Transport,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reader.read(buf)
    }
}

impl<T> Write for DataChannel<T>
where
    T: Transport,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.reader.get_mut().write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.reader.get_mut().flush()
    }
}

//! # Control channel
//!
//! Command/reply exchange over the long-lived control connection

use std::io::{BufRead, BufReader, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::command::Command;
use crate::reply::{closes_multiline, is_continuation, matches_any, parse_reply, Reply};
use crate::transport::{connect_with_retry, Transport};
use crate::types::{FtpError, FtpResult, ProtocolError, TransportError};
use crate::Status;

/// Codes accepted when quitting
const QUIT_CODES: &[Status] = &[Status::Closing, Status::ClosingDataConnection];

/// The control connection of a session.
///
/// Commands and replies strictly alternate: before a command is written, any unsolicited
/// backlog is discarded, so a reply read afterwards always belongs to that command.
#[derive(Debug)]
pub struct ControlChannel<T>
where
    T: Transport,
{
    reader: BufReader<T>,
    poll_interval: Duration,
    reply_timeout: Option<Duration>,
    welcome_msg: Option<String>,
    last_reply: Option<Reply>,
}

impl<T> ControlChannel<T>
where
    T: Transport,
{
    pub fn new(transport: T, poll_interval: Duration, reply_timeout: Option<Duration>) -> Self {
        Self {
            reader: BufReader::new(transport),
            poll_interval,
            reply_timeout,
            welcome_msg: None,
            last_reply: None,
        }
    }

    /// Connect to the server and read its greeting.
    ///
    /// Any extra banner lines the server sends after the greeting are thrown away.
    pub fn connect_with_retry(
        &mut self,
        addr: SocketAddr,
        attempts: usize,
        backoff: Duration,
    ) -> FtpResult<()> {
        self.discard_buffer();
        connect_with_retry(self.reader.get_mut(), addr, attempts, backoff)?;
        debug!("Reading server greeting...");
        let greeting = self.await_reply(&[Status::Ready, Status::CommandOk], true)?;
        debug!("Server READY; greeting: {}", greeting.text);
        self.welcome_msg = Some(greeting.text);
        self.drain();
        Ok(())
    }

    /// Log in to the FTP server.
    ///
    /// `530` to `USER` is a valid reply on the wire, but it ends the login right there.
    pub fn login(&mut self, user: &str, password: Option<&str>) -> FtpResult<()> {
        debug!("Signing in with user '{user}'");
        let reply = self.send_command(
            &Command::User(user.to_string()),
            &[Status::NeedPassword, Status::LoggedIn, Status::NotLoggedIn],
        )?;
        if reply.status() == Status::NotLoggedIn {
            error!("Login refused for user '{user}': {reply}");
            return Err(ProtocolError::UnexpectedReply {
                got: reply,
                expected: vec![Status::NeedPassword, Status::LoggedIn],
            }
            .into());
        }
        if let Some(password) = password {
            debug!("Sending password");
            self.send_command(
                &Command::Pass(password.to_string()),
                &[Status::LoggedIn, Status::CommandNotImplemented],
            )?;
        }
        // some servers (e.g. FileZilla) keep talking after login
        self.drain();
        debug!("Login OK");
        Ok(())
    }

    /// Say goodbye, trying `QUIT`, then `BYE`, then `DISCONNECT`
    pub fn quit(&mut self) -> FtpResult<()> {
        debug!("Quitting");
        let mut last_err = None;
        for cmd in [Command::Quit, Command::Bye, Command::Disconnect] {
            match self.command(&cmd, QUIT_CODES, false) {
                Ok(_) => return Ok(()),
                Err(err) => {
                    debug!("{cmd} refused: {err}");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(FtpError::Transport(TransportError::Closed)))
    }

    /// Write `cmd` and wait for its reply, which must be one of `expected`
    pub fn send_command(&mut self, cmd: &Command, expected: &[Status]) -> FtpResult<Reply> {
        self.command(cmd, expected, true)
    }

    /// Write `cmd` and read its reply; see [`Self::await_reply`] for `must_wait`
    pub fn command(
        &mut self,
        cmd: &Command,
        expected: &[Status],
        must_wait: bool,
    ) -> FtpResult<Reply> {
        self.perform(cmd)?;
        self.await_reply(expected, must_wait)
    }

    /// Write command to the stream
    pub fn perform(&mut self, cmd: &Command) -> FtpResult<()> {
        if self.drain() > 0 {
            warn!("Discarded unsolicited data before {}", cmd.redacted());
        }
        trace!("CC OUT: {}", cmd.redacted());
        let stream = self.reader.get_mut();
        stream.write_all(cmd.to_line().as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    /// Read the next reply and check it against `expected` (empty means anything goes).
    ///
    /// If `must_wait` is false and nothing is pending, an empty reply is returned at once.
    pub fn await_reply(&mut self, expected: &[Status], must_wait: bool) -> FtpResult<Reply> {
        if !must_wait && self.available() == 0 {
            trace!("No reply pending; not waiting");
            return Ok(Reply::empty());
        }
        self.await_reply_within(expected, self.reply_timeout)
    }

    /// Like [`Self::await_reply`], blocking at most `timeout` (`None` blocks until a reply arrives)
    pub fn await_reply_within(
        &mut self,
        expected: &[Status],
        timeout: Option<Duration>,
    ) -> FtpResult<Reply> {
        let start = Instant::now();
        self.wait_available(start, timeout)?;
        let line = self.read_line()?;
        let mut reply = parse_reply(&line).inspect_err(|_| {
            self.last_reply = Some(Reply::new(0, line.as_str()));
        })?;
        // multiple line reply: keep reading until `xyz text`
        if is_continuation(&line) {
            loop {
                self.wait_available(start, timeout)?;
                let next = self.read_line()?;
                let closing = closes_multiline(&next, reply.code);
                reply.text.push('\n');
                reply
                    .text
                    .push_str(if closing { &next[4..] } else { next.as_str() });
                if closing {
                    break;
                }
            }
        }
        self.last_reply = Some(reply.clone());
        if matches_any(&reply, expected) {
            Ok(reply)
        } else {
            debug!("Unexpected reply {reply}; expected {expected:?}");
            Err(ProtocolError::UnexpectedReply {
                got: reply,
                expected: expected.to_vec(),
            }
            .into())
        }
    }

    /// Read and throw away whatever the server already sent. Returns the amount of bytes dropped
    pub fn drain(&mut self) -> usize {
        let mut discarded = 0;
        while self.available() > 0 {
            let chunk = match self.reader.fill_buf() {
                Ok(buf) => {
                    trace!("CC IN (discarded): {:?}", String::from_utf8_lossy(buf));
                    buf.len()
                }
                Err(err) => {
                    debug!("failed to drain control channel: {err}");
                    break;
                }
            };
            if chunk == 0 {
                break;
            }
            self.reader.consume(chunk);
            discarded += chunk;
        }
        discarded
    }

    /// Amount of bytes readable without blocking
    pub fn available(&mut self) -> usize {
        self.reader.buffer().len() + self.reader.get_mut().available()
    }

    pub fn is_connected(&self) -> bool {
        !self.reader.buffer().is_empty() || self.reader.get_ref().is_connected()
    }

    /// Poll the server and tell whether it is still there.
    ///
    /// Whatever the server sent meanwhile (e.g. `421` before an idle timeout) is thrown
    /// away, so call it only while no reply is awaited.
    pub fn is_alive(&mut self) -> bool {
        let discarded = self.drain();
        if discarded > 0 {
            debug!("Discarded {discarded} bytes the server sent while idle");
        }
        self.is_connected()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.reader.get_ref().peer_addr()
    }

    /// Returns welcome message retrieved from server (if available)
    pub fn welcome_msg(&self) -> Option<&str> {
        self.welcome_msg.as_deref()
    }

    /// Last reply received, kept for diagnostics
    pub fn last_reply(&self) -> Option<&Reply> {
        self.last_reply.as_ref()
    }

    pub fn close(&mut self) {
        self.discard_buffer();
        self.reader.get_mut().close();
    }

    fn discard_buffer(&mut self) {
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
    }

    /// Poll until at least one byte is readable
    fn wait_available(&mut self, start: Instant, timeout: Option<Duration>) -> FtpResult<()> {
        while self.available() == 0 {
            if !self.reader.get_ref().is_connected() {
                return Err(TransportError::Closed.into());
            }
            if timeout.is_some_and(|t| start.elapsed() >= t) {
                return Err(TransportError::Timeout.into());
            }
            std::thread::sleep(self.poll_interval);
        }
        Ok(())
    }

    /// Read one line, terminator stripped
    fn read_line(&mut self) -> FtpResult<String> {
        let mut line = Vec::new();
        self.reader.read_until(b'\n', &mut line)?;
        let line = String::from_utf8_lossy(&line)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        trace!("CC IN: {line}");
        Ok(line)
    }
}

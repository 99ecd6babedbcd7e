#![allow(dead_code)]

//! In-memory transports which play back a scripted ftp server

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Result, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::transport::{Transport, TransportBuilder};
use crate::FtpConfig;

/// What a data connection does once connected
#[derive(Debug, Clone)]
pub enum Payload {
    /// Serve these bytes, then hang up
    Send(Vec<u8>),
    /// Stay open and collect what the client writes. Also what an unscripted connection does
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Control,
    Data,
}

#[derive(Debug)]
pub struct Script {
    kind: Kind,
    /// Lines sent by the server as soon as the control connection is up
    pub banner: Vec<String>,
    /// One entry per command received; each entry may hold several lines
    pub replies: VecDeque<Vec<String>>,
    /// One entry per data connection
    pub payloads: VecDeque<Payload>,
    /// Command lines received, without terminator
    pub commands: Vec<String>,
    /// Bytes received on each data connection, pushed on close
    pub uploads: Vec<Vec<u8>>,
    pub connects: Vec<SocketAddr>,
    pub refuse_connects: usize,
    pub dead_connects: usize,
    pub closes: usize,
    incoming: VecDeque<u8>,
    receiving: Vec<u8>,
    pending_line: Vec<u8>,
    connected: bool,
    hangup_when_drained: bool,
}

impl Script {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            banner: Vec::new(),
            replies: VecDeque::new(),
            payloads: VecDeque::new(),
            commands: Vec::new(),
            uploads: Vec::new(),
            connects: Vec::new(),
            refuse_connects: 0,
            dead_connects: 0,
            closes: 0,
            incoming: VecDeque::new(),
            receiving: Vec::new(),
            pending_line: Vec::new(),
            connected: false,
            hangup_when_drained: false,
        }
    }

    fn push_lines(&mut self, lines: &[String]) {
        for line in lines {
            self.incoming.extend(line.as_bytes());
            self.incoming.extend(b"\r\n");
        }
    }

    /// Commands received which start with `verb`
    pub fn count(&self, verb: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(verb)).count()
    }
}

/// A [`Transport`] playing back a [`Script`]. Clones share the same script,
/// so tests keep a clone to inspect what the client did.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Control transport greeting with `220`
    pub fn control() -> Self {
        Self::new(Kind::Control).banner("220 Service ready")
    }

    pub fn data() -> Self {
        Self::new(Kind::Data)
    }

    /// Control transport which accepts `USER`/`PASS`
    pub fn logged_in() -> Self {
        Self::control()
            .reply(&["331 User name okay, need password"])
            .reply(&["230 User logged in"])
    }

    fn new(kind: Kind) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Script::new(kind))),
        }
    }

    pub fn banner(self, line: &str) -> Self {
        self.inner.lock().banner.push(line.to_string());
        self
    }

    /// Queue the reply to the next command
    pub fn reply(self, lines: &[&str]) -> Self {
        self.inner
            .lock()
            .replies
            .push_back(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Queue what the next data connection does
    pub fn payload(self, payload: Payload) -> Self {
        self.inner.lock().payloads.push_back(payload);
        self
    }

    /// Queue lines the server pushes without being asked
    pub fn push(&self, lines: &[&str]) {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        self.inner.lock().push_lines(&lines);
    }

    /// Simulate the peer dropping the connection
    pub fn hang_up(&self) {
        let mut script = self.inner.lock();
        script.connected = false;
        script.incoming.clear();
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.inner.lock()
    }

    pub fn commands(&self) -> Vec<String> {
        self.inner.lock().commands.clone()
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<()> {
        let mut script = self.inner.lock();
        script.connects.push(addr);
        if script.refuse_connects > 0 {
            script.refuse_connects -= 1;
            return Err(ErrorKind::ConnectionRefused.into());
        }
        if script.dead_connects > 0 {
            script.dead_connects -= 1;
            return Ok(());
        }
        script.connected = true;
        script.incoming.clear();
        match script.kind {
            Kind::Control => {
                let banner = script.banner.clone();
                script.push_lines(&banner);
                script.hangup_when_drained = false;
            }
            Kind::Data => match script.payloads.pop_front() {
                Some(Payload::Send(bytes)) => {
                    script.incoming.extend(bytes);
                    script.hangup_when_drained = true;
                }
                Some(Payload::Receive) | None => script.hangup_when_drained = false,
            },
        }
        Ok(())
    }

    fn available(&mut self) -> usize {
        let script = self.inner.lock();
        if script.connected {
            script.incoming.len()
        } else {
            0
        }
    }

    fn is_connected(&self) -> bool {
        let script = self.inner.lock();
        script.connected && !(script.hangup_when_drained && script.incoming.is_empty())
    }

    fn close(&mut self) {
        let mut script = self.inner.lock();
        script.closes += 1;
        if script.connected && script.kind == Kind::Data {
            let received = std::mem::take(&mut script.receiving);
            script.uploads.push(received);
        }
        script.connected = false;
        script.incoming.clear();
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        let script = self.inner.lock();
        if script.connected {
            script.connects.last().copied()
        } else {
            None
        }
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut script = self.inner.lock();
        let n = buf.len().min(script.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(script.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let mut script = self.inner.lock();
        if !script.connected {
            return Err(ErrorKind::NotConnected.into());
        }
        match script.kind {
            Kind::Data => script.receiving.extend_from_slice(buf),
            Kind::Control => {
                for byte in buf {
                    if *byte == b'\n' {
                        let line = String::from_utf8_lossy(&script.pending_line)
                            .trim_end()
                            .to_string();
                        script.pending_line.clear();
                        script.commands.push(line);
                        if let Some(reply) = script.replies.pop_front() {
                            script.push_lines(&reply);
                        }
                    } else {
                        script.pending_line.push(*byte);
                    }
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hands out prepared transports in order; once drained, hands out transports which never connect
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    queue: Arc<Mutex<VecDeque<ScriptedTransport>>>,
}

impl ScriptedFactory {
    /// Queue the transports for one session: control first, then data
    pub fn session(self, control: &ScriptedTransport, data: &ScriptedTransport) -> Self {
        {
            let mut queue = self.queue.lock();
            queue.push_back(control.clone());
            queue.push_back(data.clone());
        }
        self
    }

    pub fn builder(&self) -> Box<TransportBuilder<ScriptedTransport>> {
        let queue = self.queue.clone();
        Box::new(move || {
            queue.lock().pop_front().unwrap_or_else(|| {
                let transport = ScriptedTransport::control();
                transport.script().refuse_connects = usize::MAX;
                transport
            })
        })
    }
}

pub fn server_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 21)
}

/// Configuration which never sleeps for long
pub fn test_config() -> FtpConfig {
    FtpConfig::default()
        .connect_retry(3, Duration::ZERO)
        .poll_interval(Duration::from_millis(1))
        .abort_delay(Duration::ZERO)
        .completion_timeout(Duration::from_millis(20))
        .reply_timeout(Some(Duration::from_millis(200)))
}

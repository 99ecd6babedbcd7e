//! # Reply
//!
//! Decoding of control channel reply lines

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use crate::regex::PASV_PORT_RE;
use crate::types::ProtocolError;
use crate::Status;

/// One reply from the ftp server: a 3-digit code plus the trailing text.
///
/// Only `code` is checked by the client; `text` is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub code: u32,
    pub text: String,
}

impl Reply {
    /// Instantiates a new `Reply`
    pub fn new<S: Into<String>>(code: u32, text: S) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// Stand-in reply used when nothing was received and nothing was required
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.text.is_empty()
    }

    /// Get the reply code as a [`Status`]
    pub fn status(&self) -> Status {
        Status::from(self.code)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.text)
    }
}

/// Parse a single reply line (with or without its line terminator).
///
/// The line must carry 3 digits followed by a separator (space or `-`).
pub fn parse_reply(line: &str) -> Result<Reply, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let bytes = line.as_bytes();
    if bytes.len() < 4 || !matches!(bytes[3], b' ' | b'-') {
        return Err(ProtocolError::Malformed(line.to_string()));
    }
    if !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::Malformed(line.to_string()));
    }
    let code = line[..3]
        .parse::<u32>()
        .map_err(|_| ProtocolError::Malformed(line.to_string()))?;
    Ok(Reply::new(code, &line[4..]))
}

/// Whether `line` opens or continues a multi-line reply (`xyz-text`)
pub(crate) fn is_continuation(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&b'-')
}

/// Whether `line` closes the multi-line reply opened with `code`
pub(crate) fn closes_multiline(line: &str, code: u32) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 4 && bytes[3] == b' ' && line[..3] == format!("{code:03}")
}

/// Returns true if `expected` is empty (anything goes) or contains the reply code
pub fn matches_any(reply: &Reply, expected: &[Status]) -> bool {
    expected.is_empty() || expected.iter().any(|s| s.code() == reply.code)
}

/// Decode the data connection address out of the text of a `227` reply.
///
/// PASV reply format: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
pub fn parse_passive_reply(text: &str) -> Result<SocketAddr, ProtocolError> {
    trace!("PASV reply: {text}");
    let caps = PASV_PORT_RE
        .captures(text)
        .ok_or_else(|| ProtocolError::Malformed(text.to_string()))?;
    let mut octets = [0u8; 6];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = caps[i + 1]
            .parse::<u8>()
            .map_err(|_| ProtocolError::Malformed(text.to_string()))?;
    }
    let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let port = u16::from(octets[4]) * 256 + u16::from(octets[5]);
    Ok(SocketAddr::new(ip.into(), port))
}

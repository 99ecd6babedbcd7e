//! # Types
//!
//! Errors and the small value types shared by every layer of the client

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

use crate::reply::Reply;
use crate::session::OperationState;
use crate::Status;

/// A shorthand for a Result whose error type is always an FtpError.
pub type FtpResult<T> = std::result::Result<T, FtpError>;

/// `FtpError` is a library-global error type to describe the different kinds of
/// errors that might occur while using FTP.
#[derive(Debug, Error)]
pub enum FtpError {
    /// The underlying byte stream failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// The server spoke, but not what we expected
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Every slot of the session pool is busy
    #[error("No session available: all sessions are busy")]
    SessionExhausted,
    /// The session behind a handle has been released, or the handle is the invalid sentinel
    #[error("Session is not valid")]
    InvalidSession,
    /// A new operation was requested on a session which is not idle
    #[error("Session is busy ({0})")]
    SessionBusy(OperationState),
}

/// Failures of the byte-stream transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect failed after the whole retry budget was spent
    #[error("{addr} is unreachable after {attempts} attempts")]
    Unreachable { addr: SocketAddr, attempts: usize },
    /// The peer closed the connection while a reply was awaited
    #[error("connection closed by peer")]
    Closed,
    /// No reply arrived within the configured reply timeout
    #[error("timed out waiting for reply")]
    Timeout,
    /// Read or write failed
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Failures while interpreting the control channel
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The reply line has an invalid syntax
    #[error("malformed reply: {0:?}")]
    Malformed(String),
    /// The command expected a certain reply code, but got another one.
    /// This means the ftp server refused to perform your request or there was an error while processing it.
    #[error("unexpected reply {}; expected one of {}", .got, fmt_codes(.expected))]
    UnexpectedReply { got: Reply, expected: Vec<Status> },
}

impl From<std::io::Error> for FtpError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(TransportError::Io(err))
    }
}

impl FtpError {
    /// Returns the reply which caused this error, if the server sent one
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Protocol(ProtocolError::UnexpectedReply { got, .. }) => Some(got),
            _ => None,
        }
    }
}

fn fmt_codes(codes: &[Status]) -> String {
    codes
        .iter()
        .map(|s| s.code().to_string())
        .collect::<Vec<String>>()
        .join(",")
}

/// How a remote file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Download with `RETR`
    Read,
    /// Upload with `STOR`, replacing the remote file
    Write,
    /// Upload with `APPE`, appending to the remote file
    Append,
}

impl FileMode {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write | Self::Append)
    }
}

/// Kind of a remote object, as far as a `SIZE` query can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    File,
    Directory,
}

/// Text Format Control used in `TYPE` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatControl {
    /// Default text format control (is NonPrint)
    Default,
    /// Non-print (not destined for printing)
    NonPrint,
    /// Telnet format control (\<CR\>, \<FF\>, etc.)
    Telnet,
    /// ASA (Fortran) Carriage Control
    Asa,
}

/// File Type used in `TYPE` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// ASCII text (the argument is the text format control)
    Ascii(FormatControl),
    /// Image, aka binary
    Binary,
}

impl fmt::Display for FormatControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatControl::Default | FormatControl::NonPrint => write!(f, "N"),
            FormatControl::Telnet => write!(f, "T"),
            FormatControl::Asa => write!(f, "C"),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Ascii(FormatControl::Default) => write!(f, "A"),
            FileType::Ascii(fc) => write!(f, "A {fc}"),
            FileType::Binary => write!(f, "I"),
        }
    }
}

#[cfg(test)]
mod test {

    use std::net::{IpAddr, Ipv4Addr};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fmt_error() {
        assert_eq!(
            FtpError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "omar"))
                .to_string()
                .as_str(),
            "Transport error: omar"
        );
        assert_eq!(
            FtpError::from(TransportError::Unreachable {
                addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 21),
                attempts: 10
            })
            .to_string()
            .as_str(),
            "Transport error: 127.0.0.1:21 is unreachable after 10 attempts"
        );
        assert_eq!(
            FtpError::from(ProtocolError::UnexpectedReply {
                got: Reply::new(550, "Not Found"),
                expected: vec![Status::File],
            })
            .to_string()
            .as_str(),
            "Protocol error: unexpected reply [550] Not Found; expected one of 213"
        );
        assert_eq!(
            FtpError::SessionBusy(OperationState::Listing)
                .to_string()
                .as_str(),
            "Session is busy (listing)"
        );
    }

    #[test]
    fn should_expose_reply_of_error() {
        let err = FtpError::from(ProtocolError::UnexpectedReply {
            got: Reply::new(530, "Not logged in"),
            expected: vec![Status::LoggedIn],
        });
        assert_eq!(err.reply().map(|r| r.code), Some(530));
        assert!(FtpError::SessionExhausted.reply().is_none());
    }

    #[test]
    fn should_tell_write_modes() {
        assert!(!FileMode::Read.is_write());
        assert!(FileMode::Write.is_write());
        assert!(FileMode::Append.is_write());
    }

    #[test]
    fn fmt_file_type() {
        assert_eq!(FileType::Binary.to_string().as_str(), "I");
        assert_eq!(
            FileType::Ascii(FormatControl::Default).to_string().as_str(),
            "A"
        );
        assert_eq!(
            FileType::Ascii(FormatControl::Telnet).to_string().as_str(),
            "A T"
        );
        assert_eq!(FormatControl::Asa.to_string().as_str(), "C");
        assert_eq!(FormatControl::NonPrint.to_string().as_str(), "N");
    }
}

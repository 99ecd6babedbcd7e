#![crate_name = "pasvftp"]
#![crate_type = "lib"]

//! # pasvftp
//!
//! pasvftp is a blocking FTP client engine which transfers data in **passive mode** only.
//! It is written against a small [`Transport`] capability rather than a specific network
//! stack, so it runs over plain tcp ([`TcpTransport`]) as well as any other reliable byte
//! stream you provide.
//!
//! Its main features are:
//!
//! - A bounded pool of sessions: each open file and each directory listing gets a session
//!   of its own, so reading a file while writing another one just works
//! - Files exposed as [`std::io::Read`] / [`std::io::Write`]
//! - Lazy directory listings through an [`Iterator`]
//! - Transfers interrupted by the server are reported as a plain end of stream
//! - Connect with retries and configurable backoff
//!
//! ## Get started
//!
//! To get started, first add **pasvftp** to your dependencies:
//!
//! ```toml
//! pasvftp = "^0.3"
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::io::Write;
//! use pasvftp::{FileMode, FtpClient, FtpConfig};
//!
//! let mut ftp = FtpClient::tcp(FtpConfig::default().max_sessions(2));
//! ftp.begin("127.0.0.1".parse().unwrap(), Some("test"), Some("test"))
//!     .unwrap_or_else(|err| panic!("{}", err));
//! ftp.binary().unwrap();
//!
//! let mut file = ftp.open("hello.txt", FileMode::Write).unwrap();
//! file.write_all(b"hello, world!\n").unwrap();
//! assert!(file.close());
//!
//! // Disconnect from server
//! ftp.end();
//! ```
//!
//! ## Logging
//!
//! The library logs through the [log](https://docs.rs/log) facade; install the logger you
//! prefer in your application. Enable the `no-log` feature to compile logging out.
//!

#![doc(html_playground_url = "https://play.rust-lang.org")]

// -- common deps
#[macro_use]
extern crate lazy_regex;
#[macro_use]
extern crate log;

// -- private
mod config;
mod regex;
mod status;
#[cfg(test)]
mod test_utils;

// -- public
pub mod client;
pub mod command;
pub mod file;
pub mod list;
pub mod pool;
pub mod reply;
pub mod session;
pub mod transport;
pub mod types;

// -- export
pub use client::FtpClient;
pub use config::{FtpConfig, DEFAULT_MAX_SESSIONS, DEFAULT_PORT};
pub use file::FileHandle;
pub use list::DirectoryIterator;
pub use pool::{SessionHandle, SessionPool};
pub use reply::Reply;
pub use session::{OperationState, Session};
pub use status::Status;
pub use transport::{TcpTransport, Transport, TransportBuilder};
pub use types::{
    FileMode, FileType, FormatControl, FtpError, FtpResult, ObjectType, ProtocolError,
    TransportError,
};

// -- test logging
#[cfg(test)]
pub fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

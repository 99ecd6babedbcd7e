//! # Session
//!
//! One authenticated connection to the server: a control channel, a data channel and the
//! state of the operation currently running on them.

mod control;
mod data;
mod state;

use std::io::{Read, Write};
use std::net::SocketAddr;

pub use control::ControlChannel;
pub use data::DataChannel;
pub use state::OperationState;

use crate::command::Command;
use crate::regex::SIZE_RE;
use crate::reply::{parse_passive_reply, Reply};
use crate::transport::Transport;
use crate::types::{FileType, FormatControl, FtpError, FtpResult, ObjectType};
use crate::{FtpConfig, Status};

/// Codes announcing that the data connection is about to carry a transfer
const OPENING_CODES: &[Status] = &[Status::AboutToSend, Status::AlreadyOpen];
/// Codes closing a transfer
const COMPLETION_CODES: &[Status] = &[Status::ClosingDataConnection, Status::RequestedFileActionOk];
/// Codes acknowledging `ABOR`
const ABORT_CODES: &[Status] = &[
    Status::TransferAborted,
    Status::ClosingDataConnection,
    Status::DataConnectionOpen,
];

/// A control channel, a data channel and the operation state binding them.
///
/// A session owns both its transports. Only one transfer can run at a time: a new one may
/// start only while the session is [`OperationState::Idle`].
#[derive(Debug)]
pub struct Session<T>
where
    T: Transport,
{
    control: ControlChannel<T>,
    data: DataChannel<T>,
    state: OperationState,
    config: FtpConfig,
    server: Option<SocketAddr>,
}

impl<T> Session<T>
where
    T: Transport,
{
    /// Create a session over two unconnected transports
    pub fn new(control: T, data: T, config: &FtpConfig) -> Self {
        Self {
            control: ControlChannel::new(control, config.poll_interval, config.reply_timeout),
            data: DataChannel::new(data),
            state: OperationState::Idle,
            config: config.clone(),
            server: None,
        }
    }

    /// Connect to `addr` and log in, if a user is given
    pub fn begin(
        &mut self,
        addr: SocketAddr,
        user: Option<&str>,
        password: Option<&str>,
    ) -> FtpResult<()> {
        debug!("Opening session with {addr}");
        self.control.connect_with_retry(
            addr,
            self.config.connect_attempts,
            self.config.connect_backoff,
        )?;
        self.server = Some(addr);
        if let Some(user) = user {
            self.control.login(user, password)?;
        }
        Ok(())
    }

    /// Negotiate passive mode and connect the data channel. Returns the data address
    pub fn enter_passive_mode(&mut self) -> FtpResult<SocketAddr> {
        debug!("PASV command");
        // PASV reply format : 227 Entering Passive Mode (h1,h2,h3,h4,p1,p2).
        let reply = self.control.send_command(&Command::Pasv, &[Status::PassiveMode])?;
        let mut addr = parse_passive_reply(&reply.text)?;
        if self.config.passive_nat_workaround {
            if let Some(server) = self.control.peer_addr().or(self.server) {
                trace!("Replacing passive address {} with {}", addr.ip(), server.ip());
                addr.set_ip(server.ip());
            }
        }
        trace!("Passive address: {addr}");
        self.data.connect(
            addr,
            self.config.connect_attempts,
            self.config.connect_backoff,
        )?;
        Ok(addr)
    }

    /// Start downloading `path` and return the data stream.
    ///
    /// Calling it again while the download runs returns the same stream without a new `RETR`.
    pub fn begin_read(&mut self, path: &str) -> FtpResult<&mut DataChannel<T>> {
        if self.state != OperationState::Reading {
            self.start_transfer(Command::Retr(path.to_string()), OperationState::Reading)?;
        }
        self.check_data_closed();
        Ok(&mut self.data)
    }

    /// Start uploading to `path` (`APPE` if `append`, `STOR` otherwise) and return the data stream.
    ///
    /// Calling it again while the upload runs returns the same stream without a new command.
    pub fn begin_write(&mut self, path: &str, append: bool) -> FtpResult<&mut DataChannel<T>> {
        if self.state != OperationState::Writing {
            let cmd = if append {
                Command::Appe(path.to_string())
            } else {
                Command::Store(path.to_string())
            };
            self.start_transfer(cmd, OperationState::Writing)?;
        }
        self.check_data_closed();
        Ok(&mut self.data)
    }

    /// Start listing entry names of `path` (`NLST`) and return the data stream
    pub fn begin_list(&mut self, path: Option<&str>) -> FtpResult<&mut DataChannel<T>> {
        self.start_transfer(
            Command::Nlst(path.map(|p| p.to_string())),
            OperationState::Listing,
        )?;
        Ok(&mut self.data)
    }

    /// Close the data connection of a finished (or given up) transfer and collect the
    /// completion reply. Returns whether the transfer completed cleanly.
    ///
    /// The session is idle afterwards in any case.
    pub fn end_transfer(&mut self) -> bool {
        if self.state.is_idle() {
            return true;
        }
        debug!("Ending transfer ({})", self.state);
        self.data.close();
        let clean = match self
            .control
            .await_reply_within(COMPLETION_CODES, Some(self.config.completion_timeout))
        {
            Ok(reply) => {
                trace!("Transfer completed: {reply}");
                true
            }
            Err(err) => {
                warn!("Transfer did not complete cleanly: {err}");
                false
            }
        };
        self.set_state(OperationState::Idle);
        clean
    }

    /// Close the data connection after a listing reached its end and wait for the completion reply.
    ///
    /// The server only sends that reply once the data connection is closed.
    pub fn finish_listing(&mut self) -> FtpResult<Reply> {
        debug!("Listing finished");
        self.data.close();
        self.set_state(OperationState::Idle);
        self.control.await_reply(COMPLETION_CODES, true)
    }

    /// Interrupt the running transfer. Does nothing on an idle session.
    ///
    /// The session is idle afterwards, whatever the server replies.
    pub fn abort(&mut self) -> FtpResult<()> {
        if self.state.is_idle() {
            return Ok(());
        }
        debug!("Aborting active file transfer ({})", self.state);
        self.data.close();
        self.set_state(OperationState::Idle);
        let result = self.control.send_command(&Command::Abor, ABORT_CODES);
        // let the server flush, then forget whatever it said
        std::thread::sleep(self.config.abort_delay);
        self.control.drain();
        result.map(|_| ())
    }

    /// Read from the download running on this session. Returns 0 at end of stream
    pub fn read_data(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.check_data_closed() || self.state != OperationState::Reading {
            return Ok(0);
        }
        let n = self.data.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.set_state(OperationState::EndOfStream);
        }
        Ok(n)
    }

    /// Read one line from the running download or listing. Empty at end of stream
    pub fn read_data_line(&mut self, eol: u8) -> std::io::Result<String> {
        if self.check_data_closed()
            || !matches!(
                self.state,
                OperationState::Reading | OperationState::Listing
            )
        {
            return Ok(String::new());
        }
        self.data.read_line_until(eol)
    }

    /// Next byte of the running download, without consuming it
    pub fn peek_data(&mut self) -> std::io::Result<Option<u8>> {
        if self.check_data_closed() || self.state != OperationState::Reading {
            return Ok(None);
        }
        self.data.peek()
    }

    /// Bytes of the running download readable without blocking
    pub fn data_available(&mut self) -> usize {
        if self.check_data_closed() || self.state != OperationState::Reading {
            return 0;
        }
        self.data.available()
    }

    /// Write to the upload running on this session. Returns 0 if no upload is running
    pub fn write_data(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.check_data_closed() || self.state != OperationState::Writing {
            return Ok(0);
        }
        self.data.write(buf)
    }

    pub fn flush_data(&mut self) -> std::io::Result<()> {
        if self.state == OperationState::Writing {
            self.data.flush()?;
        }
        Ok(())
    }

    /// Tell whether `path` is a file or a directory, from the outcome of `SIZE`.
    ///
    /// This is a heuristic: `213` means file, anything else is taken for a directory.
    pub fn object_type(&mut self, path: &str) -> ObjectType {
        debug!("Probing object type of {path}");
        match self.control.send_command(
            &Command::Size(path.to_string()),
            &[Status::File, Status::FileUnavailable],
        ) {
            Ok(reply) if reply.status() == Status::File => ObjectType::File,
            Ok(_) => ObjectType::Directory,
            Err(err) => {
                debug!("SIZE {path} failed ({err}); assuming directory");
                ObjectType::Directory
            }
        }
    }

    /// Size in bytes of the file at `path`; 0 if it can't be told
    pub fn size(&mut self, path: &str) -> u64 {
        debug!("Getting file size for {path}");
        let reply = match self
            .control
            .send_command(&Command::Size(path.to_string()), &[Status::File])
        {
            Ok(reply) => reply,
            Err(err) => {
                debug!("SIZE {path} failed: {err}");
                return 0;
            }
        };
        SIZE_RE
            .captures(&reply.text)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// This creates a new directory on the server.
    pub fn mkdir(&mut self, path: &str) -> FtpResult<()> {
        debug!("Creating directory at {path}");
        self.control
            .send_command(&Command::Mkd(path.to_string()), &[Status::PathCreated])
            .map(|_| ())
    }

    /// Removes the remote directory from the server.
    pub fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        debug!("Removing directory {path}");
        self.control
            .send_command(
                &Command::Rmd(path.to_string()),
                &[Status::RequestedFileActionOk],
            )
            .map(|_| ())
    }

    /// Remove the remote file from the server.
    pub fn delete(&mut self, path: &str) -> FtpResult<()> {
        debug!("Removing file {path}");
        self.control
            .send_command(
                &Command::Dele(path.to_string()),
                &[Status::RequestedFileActionOk],
            )
            .map(|_| ())
    }

    /// Sets the type of file to be transferred (`TYPE`)
    pub fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        debug!("Setting transfer type {file_type}");
        self.control
            .send_command(&Command::Type(file_type), &[Status::CommandOk])
            .map(|_| ())
    }

    pub fn binary(&mut self) -> FtpResult<()> {
        self.transfer_type(FileType::Binary)
    }

    pub fn ascii(&mut self) -> FtpResult<()> {
        self.transfer_type(FileType::Ascii(FormatControl::Default))
    }

    /// This does nothing. This is usually just used to keep the connection open.
    pub fn noop(&mut self) -> FtpResult<()> {
        debug!("Pinging server");
        self.control
            .send_command(&Command::Noop, &[Status::CommandOk])
            .map(|_| ())
    }

    /// Quits the session, trying the non standard verbs if `QUIT` is refused
    pub fn quit(&mut self) -> FtpResult<()> {
        self.control.quit()
    }

    /// Say goodbye (best effort) and close both channels
    pub fn end(&mut self) {
        debug!("Ending session");
        if self.control.is_connected() {
            if let Err(err) = self.quit() {
                debug!("Quit failed: {err}");
            }
        }
        self.control.close();
        self.data.close();
        self.set_state(OperationState::Idle);
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Whether the control connection is up
    pub fn is_connected(&self) -> bool {
        self.control.is_connected()
    }

    /// Whether the control connection is still up, polling the server first.
    /// Meant for idle sessions: pending control lines are discarded
    pub fn is_alive(&mut self) -> bool {
        self.control.is_alive()
    }

    /// Last reply the server sent on this session
    pub fn last_reply(&self) -> Option<&Reply> {
        self.control.last_reply()
    }

    /// Returns welcome message retrieved from server (if available)
    pub fn welcome_msg(&self) -> Option<&str> {
        self.control.welcome_msg()
    }

    /// Low level access to the control channel
    pub fn control(&mut self) -> &mut ControlChannel<T> {
        &mut self.control
    }

    /// Detect a closed data connection and move a running transfer to end of stream
    fn check_data_closed(&mut self) -> bool {
        if self.data.is_connected() {
            return false;
        }
        if self.state.is_transferring() {
            debug!("Data connection is closed");
        }
        self.set_state(self.state.on_data_closed());
        true
    }

    fn start_transfer(&mut self, cmd: Command, next: OperationState) -> FtpResult<()> {
        if !self.state.is_idle() {
            return Err(FtpError::SessionBusy(self.state));
        }
        debug!("Starting {next}: {cmd}");
        self.enter_passive_mode()?;
        if let Err(err) = self.control.send_command(&cmd, OPENING_CODES) {
            self.data.close();
            return Err(err);
        }
        self.set_state(next);
        Ok(())
    }

    fn set_state(&mut self, state: OperationState) {
        if self.state != state {
            trace!("Operation state: {} -> {}", self.state, state);
        }
        self.state = state;
    }
}

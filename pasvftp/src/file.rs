//! # File
//!
//! A remote file opened for reading, writing or appending

use std::io::{self, Read, Write};

use crate::pool::SessionHandle;
use crate::transport::Transport;
use crate::types::{FileMode, FtpError, FtpResult, ObjectType};

/// A remote file bound to a session of the pool.
///
/// The transfer starts when the file is opened and the session stays busy until the file is
/// closed. The session is kept for this file until the handle is dropped, so closing and
/// reopening it never competes with other files or listings. Reading a file opened for writing, or writing a file opened for
/// reading, transfers nothing and returns 0.
#[derive(Debug)]
pub struct FileHandle<T>
where
    T: Transport,
{
    session: SessionHandle<T>,
    name: String,
    mode: FileMode,
    open: bool,
    eol: u8,
}

impl<T> FileHandle<T>
where
    T: Transport,
{
    /// Open `name` on `session` and start the transfer
    pub fn open(session: SessionHandle<T>, name: &str, mode: FileMode) -> FtpResult<Self> {
        let mut file = Self {
            session,
            name: name.to_string(),
            mode,
            open: false,
            eol: b'\n',
        };
        file.bind()?;
        Ok(file)
    }

    /// Path of the file on the server
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Line terminator used by [`Self::read_line`]
    pub fn set_eol(&mut self, eol: u8) {
        self.eol = eol;
    }

    /// Start the transfer again, on the same session, after the file has been closed
    pub fn reopen(&mut self) -> FtpResult<()> {
        if self.open {
            return Ok(());
        }
        self.bind()
    }

    /// Read one byte; `None` at end of file
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    /// Read one line, without its terminator. Empty at end of file
    pub fn read_line(&mut self) -> io::Result<String> {
        if !self.readable() {
            return Ok(String::new());
        }
        let eol = self.eol;
        self.session
            .with(|s| s.read_data_line(eol))
            .map_err(into_io)?
    }

    /// Next byte, without consuming it
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        if !self.readable() {
            return Ok(None);
        }
        self.session.with(|s| s.peek_data()).map_err(into_io)?
    }

    /// Amount of bytes readable without blocking
    pub fn available(&self) -> usize {
        if !self.readable() {
            return 0;
        }
        self.session.with(|s| s.data_available()).unwrap_or(0)
    }

    /// Write one byte. Returns the amount of bytes written
    pub fn write_byte(&mut self, byte: u8) -> io::Result<usize> {
        self.write(&[byte])
    }

    /// Size of the file, as reported by the server; 0 if it can't be told
    pub fn size(&self) -> u64 {
        self.session.with(|s| s.size(&self.name)).unwrap_or(0)
    }

    /// Whether the name points to a directory. See [`crate::Session::object_type`]
    pub fn is_directory(&self) -> bool {
        self.session
            .with(|s| s.object_type(&self.name))
            .map(|t| t == ObjectType::Directory)
            .unwrap_or(false)
    }

    /// Complete the transfer and release the session. Returns whether the server confirmed
    /// the transfer; closing a closed file does nothing.
    pub fn close(&mut self) -> bool {
        if !self.open {
            return true;
        }
        debug!("Closing {}", self.name);
        self.open = false;
        match self.session.with(|s| s.end_transfer()) {
            Ok(clean) => clean,
            Err(err) => {
                warn!("Cannot close {}: {err}", self.name);
                false
            }
        }
    }

    /// Interrupt the transfer instead of completing it
    pub fn cancel(&mut self) -> FtpResult<()> {
        if !self.open {
            return Ok(());
        }
        debug!("Cancelling transfer of {}", self.name);
        self.open = false;
        self.session.try_with(|s| s.abort())
    }

    fn bind(&mut self) -> FtpResult<()> {
        debug!("Opening {} ({:?})", self.name, self.mode);
        let name = self.name.as_str();
        match self.mode {
            FileMode::Read => self.session.try_with(|s| s.begin_read(name).map(|_| ())),
            FileMode::Write => self
                .session
                .try_with(|s| s.begin_write(name, false).map(|_| ())),
            FileMode::Append => self
                .session
                .try_with(|s| s.begin_write(name, true).map(|_| ())),
        }?;
        self.open = true;
        Ok(())
    }

    fn readable(&self) -> bool {
        self.open && !self.mode.is_write()
    }
}

impl<T> Read for FileHandle<T>
where
    T: Transport,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.readable() {
            return Ok(0);
        }
        self.session.with(|s| s.read_data(buf)).map_err(into_io)?
    }
}

impl<T> Write for FileHandle<T>
where
    T: Transport,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.open || !self.mode.is_write() {
            return Ok(0);
        }
        self.session.with(|s| s.write_data(buf)).map_err(into_io)?
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.open || !self.mode.is_write() {
            return Ok(());
        }
        self.session.with(|s| s.flush_data()).map_err(into_io)?
    }
}

impl<T> Drop for FileHandle<T>
where
    T: Transport,
{
    fn drop(&mut self) {
        self.close();
    }
}

fn into_io(err: FtpError) -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, err)
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;
    use rand::distr::Alphanumeric;
    use rand::Rng;

    use super::*;
    use crate::pool::SessionPool;
    use crate::session::OperationState;
    use crate::test_utils::{server_addr, test_config, Payload, ScriptedFactory, ScriptedTransport};

    const PASV: &str = "227 Entering Passive Mode (10,0,0,1,19,136)";

    fn pool(
        control: &ScriptedTransport,
        data: &ScriptedTransport,
    ) -> SessionPool<ScriptedTransport> {
        let factory = ScriptedFactory::default().session(control, data);
        let mut pool = SessionPool::new(test_config().max_sessions(1), factory.builder());
        pool.begin(server_addr(), Some("test"), Some("test"));
        pool
    }

    fn random_payload(len: usize) -> Vec<u8> {
        rand::rng()
            .sample_iter(Alphanumeric)
            .take(len)
            .collect()
    }

    #[test]
    fn should_read_whole_file() {
        crate::log_init();
        let payload = random_payload(8192);
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["150 Opening BINARY mode data connection"]);
        let data = ScriptedTransport::data().payload(Payload::Send(payload.clone()));
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "random.bin", FileMode::Read).unwrap();
        assert!(file.is_open());
        assert_eq!(file.name(), "random.bin");
        assert_eq!(file.mode(), FileMode::Read);
        let mut received = Vec::new();
        file.read_to_end(&mut received).unwrap();
        assert_eq!(received, payload);
        // end of file is sticky
        assert_eq!(file.read_byte().unwrap(), None);
        control.push(&["226 Transfer complete"]);
        assert!(file.close());
        assert!(!file.is_open());
        assert!(file.close());
        assert_eq!(control.script().count("RETR random.bin"), 1);
        drop(file);
        assert!(pool.acquire().with(|s| s.is_idle()).unwrap());
    }

    #[test]
    fn should_read_bytes_and_lines() {
        crate::log_init();
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["150 Opening ASCII mode data connection"]);
        let data = ScriptedTransport::data()
            .payload(Payload::Send(b"first\r\nsecond;third".to_vec()));
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "lines.txt", FileMode::Read).unwrap();
        assert_eq!(file.available(), 19);
        assert_eq!(file.peek().unwrap(), Some(b'f'));
        assert_eq!(file.read_byte().unwrap(), Some(b'f'));
        assert_eq!(file.read_line().unwrap().as_str(), "irst");
        file.set_eol(b';');
        assert_eq!(file.read_line().unwrap().as_str(), "second");
        assert_eq!(file.read_line().unwrap().as_str(), "third");
        assert_eq!(file.read_line().unwrap().as_str(), "");
        // nothing can be written on a file opened for reading
        assert_eq!(file.write(b"nope").unwrap(), 0);
        control.push(&["226 Transfer complete"]);
        assert!(file.close());
    }

    #[test]
    fn should_write_file() {
        crate::log_init();
        let payload = random_payload(2048);
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["150 Ok to send data"]);
        let data = ScriptedTransport::data().payload(Payload::Receive);
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "upload.bin", FileMode::Write).unwrap();
        file.write_all(&payload).unwrap();
        assert_eq!(file.write_byte(b'!').unwrap(), 1);
        file.flush().unwrap();
        // nothing can be read from a file opened for writing
        let mut buf = [0u8; 4];
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        control.push(&["226 Transfer complete"]);
        assert!(file.close());
        // closed: writes are refused
        assert_eq!(file.write(b"late").unwrap(), 0);
        let mut expected = payload;
        expected.push(b'!');
        assert_eq!(data.script().uploads, vec![expected]);
        assert_eq!(control.script().count("STOR upload.bin"), 1);
    }

    #[test]
    fn should_append_file() {
        crate::log_init();
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["125 Data connection already open"]);
        let data = ScriptedTransport::data().payload(Payload::Receive);
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "log.txt", FileMode::Append).unwrap();
        file.write_all(b"one more line\n").unwrap();
        control.push(&["226 Transfer complete"]);
        drop(file);
        assert_eq!(control.script().count("APPE log.txt"), 1);
        assert_eq!(data.script().uploads, vec![b"one more line\n".to_vec()]);
    }

    #[test]
    fn should_fail_opening_missing_file() {
        crate::log_init();
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["550 Failed to open file"]);
        let data = ScriptedTransport::data().payload(Payload::Receive);
        let mut pool = pool(&control, &data);
        let err = FileHandle::open(pool.acquire(), "missing.txt", FileMode::Read).unwrap_err();
        assert_eq!(err.reply().map(|r| r.code), Some(550));
        // the session is free again
        assert!(pool.acquire().with(|s| s.is_idle()).unwrap());
    }

    #[test]
    fn should_not_open_on_invalid_session() {
        crate::log_init();
        assert!(matches!(
            FileHandle::<ScriptedTransport>::open(
                SessionHandle::invalid(),
                "a.txt",
                FileMode::Read
            ),
            Err(FtpError::InvalidSession)
        ));
    }

    #[test]
    fn should_cancel_transfer() {
        crate::log_init();
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["150 Opening BINARY mode data connection"])
            .reply(&["426 Connection closed; transfer aborted", "226 Abort ok"]);
        let data = ScriptedTransport::data().payload(Payload::Send(random_payload(4096)));
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "big.bin", FileMode::Read).unwrap();
        let mut buf = [0u8; 16];
        file.read_exact(&mut buf).unwrap();
        assert!(file.cancel().is_ok());
        assert!(!file.is_open());
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(control.script().count("ABOR"), 1);
        drop(file);
        assert_eq!(
            pool.acquire().with(|s| s.state()).unwrap(),
            OperationState::Idle
        );
    }

    #[test]
    fn should_reopen_file() {
        crate::log_init();
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["150 Opening"])
            .reply(&[PASV])
            .reply(&["150 Opening"]);
        let data = ScriptedTransport::data()
            .payload(Payload::Send(b"abc".to_vec()))
            .payload(Payload::Send(b"abc".to_vec()));
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "abc.txt", FileMode::Read).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        control.push(&["226 Transfer complete"]);
        assert!(file.close());
        // closed, but the session is still kept for this file
        assert!(!pool.acquire().is_valid());
        file.reopen().unwrap();
        assert!(file.is_open());
        let mut again = String::new();
        file.read_to_string(&mut again).unwrap();
        assert_eq!(content, again);
        assert_eq!(control.script().count("RETR abc.txt"), 2);
    }

    #[test]
    fn should_query_size_and_kind() {
        crate::log_init();
        let control = ScriptedTransport::logged_in()
            .reply(&[PASV])
            .reply(&["150 Opening"])
            .reply(&["213 1024"])
            .reply(&["213 1024"]);
        let data = ScriptedTransport::data().payload(Payload::Receive);
        let mut pool = pool(&control, &data);
        let mut file = FileHandle::open(pool.acquire(), "a.txt", FileMode::Write).unwrap();
        assert_eq!(file.size(), 1024);
        assert!(!file.is_directory());
        control.push(&["226 Transfer complete"]);
        assert!(file.close());
        assert_eq!(control.script().count("SIZE a.txt"), 2);
    }
}

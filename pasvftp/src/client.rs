//! # Client
//!
//! The entry point of the library: a pool of sessions towards one server, with file
//! operations on top

use std::net::{IpAddr, SocketAddr};

use crate::file::FileHandle;
use crate::list::DirectoryIterator;
use crate::pool::{SessionHandle, SessionPool};
use crate::transport::{TcpTransport, Transport, TransportBuilder};
use crate::types::{FileMode, FileType, FormatControl, FtpResult, ObjectType};
use crate::FtpConfig;

/// Ftp client.
///
/// Each open file and each listing runs on its own session, so a file can be read while
/// another one is written. Sessions are opened on demand, up to the configured maximum.
///
/// ```rust,no_run
/// use std::io::Read;
/// use pasvftp::{FileMode, FtpClient, FtpConfig};
///
/// let mut ftp = FtpClient::tcp(FtpConfig::default());
/// ftp.begin("127.0.0.1".parse().unwrap(), Some("anonymous"), Some("anonymous@"))
///     .unwrap();
/// for name in ftp.ls(None).unwrap() {
///     println!("{name}");
/// }
/// let mut file = ftp.open("readme.txt", FileMode::Read).unwrap();
/// let mut content = String::new();
/// file.read_to_string(&mut content).unwrap();
/// file.close();
/// ftp.end();
/// ```
pub struct FtpClient<T>
where
    T: Transport,
{
    pool: SessionPool<T>,
    port: u16,
}

impl FtpClient<TcpTransport> {
    /// Client over plain tcp connections
    pub fn tcp(config: FtpConfig) -> Self {
        let connect_timeout = config.connect_timeout;
        let read_timeout = config.reply_timeout;
        Self::new(
            config,
            Box::new(move || TcpTransport::new(connect_timeout).read_timeout(read_timeout)),
        )
    }
}

impl<T> FtpClient<T>
where
    T: Transport,
{
    /// Client creating its transports with `builder`
    pub fn new(config: FtpConfig, builder: Box<TransportBuilder<T>>) -> Self {
        let port = config.port;
        Self {
            pool: SessionPool::new(config, builder),
            port,
        }
    }

    /// Set the control port used by the next [`Self::begin`]
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Connect to the server and log in. The first session is opened right away so that
    /// unreachable servers and wrong credentials are reported here.
    pub fn begin(
        &mut self,
        ip: IpAddr,
        user: Option<&str>,
        password: Option<&str>,
    ) -> FtpResult<()> {
        let addr = SocketAddr::new(ip, self.port);
        info!("Connecting to {addr}");
        self.pool.begin(addr, user, password);
        self.pool.try_acquire().map(|_| ())
    }

    /// Quit every session
    pub fn end(&mut self) {
        info!("Closing all sessions");
        self.pool.release_all();
    }

    /// Open a remote file on a session of its own, kept until the file is dropped
    pub fn open(&mut self, path: &str, mode: FileMode) -> FtpResult<FileHandle<T>> {
        let session = self.pool.try_acquire()?;
        FileHandle::open(session, path, mode)
    }

    /// List the names in `path` (the working directory if `None`) on a session of its own.
    ///
    /// The listing starts right away, so a refused `NLST` is reported here.
    pub fn ls(&mut self, path: Option<&str>) -> FtpResult<DirectoryIterator<T>> {
        let session = self.pool.try_acquire()?;
        let mut entries = DirectoryIterator::new(session, path);
        entries.begin()?;
        Ok(entries)
    }

    pub fn mkdir(&mut self, path: &str) -> FtpResult<()> {
        self.session()?.try_with(|s| s.mkdir(path))
    }

    /// Delete a remote file
    pub fn remove(&mut self, path: &str) -> FtpResult<()> {
        self.session()?.try_with(|s| s.delete(path))
    }

    pub fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        self.session()?.try_with(|s| s.rmdir(path))
    }

    /// Transfer files as binary (`TYPE I`)
    pub fn binary(&mut self) -> FtpResult<()> {
        self.transfer_type(FileType::Binary)
    }

    /// Transfer files as ascii text (`TYPE A`)
    pub fn ascii(&mut self) -> FtpResult<()> {
        self.transfer_type(FileType::Ascii(FormatControl::Default))
    }

    /// Set the transfer type of every session, open and to come
    pub fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        self.pool.set_transfer_type(file_type)
    }

    /// Size of a remote file; 0 if the server can't tell
    pub fn size(&mut self, path: &str) -> FtpResult<u64> {
        self.session()?.with(|s| s.size(path))
    }

    /// Whether `path` is a file or a directory, as far as `SIZE` can tell
    pub fn object_type(&mut self, path: &str) -> FtpResult<ObjectType> {
        self.session()?.with(|s| s.object_type(path))
    }

    /// Get an idle session for operations not covered by the client
    pub fn session(&mut self) -> FtpResult<SessionHandle<T>> {
        self.pool.try_acquire()
    }

    pub fn pool(&self) -> &SessionPool<T> {
        &self.pool
    }
}

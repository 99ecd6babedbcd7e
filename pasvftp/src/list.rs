//! # List
//!
//! Lazy iteration over the names listed by `NLST`

use crate::pool::SessionHandle;
use crate::transport::Transport;
use crate::types::{FtpError, FtpResult};

/// Walks the entry names of a remote directory, one line of the listing at a time.
///
/// Nothing is sent to the server until [`Self::begin`] (or the first call to `next`).
/// Once the listing ends, the data connection is closed and the completion reply consumed,
/// so the session is idle again. A listing can't be restarted: build a new iterator instead.
///
/// The iterator holds its session until dropped. If the listing could not be started or
/// broke off, iteration just ends: [`Self::error`] tells why.
#[derive(Debug)]
pub struct DirectoryIterator<T>
where
    T: Transport,
{
    session: SessionHandle<T>,
    path: Option<String>,
    started: bool,
    finished: bool,
    // the current entry hasn't been handed out by `next` yet
    pending: bool,
    current: String,
    error: Option<FtpError>,
}

impl<T> DirectoryIterator<T>
where
    T: Transport,
{
    /// Prepare the listing of `path` (the working directory if `None`) on `session`
    pub fn new(session: SessionHandle<T>, path: Option<&str>) -> Self {
        Self {
            session,
            path: path.map(|p| p.to_string()),
            started: false,
            finished: false,
            pending: false,
            current: String::new(),
            error: None,
        }
    }

    /// Start the listing and read its first entry
    pub fn begin(&mut self) -> FtpResult<()> {
        if self.started {
            return Ok(());
        }
        debug!("Listing {}", self.path.as_deref().unwrap_or("."));
        self.started = true;
        let path = self.path.as_deref();
        if let Err(err) = self.session.try_with(|s| s.begin_list(path).map(|_| ())) {
            self.finished = true;
            return Err(err);
        }
        self.read_entry();
        self.pending = true;
        Ok(())
    }

    /// Move to the next entry. Returns `None` once the listing is over
    pub fn advance(&mut self) -> Option<&str> {
        if !self.started {
            if let Err(err) = self.begin() {
                error!("Cannot list directory: {err}");
                self.error = Some(err);
            }
        } else {
            self.read_entry();
        }
        self.pending = false;
        self.entry()
    }

    /// Name of the current entry; empty before the listing starts and once it's over
    pub fn file_name(&self) -> &str {
        &self.current
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Why the listing ended early, if it did
    pub fn error(&self) -> Option<&FtpError> {
        self.error.as_ref()
    }

    fn entry(&self) -> Option<&str> {
        if self.finished {
            None
        } else {
            Some(self.current.as_str())
        }
    }

    fn read_entry(&mut self) {
        if self.finished {
            return;
        }
        let line = match self.session.with(|s| s.read_data_line(b'\n')) {
            Ok(Ok(line)) => line,
            Ok(Err(err)) => {
                warn!("Listing interrupted: {err}");
                String::new()
            }
            Err(err) => {
                warn!("Listing interrupted: {err}");
                self.finished = true;
                self.current.clear();
                self.error = Some(err);
                return;
            }
        };
        if line.is_empty() {
            self.finish();
        } else {
            trace!("Entry: {line}");
            self.current = line;
        }
    }

    /// The server sends the completion reply only once the data connection is closed
    fn finish(&mut self) {
        self.finished = true;
        self.current.clear();
        match self.session.try_with(|s| s.finish_listing()) {
            Ok(reply) => debug!("Listing completed: {reply}"),
            Err(err) => warn!("Listing did not complete cleanly: {err}"),
        }
    }
}

impl<T> Iterator for DirectoryIterator<T>
where
    T: Transport,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.pending {
            self.pending = false;
            return self.entry().map(|name| name.to_string());
        }
        self.advance().map(|name| name.to_string())
    }
}

impl<T> Drop for DirectoryIterator<T>
where
    T: Transport,
{
    fn drop(&mut self) {
        if self.started && !self.finished {
            debug!("Listing dropped before its end; aborting");
            if let Err(err) = self.session.try_with(|s| s.abort()) {
                debug!("Failed to abort listing: {err}");
            }
        }
    }
}

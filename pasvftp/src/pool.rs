//! # Pool
//!
//! A bounded set of sessions towards one server

use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::session::Session;
use crate::transport::{Transport, TransportBuilder};
use crate::types::{FileType, FtpError, FtpResult};
use crate::FtpConfig;

type SessionSlot<T> = Option<Arc<Mutex<Session<T>>>>;

/// Owns every session opened towards a server.
///
/// The amount of slots is fixed when the pool is built. Sessions are created lazily, on
/// demand, and reused once idle. Callers only ever get a [`SessionHandle`], which doesn't
/// keep the session alive but reserves it: while a handle exists, the session is never
/// handed out again.
pub struct SessionPool<T>
where
    T: Transport,
{
    config: FtpConfig,
    server: Option<SocketAddr>,
    user: Option<String>,
    password: Option<String>,
    file_type: Option<FileType>,
    slots: Vec<SessionSlot<T>>,
    builder: Box<TransportBuilder<T>>,
}

impl<T> SessionPool<T>
where
    T: Transport,
{
    /// Create an empty pool with `config.max_sessions` slots; `builder` makes the transports
    pub fn new(config: FtpConfig, builder: Box<TransportBuilder<T>>) -> Self {
        let slots = (0..config.max_sessions).map(|_| None).collect();
        Self {
            config,
            server: None,
            user: None,
            password: None,
            file_type: None,
            slots,
            builder,
        }
    }

    /// Set the server and the credentials new sessions log in with. Nothing is connected yet
    pub fn begin(&mut self, addr: SocketAddr, user: Option<&str>, password: Option<&str>) {
        debug!("Session pool targets {addr}");
        self.server = Some(addr);
        self.user = user.map(|u| u.to_string());
        self.password = password.map(|p| p.to_string());
    }

    /// Get a session ready for a new operation.
    ///
    /// The first idle session nobody holds a handle to is reused; such a session whose
    /// control connection dropped is logged in again. Otherwise a new session is opened in a
    /// free slot. Fails with [`FtpError::SessionExhausted`] if every slot holds a busy or
    /// reserved session.
    pub fn try_acquire(&mut self) -> FtpResult<SessionHandle<T>> {
        let Some(server) = self.server else {
            error!("No server to open a session with");
            return Err(FtpError::InvalidSession);
        };
        let mut dead = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(session) = slot else {
                continue;
            };
            // reserved by a handle
            if Arc::weak_count(session) > 0 {
                continue;
            }
            let Some(mut guard) = session.try_lock() else {
                continue;
            };
            if !guard.is_idle() {
                continue;
            }
            if guard.is_alive() {
                trace!("Reusing session #{idx}");
                return Ok(SessionHandle::new(session));
            }
            if dead.is_none() {
                dead = Some(idx);
            }
        }
        if let Some(idx) = dead {
            return self.revive(idx, server);
        }
        let Some(idx) = self.slots.iter().position(Option::is_none) else {
            error!("All {} sessions are busy", self.slots.len());
            return Err(FtpError::SessionExhausted);
        };
        debug!("Opening session #{idx}");
        let mut session = Session::new((self.builder)(), (self.builder)(), &self.config);
        if let Err(err) = self.start(&mut session, server) {
            session.end();
            return Err(err);
        }
        let session = Arc::new(Mutex::new(session));
        let handle = SessionHandle::new(&session);
        self.slots[idx] = Some(session);
        Ok(handle)
    }

    /// Like [`Self::try_acquire`], but returns the invalid sentinel handle on failure.
    ///
    /// Check [`SessionHandle::is_valid`] before using it.
    pub fn acquire(&mut self) -> SessionHandle<T> {
        match self.try_acquire() {
            Ok(handle) => handle,
            Err(err) => {
                error!("Unable to acquire a session: {err}");
                SessionHandle::invalid()
            }
        }
    }

    /// Set the transfer type of every idle session, and of the sessions opened from now on
    pub fn set_transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        self.file_type = Some(file_type);
        for session in self.slots.iter().flatten() {
            if let Some(mut session) = session.try_lock() {
                if session.is_idle() && session.is_connected() {
                    session.transfer_type(file_type)?;
                }
            }
        }
        Ok(())
    }

    /// Quit every session and free all slots. Never fails; handles become invalid
    pub fn release_all(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(session) = slot.take() {
                debug!("Releasing session #{idx}");
                session.lock().end();
            }
        }
    }

    /// Amount of sessions currently open
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum amount of sessions
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &FtpConfig {
        &self.config
    }

    /// Log in again the idle session in slot `idx`, whose connection dropped
    fn revive(&mut self, idx: usize, server: SocketAddr) -> FtpResult<SessionHandle<T>> {
        let Some(session) = self.slots[idx].clone() else {
            return Err(FtpError::InvalidSession);
        };
        debug!("Session #{idx} lost its connection; logging in again");
        let result = {
            let mut guard = session.lock();
            guard.end();
            self.start(&mut guard, server)
        };
        match result {
            Ok(()) => Ok(SessionHandle::new(&session)),
            Err(err) => {
                self.slots[idx] = None;
                Err(err)
            }
        }
    }

    fn start(&self, session: &mut Session<T>, server: SocketAddr) -> FtpResult<()> {
        session.begin(server, self.user.as_deref(), self.password.as_deref())?;
        if let Some(file_type) = self.file_type {
            session.transfer_type(file_type)?;
        }
        Ok(())
    }
}

impl<T> Drop for SessionPool<T>
where
    T: Transport,
{
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Non-owning reference to a pooled session.
///
/// The session is looked up again on every use: once the pool releases it, the handle
/// reports itself invalid and every call fails with [`FtpError::InvalidSession`].
/// The pool keeps the session for this handle (and its clones) until they are all dropped.
pub struct SessionHandle<T>
where
    T: Transport,
{
    session: Weak<Mutex<Session<T>>>,
}

impl<T> SessionHandle<T>
where
    T: Transport,
{
    fn new(session: &Arc<Mutex<Session<T>>>) -> Self {
        Self {
            session: Arc::downgrade(session),
        }
    }

    /// The sentinel returned when no session could be acquired
    pub fn invalid() -> Self {
        Self {
            session: Weak::new(),
        }
    }

    /// Whether the session still exists
    pub fn is_valid(&self) -> bool {
        self.session.strong_count() > 0
    }

    /// Run `f` on the session
    pub fn with<R, F>(&self, f: F) -> FtpResult<R>
    where
        F: FnOnce(&mut Session<T>) -> R,
    {
        let session = self.session.upgrade().ok_or(FtpError::InvalidSession)?;
        let mut guard = session.lock();
        Ok(f(&mut guard))
    }

    /// Run the fallible `f` on the session
    pub fn try_with<R, F>(&self, f: F) -> FtpResult<R>
    where
        F: FnOnce(&mut Session<T>) -> FtpResult<R>,
    {
        self.with(f)?
    }
}

impl<T> Clone for SessionHandle<T>
where
    T: Transport,
{
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<T> std::fmt::Debug for SessionHandle<T>
where
    T: Transport,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("valid", &self.is_valid())
            .finish()
    }
}

//! # Config
//!
//! Tunables of the client. Everything has a default suited to a slow link with a
//! cooperative scheduler, so `FtpConfig::default()` is usually enough.

use std::time::Duration;

/// Default FTP control port
pub const DEFAULT_PORT: u16 = 21;
/// Default amount of sessions a pool may hold
pub const DEFAULT_MAX_SESSIONS: usize = 10;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpConfig {
    pub(crate) port: u16,
    pub(crate) max_sessions: usize,
    pub(crate) connect_attempts: usize,
    pub(crate) connect_backoff: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) abort_delay: Duration,
    pub(crate) completion_timeout: Duration,
    pub(crate) reply_timeout: Option<Duration>,
    pub(crate) passive_nat_workaround: bool,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            connect_attempts: 10,
            connect_backoff: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            abort_delay: Duration::from_millis(300),
            completion_timeout: Duration::from_secs(2),
            reply_timeout: None,
            passive_nat_workaround: false,
        }
    }
}

impl FtpConfig {
    /// Control port of the server
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Maximum amount of concurrent sessions. At least one session is always allowed
    pub fn max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// How many times a connect is attempted before giving up, and the pause between attempts
    pub fn connect_retry(mut self, attempts: usize, backoff: Duration) -> Self {
        self.connect_attempts = attempts.max(1);
        self.connect_backoff = backoff;
        self
    }

    /// Timeout of a single connect attempt (honoured by transports which support it)
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Pause between two polls of the control channel while waiting for a reply
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Time given to the server to flush after `ABOR`
    pub fn abort_delay(mut self, delay: Duration) -> Self {
        self.abort_delay = delay;
        self
    }

    /// How long to wait for the `226`/`250` completion reply once a transfer is closed
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Upper bound on the wait for a control reply. `None` waits forever
    pub fn reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Connect data channels to the control channel address instead of the one in the PASV
    /// reply; useful when the server sits behind NAT and advertises a private address.
    pub fn passive_nat_workaround(mut self, enabled: bool) -> Self {
        self.passive_nat_workaround = enabled;
        self
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn get_connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

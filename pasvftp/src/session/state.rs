//! # Operation state
//!
//! What a session is doing with its data channel

use std::fmt;

/// State of the operation running on a session. Exactly one is active at a time.
///
/// ```text
/// Idle --RETR/STOR/APPE/NLST--> Reading/Writing/Listing
/// Reading/Writing/Listing --data connection closed--> EndOfStream
/// Reading/Writing/Listing --abort--> Idle
/// EndOfStream --handle closed--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    Idle,
    Reading,
    Writing,
    Listing,
    EndOfStream,
}

impl OperationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a data transfer is in flight
    pub fn is_transferring(&self) -> bool {
        matches!(self, Self::Reading | Self::Writing | Self::Listing)
    }

    /// State once the data connection is found closed. Only a running transfer can end
    pub fn on_data_closed(self) -> Self {
        if self.is_transferring() {
            Self::EndOfStream
        } else {
            self
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Listing => "listing",
            Self::EndOfStream => "end of stream",
        };
        write!(f, "{name}")
    }
}

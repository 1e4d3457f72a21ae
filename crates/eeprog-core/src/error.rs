//! Error types for eeprog-core
//!
//! The programmer itself is open-loop: the shift-register protocol has no
//! failure feedback and host input validation errors are reported as text
//! on the serial line, not as `Err` values. The only faults that surface
//! through `Result` are transport-level ones.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The host side of the byte transport has gone away
    TransportClosed,
    /// Sending or receiving a byte failed
    TransportFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportClosed => write!(f, "transport closed by host"),
            Self::TransportFailed => write!(f, "transport I/O failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

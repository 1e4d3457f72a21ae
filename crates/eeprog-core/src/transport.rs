//! Byte transport abstraction
//!
//! The host link is a reliable, ordered, byte-at-a-time duplex stream;
//! on real hardware this is a UART, in the simulator it is stdio or a
//! scripted buffer. The interpreter never times out: `recv` blocks
//! forever on a stalled host.

use crate::error::Result;

/// Duplex byte stream to the host.
pub trait Transport {
    /// Send bytes, blocking until the line has accepted them.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive the next byte, blocking until one arrives.
    ///
    /// This is the command interpreter's only suspension point; while it
    /// is processing, arriving bytes queue up behind this call. An
    /// `Err(Error::TransportClosed)` means the host has gone away for
    /// good and unwinds the whole session.
    fn recv(&mut self) -> Result<u8>;
}

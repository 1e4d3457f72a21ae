//! Session mode tracking and bounded receive buffers
//!
//! The receive side's interpretation of an incoming byte depends
//! entirely on the current session mode, so the mode and both bounded
//! buffers live together in one struct. The byte-acceptance methods are
//! pure state-machine steps; the console feeds them from the blocking
//! transport only at its suspension points, so the receive path and the
//! command logic never touch the buffers at the same time.

use heapless::Vec;

/// Longest accepted command line, in data bytes (terminator excluded).
pub const MAX_LINE: usize = 31;

/// Payload buffer capacity: one full EEPROM page.
pub const MAX_PAYLOAD: usize = 64;

/// The interpreter's current interpretation context for incoming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Assembling command-line text.
    Command,
    /// Single-byte request/echo used by the diagnostic signal walk.
    RawEcho,
    /// Accumulating a fixed-size payload for the active write chunk.
    WriteCollect,
}

/// Outcome of feeding one byte into the line assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// More bytes expected.
    Pending,
    /// A carriage return completed the line.
    Complete,
}

/// Mode, command-line buffer and write-payload buffer for one session.
pub struct Session {
    mode: SessionMode,
    line: Vec<u8, MAX_LINE>,
    line_overflow: bool,
    payload: Vec<u8, MAX_PAYLOAD>,
    payload_target: usize,
}

impl Session {
    /// Fresh session in command mode with empty buffers.
    pub fn new() -> Self {
        Self {
            mode: SessionMode::Command,
            line: Vec::new(),
            line_overflow: false,
            payload: Vec::new(),
            payload_target: 0,
        }
    }

    /// Current session mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    fn set_mode(&mut self, mode: SessionMode) {
        log::debug!("session mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Feed one received byte while assembling a command line.
    ///
    /// A carriage return (0x0d) completes the line; a line feed is not
    /// part of the terminator and is treated as line data. Bytes past
    /// the buffer bound are dropped and flag the line as overlong.
    pub fn push_line_byte(&mut self, byte: u8) -> LineStatus {
        debug_assert_eq!(self.mode, SessionMode::Command);
        if byte == b'\r' {
            return LineStatus::Complete;
        }
        if self.line.push(byte).is_err() {
            self.line_overflow = true;
        }
        LineStatus::Pending
    }

    /// The assembled line so far.
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// Whether the current line exceeded [`MAX_LINE`].
    pub fn line_overflowed(&self) -> bool {
        self.line_overflow
    }

    /// Discard the current line after dispatch.
    pub fn clear_line(&mut self) {
        self.line.clear();
        self.line_overflow = false;
    }

    /// Enter payload collection for a chunk of `target` bytes.
    pub fn begin_collect(&mut self, target: usize) {
        debug_assert!(target >= 1 && target <= MAX_PAYLOAD);
        self.payload.clear();
        self.payload_target = target;
        self.set_mode(SessionMode::WriteCollect);
    }

    /// Feed one raw payload byte; returns true once the chunk target is
    /// reached.
    pub fn push_payload_byte(&mut self, byte: u8) -> bool {
        debug_assert_eq!(self.mode, SessionMode::WriteCollect);
        let _ = self.payload.push(byte);
        self.payload.len() >= self.payload_target
    }

    /// Leave payload collection, yielding the collected chunk.
    pub fn finish_collect(&mut self) -> &[u8] {
        self.set_mode(SessionMode::Command);
        &self.payload
    }

    /// Enter the diagnostic raw-echo mode.
    pub fn begin_raw_echo(&mut self) {
        self.set_mode(SessionMode::RawEcho);
    }

    /// Return from raw-echo to command mode.
    pub fn end_raw_echo(&mut self) {
        self.set_mode(SessionMode::Command);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

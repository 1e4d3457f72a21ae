//! EEPROM control protocol
//!
//! Sequences shift-register loads into read and write cycles on the
//! parallel EEPROM. The device's three control lines live in one flags
//! chain; a firmware-side mirror lets a strobe toggle a single line
//! without re-deriving the others. The mirror is owned exclusively by
//! [`Eeprom`] and is never read back from hardware.
//!
//! Bus-contention rule: the output-enable and write strobes must never be
//! active at the same time, otherwise the EEPROM and the data chain drive
//! the bus against each other. Write sessions keep outputs disabled for
//! their whole duration; read sessions release the write strobe before
//! enabling outputs.

pub mod protect;

use bitflags::bitflags;

use crate::board::BitbangBoard;
use crate::shiftreg::{self, Chain};

pub use protect::{SdpEntry, SDP_DISABLE, SDP_ENABLE};

bitflags! {
    /// Mirror of the control-flags shift register.
    ///
    /// Bit positions match the board wiring; all three lines are
    /// active-low except the read/not-write strobe, which is a strobe
    /// rather than a level (low = write cycle in progress).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// /OE - output enable. Set: data pins are device inputs.
        const OUTPUT_DISABLE = 1 << 0;
        /// R//W - read/not-write. Clear: write strobe active.
        const READ_NOT_WRITE = 1 << 1;
        /// /CE - chip enable. Set: device deselected.
        const CHIP_DISABLE = 1 << 2;
    }
}

/// Settling pause after every physical write burst, in milliseconds.
///
/// This is mandatory device write-cycle timing, not an optimization;
/// writing again before the pause elapses risks an incomplete write.
pub const WRITE_SETTLE_MS: u32 = 10;

/// Programmer-side view of the EEPROM behind the shift-register chains.
///
/// Owns the board and the control-flags mirror. All device access goes
/// through the session methods; the protocol is open-loop and none of
/// them can fail at runtime.
pub struct Eeprom<B: BitbangBoard> {
    board: B,
    flags: ControlFlags,
}

impl<B: BitbangBoard> Eeprom<B> {
    /// Take ownership of the board and drive the device into the
    /// disabled safe state.
    pub fn new(mut board: B) -> Self {
        let flags = ControlFlags::all();
        shiftreg::load(&mut board, Chain::Flags, &[flags.bits()]);
        Self { board, flags }
    }

    fn set_flags(&mut self, flags: ControlFlags) {
        self.flags = flags;
        shiftreg::load(&mut self.board, Chain::Flags, &[flags.bits()]);
    }

    fn load_address(&mut self, addr: u16) {
        shiftreg::load(&mut self.board, Chain::Address, &addr.to_le_bytes());
    }

    /// Begin a write session: chip selected, outputs disabled, strobe
    /// idle.
    ///
    /// Set once per session rather than per byte - re-driving /OE and
    /// /CE around every byte would be slower and would risk contention
    /// windows on the data bus.
    pub fn begin_write(&mut self) {
        log::debug!("write session start");
        self.set_flags(ControlFlags::OUTPUT_DISABLE | ControlFlags::READ_NOT_WRITE);
    }

    /// Write one byte at `addr`.
    ///
    /// Loads the address and data chains, then strobes read/not-write
    /// low and back high; the falling edge is what the device latches
    /// on. Callers are responsible for the settling pause after the
    /// burst this write belongs to.
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.load_address(addr);
        shiftreg::load(&mut self.board, Chain::Data, &[value]);
        self.set_flags(self.flags - ControlFlags::READ_NOT_WRITE);
        self.set_flags(self.flags | ControlFlags::READ_NOT_WRITE);
    }

    /// Begin a read session.
    ///
    /// The write strobe is released in a first flags load before /OE is
    /// asserted in a second one; folding both into one load could glitch
    /// the bus with both ends driving.
    pub fn begin_read(&mut self) {
        log::debug!("read session start");
        self.set_flags(ControlFlags::OUTPUT_DISABLE | ControlFlags::READ_NOT_WRITE);
        self.set_flags(ControlFlags::READ_NOT_WRITE);
    }

    /// Read one byte at `addr`. Requires an active read session.
    pub fn read_byte(&mut self, addr: u16) -> u8 {
        self.load_address(addr);
        shiftreg::capture_byte(&mut self.board)
    }

    /// Lazy byte stream over the inclusive range `start..=end`.
    ///
    /// Requires an active read session; bytes are captured one address
    /// at a time as the iterator is advanced.
    pub fn read_range(&mut self, start: u16, end: u16) -> ReadRange<'_, B> {
        ReadRange {
            eeprom: self,
            next: u32::from(start),
            end: u32::from(end),
        }
    }

    /// Replay a software data-protection sequence.
    ///
    /// The device recognizes these purely by their address/data pattern;
    /// each entry is an ordinary write. The sequence counts as one write
    /// burst and is followed by the settling pause.
    pub fn apply_protection(&mut self, table: &[SdpEntry]) {
        for entry in table {
            self.write_byte(entry.addr, entry.data);
        }
        self.settle();
    }

    /// Return the device to the disabled safe state (all lines
    /// released). Ends either kind of session.
    pub fn end_session(&mut self) {
        log::debug!("session end");
        self.set_flags(ControlFlags::all());
    }

    /// Block for the mandatory write-cycle settling pause.
    pub fn settle(&mut self) {
        self.board.delay_ms(WRITE_SETTLE_MS);
    }

    /// Drive a single control line to its active level from the safe
    /// state. Diagnostic use only.
    pub fn drive_low(&mut self, line: ControlFlags) {
        self.set_flags(ControlFlags::all() - line);
    }

    /// Shared access to the underlying board.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Give the board back, leaving the device in the safe state.
    pub fn into_board(mut self) -> B {
        self.end_session();
        self.board
    }
}

/// Lazy byte stream over an inclusive address range.
pub struct ReadRange<'a, B: BitbangBoard> {
    eeprom: &'a mut Eeprom<B>,
    next: u32,
    end: u32,
}

impl<B: BitbangBoard> Iterator for ReadRange<'_, B> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.next > self.end {
            return None;
        }
        let byte = self.eeprom.read_byte(self.next as u16);
        self.next += 1;
        Some(byte)
    }
}

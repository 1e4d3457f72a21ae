//! Shift-register chain serialization
//!
//! The board exposes three independent serial-in/parallel-out chains and
//! one parallel-in/serial-out input register. This module is the only
//! mechanism for changing any externally visible EEPROM control, address
//! or data line: bytes are shifted in LSB first, one bit per shift-clock
//! pulse, and the latch clock transfers the shifted bits atomically into
//! the chain's output register.

use crate::board::BitbangBoard;

/// Identifies one of the three output shift-register chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    /// Control flags chain (/OE, R//W, /CE); only 3 bits are wired.
    Flags,
    /// 16-bit address chain (two cascaded 8-bit registers).
    Address,
    /// 8-bit data chain.
    Data,
}

impl Chain {
    /// Number of bits shifted per byte into this chain.
    pub fn bits_per_byte(self) -> u8 {
        match self {
            Chain::Flags => 3,
            Chain::Address | Chain::Data => 8,
        }
    }
}

/// Serialize `bytes` into `chain` and latch the result.
///
/// For each byte, bits are emitted from least-significant up to the
/// chain's width. The serial line is returned low before the single
/// latch pulse, so the chain outputs change exactly once per call.
pub fn load<B: BitbangBoard + ?Sized>(board: &mut B, chain: Chain, bytes: &[u8]) {
    for &byte in bytes {
        for bit in 0..chain.bits_per_byte() {
            board.set_serial(chain, byte & (1 << bit) != 0);
            board.pulse_shift_clock(chain);
        }
    }
    board.set_serial(chain, false);
    board.pulse_latch_clock(chain);
    log::trace!("loaded {} byte(s) into {:?} chain", bytes.len(), chain);
}

/// Capture one byte from the input shift register.
///
/// The register samples the EEPROM data pins while its load line is
/// asserted; one clock with load deasserted moves the captured bits into
/// the output stage, after which eight samples (LSB first) each followed
/// by a clock pulse assemble the byte.
pub fn capture_byte<B: BitbangBoard + ?Sized>(board: &mut B) -> u8 {
    board.set_read_load(true);
    board.pulse_read_clock();
    board.set_read_load(false);
    board.pulse_read_clock();

    let mut byte = 0u8;
    for bit in 0..8 {
        if board.read_bit() {
            byte |= 1 << bit;
        }
        board.pulse_read_clock();
    }
    byte
}

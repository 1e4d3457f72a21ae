//! Board abstraction for the bit-banged shift-register wiring
//!
//! Implementations map these operations onto GPIO writes for the three
//! output chains (3-wire each: serial-data, shift-clock, latch-clock) and
//! the parallel-in input register used for reading the EEPROM data bus.
//! Pin/port configuration, clock setup and the like happen before an
//! implementation is handed to this crate and are not modeled here.

use crate::shiftreg::Chain;

/// Low-level pin operations for one programmer board.
///
/// All clock inputs are rising-edge; `pulse_*` helpers produce a full
/// assert/deassert cycle. There are no error conditions at this level -
/// the only way these operations go wrong is miswired constants in the
/// implementation.
pub trait BitbangBoard {
    /// Set the serial-data line of `chain`.
    fn set_serial(&mut self, chain: Chain, high: bool);

    /// Set the shift-clock line of `chain`.
    fn set_shift_clock(&mut self, chain: Chain, high: bool);

    /// Set the latch-clock line of `chain`.
    fn set_latch_clock(&mut self, chain: Chain, high: bool);

    /// Set the parallel-load line of the input shift register.
    fn set_read_load(&mut self, high: bool);

    /// Set the clock line of the input shift register.
    fn set_read_clock(&mut self, high: bool);

    /// Sample the serial output of the input shift register.
    fn read_bit(&self) -> bool;

    /// Block for `ms` milliseconds.
    ///
    /// Used for the mandatory write-cycle settling pause; nothing else
    /// runs during the delay.
    fn delay_ms(&mut self, ms: u32);

    /// Shift one bit into `chain` (assert then deassert the shift clock).
    fn pulse_shift_clock(&mut self, chain: Chain) {
        self.set_shift_clock(chain, true);
        self.set_shift_clock(chain, false);
    }

    /// Transfer the shifted bits of `chain` into its output register.
    fn pulse_latch_clock(&mut self, chain: Chain) {
        self.set_latch_clock(chain, true);
        self.set_latch_clock(chain, false);
    }

    /// Clock the input shift register once.
    fn pulse_read_clock(&mut self) {
        self.set_read_clock(true);
        self.set_read_clock(false);
    }
}

//! eeprog-dummy - In-memory board and EEPROM emulator for testing
//!
//! This crate implements [`BitbangBoard`] on top of an emulated wiring
//! harness: three serial-in/parallel-out chains, a two-stage parallel-in
//! input register, and an AT28C-style EEPROM array behind them. It
//! decodes the pin-level protocol the core drives, so tests and the
//! host-side simulator exercise the real bit-banging paths without
//! hardware.
//!
//! The emulated device recognizes the software data-protection magic
//! sequences, ignores array writes while protected, and records enough
//! history (committed writes, attempts, delays, contention) for tests to
//! assert on.

use eeprog_core::board::BitbangBoard;
use eeprog_core::eeprom::{SdpEntry, SDP_DISABLE, SDP_ENABLE};
use eeprog_core::shiftreg::Chain;

/// Configuration for the emulated device.
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Memory array size in bytes.
    pub size: usize,
    /// Whether software data protection starts enabled.
    pub protected: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: 32 * 1024, // AT28C256
            protected: true,
        }
    }
}

/// One serial-in/parallel-out chain: shift stage plus latched outputs.
#[derive(Debug, Clone, Copy)]
struct ChainState {
    width: u32,
    shift: u32,
    latch: u32,
    serial: bool,
    shift_clock: bool,
    latch_clock: bool,
}

impl ChainState {
    fn new(width: u32, latch: u32) -> Self {
        Self {
            width,
            shift: 0,
            latch,
            serial: false,
            shift_clock: false,
            latch_clock: false,
        }
    }

    /// Rising shift-clock edge: serial data enters at the top, everything
    /// else moves one position toward the output end.
    fn clock_in(&mut self) {
        self.shift >>= 1;
        if self.serial {
            self.shift |= 1 << (self.width - 1);
        }
    }
}

/// Tracks progress through one data-protection magic sequence.
#[derive(Debug, Clone, Copy)]
struct SdpMatcher {
    table: &'static [SdpEntry],
    progress: usize,
}

impl SdpMatcher {
    fn new(table: &'static [SdpEntry]) -> Self {
        Self { table, progress: 0 }
    }

    /// Advance on a matching write; returns true when the full sequence
    /// has been observed.
    fn observe(&mut self, addr: u16, data: u8) -> bool {
        let expected = self.table[self.progress];
        if addr == expected.addr && data == expected.data {
            self.progress += 1;
        } else {
            self.progress = 0;
            let first = self.table[0];
            if addr == first.addr && data == first.data {
                self.progress = 1;
            }
        }
        if self.progress == self.table.len() {
            self.progress = 0;
            return true;
        }
        false
    }

    fn advanced(&self) -> bool {
        self.progress > 0
    }

    fn reset(&mut self) {
        self.progress = 0;
    }
}

/// Emulated programmer board with an EEPROM behind the chains.
pub struct DummyBoard {
    chains: [ChainState; 3],
    memory: Vec<u8>,
    sdp_enabled: bool,
    disable_seq: SdpMatcher,
    enable_seq: SdpMatcher,
    prev_flags: u8,
    // two-stage input register
    read_load: bool,
    read_clock: bool,
    read_stage: u8,
    read_shift: u8,
    read_transferred: bool,
    committed: Vec<(u16, u8)>,
    attempts: Vec<(u16, u8)>,
    delays: Vec<u32>,
    contention: bool,
}

// ControlFlags wiring on the flags chain, all as latched bit positions.
const OUTPUT_DISABLE: u8 = 1 << 0;
const READ_NOT_WRITE: u8 = 1 << 1;
const CHIP_DISABLE: u8 = 1 << 2;
const FLAGS_IDLE: u8 = OUTPUT_DISABLE | READ_NOT_WRITE | CHIP_DISABLE;

impl DummyBoard {
    /// New emulated board with the given configuration, memory erased
    /// to 0xff.
    pub fn new(config: DummyConfig) -> Self {
        Self {
            chains: [
                ChainState::new(3, u32::from(FLAGS_IDLE)),
                ChainState::new(16, 0),
                ChainState::new(8, 0),
            ],
            memory: vec![0xff; config.size],
            sdp_enabled: config.protected,
            disable_seq: SdpMatcher::new(SDP_DISABLE),
            enable_seq: SdpMatcher::new(SDP_ENABLE),
            prev_flags: FLAGS_IDLE,
            read_load: false,
            read_clock: false,
            read_stage: 0,
            read_shift: 0,
            read_transferred: false,
            committed: Vec::new(),
            attempts: Vec::new(),
            delays: Vec::new(),
            contention: false,
        }
    }

    /// New board with the default configuration (32 KiB, protected).
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// New board with `data` preloaded at address zero.
    pub fn with_data(config: DummyConfig, data: &[u8]) -> Self {
        let mut board = Self::new(config);
        board.memory[..data.len()].copy_from_slice(data);
        board
    }

    fn chain_mut(&mut self, chain: Chain) -> &mut ChainState {
        &mut self.chains[chain_index(chain)]
    }

    fn flags(&self) -> u8 {
        self.chains[chain_index(Chain::Flags)].latch as u8 & 0b111
    }

    fn address(&self) -> u16 {
        self.chains[chain_index(Chain::Address)].latch as u16
    }

    fn data(&self) -> u8 {
        self.chains[chain_index(Chain::Data)].latch as u8
    }

    /// React to a newly latched flags value: contention check and write
    /// strobe edges.
    fn flags_updated(&mut self) {
        let flags = self.flags();
        let oe_active = flags & OUTPUT_DISABLE == 0;
        let strobe_active = flags & READ_NOT_WRITE == 0;
        if oe_active && strobe_active {
            log::error!("bus contention: /OE and write strobe both active");
            self.contention = true;
        }
        // device latches the write on the falling strobe edge
        let falling = self.prev_flags & READ_NOT_WRITE != 0 && strobe_active;
        if falling && flags & CHIP_DISABLE == 0 {
            self.handle_write(self.address(), self.data());
        }
        self.prev_flags = flags;
    }

    fn handle_write(&mut self, addr: u16, data: u8) {
        self.attempts.push((addr, data));
        let disabled = self.disable_seq.observe(addr, data);
        let enabled = self.enable_seq.observe(addr, data);
        if disabled {
            log::debug!("data protection disabled");
            self.sdp_enabled = false;
            self.enable_seq.reset();
            return;
        }
        if enabled {
            log::debug!("data protection enabled");
            self.sdp_enabled = true;
            self.disable_seq.reset();
            return;
        }
        // in-progress magic writes are consumed by the device, not stored
        if self.disable_seq.advanced() || self.enable_seq.advanced() {
            return;
        }
        if self.sdp_enabled {
            log::debug!("ignoring write to 0x{:04x} while protected", addr);
            return;
        }
        let index = usize::from(addr) % self.memory.len();
        self.memory[index] = data;
        self.committed.push((addr, data));
    }

    /// What the EEPROM drives onto the data bus right now. Floating bus
    /// reads as 0xff.
    fn bus_byte(&self) -> u8 {
        let flags = self.flags();
        if flags & CHIP_DISABLE == 0 && flags & OUTPUT_DISABLE == 0 {
            self.memory[usize::from(self.address()) % self.memory.len()]
        } else {
            0xff
        }
    }

    /// The memory array.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable access to the memory array, for preloading images.
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Writes that actually changed the array, in order.
    pub fn committed_writes(&self) -> &[(u16, u8)] {
        &self.committed
    }

    /// Every observed write strobe, including magic-sequence and
    /// protected writes.
    pub fn write_attempts(&self) -> &[(u16, u8)] {
        &self.attempts
    }

    /// Whether software data protection is currently enabled.
    pub fn is_protected(&self) -> bool {
        self.sdp_enabled
    }

    /// Whether /OE and the write strobe were ever active together.
    pub fn had_contention(&self) -> bool {
        self.contention
    }

    /// Recorded settling delays, in order.
    pub fn delays(&self) -> &[u32] {
        &self.delays
    }
}

fn chain_index(chain: Chain) -> usize {
    match chain {
        Chain::Flags => 0,
        Chain::Address => 1,
        Chain::Data => 2,
    }
}

impl BitbangBoard for DummyBoard {
    fn set_serial(&mut self, chain: Chain, high: bool) {
        self.chain_mut(chain).serial = high;
    }

    fn set_shift_clock(&mut self, chain: Chain, high: bool) {
        let state = self.chain_mut(chain);
        let rising = !state.shift_clock && high;
        state.shift_clock = high;
        if rising {
            state.clock_in();
        }
    }

    fn set_latch_clock(&mut self, chain: Chain, high: bool) {
        let state = self.chain_mut(chain);
        let rising = !state.latch_clock && high;
        state.latch_clock = high;
        if rising {
            state.latch = state.shift;
            if chain == Chain::Flags {
                self.flags_updated();
            }
        }
    }

    fn set_read_load(&mut self, high: bool) {
        if high && !self.read_load {
            self.read_transferred = false;
        }
        self.read_load = high;
    }

    fn set_read_clock(&mut self, high: bool) {
        let rising = !self.read_clock && high;
        self.read_clock = high;
        if !rising {
            return;
        }
        if self.read_load {
            // capture stage samples the bus while load is asserted
            self.read_stage = self.bus_byte();
        } else if !self.read_transferred {
            self.read_shift = self.read_stage;
            self.read_transferred = true;
        } else {
            self.read_shift >>= 1;
        }
    }

    fn read_bit(&self) -> bool {
        self.read_shift & 1 != 0
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

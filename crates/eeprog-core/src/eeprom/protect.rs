//! Software data-protection sequences
//!
//! Atmel-style parallel EEPROMs toggle their internal write protection
//! when they observe a fixed series of byte writes to magic addresses;
//! there is no dedicated protocol support, the device recognizes the
//! address/data pattern by itself. The tables below are the AT28C-family
//! values.
//!
//! The tables are plain slices - the length is carried by the slice
//! itself, so no sentinel entry is needed.

/// One entry of a data-protection sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdpEntry {
    /// Magic address to write to.
    pub addr: u16,
    /// Byte value to write.
    pub data: u8,
}

const fn entry(addr: u16, data: u8) -> SdpEntry {
    SdpEntry { addr, data }
}

/// Disables software data protection (unlocks the device for writing).
pub const SDP_DISABLE: &[SdpEntry] = &[
    entry(0x5555, 0xaa),
    entry(0x2aaa, 0x55),
    entry(0x5555, 0x80),
    entry(0x5555, 0xaa),
    entry(0x2aaa, 0x55),
    entry(0x5555, 0x20),
];

/// Re-enables software data protection after a write session.
pub const SDP_ENABLE: &[SdpEntry] = &[
    entry(0x5555, 0xaa),
    entry(0x2aaa, 0x55),
    entry(0x5555, 0xa0),
];

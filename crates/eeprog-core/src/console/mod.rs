//! Serial command console
//!
//! Pulls bytes from a blocking [`Transport`], assembles command lines,
//! and drives the EEPROM protocol. The console owns all session state;
//! the transport is touched only at well-defined suspension points
//! (line assembly, payload collection, the diagnostic signal walk), so
//! the receive side and the command logic never run at the same time.

mod parser;
mod session;

pub use parser::{Command, ParseError, Verb};
pub use session::{LineStatus, Session, SessionMode, MAX_LINE, MAX_PAYLOAD};

use core::fmt::Write as _;

use heapless::String;

use crate::board::BitbangBoard;
use crate::eeprom::{ControlFlags, Eeprom, SDP_DISABLE, SDP_ENABLE};
use crate::transport::Transport;
use crate::Result;

/// EEPROM physical page size in bytes. Paged writes never cross a
/// boundary of this size.
pub const PAGE_SIZE: u16 = 64;

const PROMPT: &[u8] = b"ready>";

const VERSION_LINE: &str = concat!("eeprog ", env!("CARGO_PKG_VERSION"), "\r\n");

const HELP_TEXT: &str = "\
help: this help information\r\n\
version: firmware name and version\r\n\
echo {on,off}: display, enable, disable echo\r\n\
read 0xabcd 0xef01: read bytes from start to end addr, inclusive\r\n\
write 0xabcd 0xef01: write bytes from start to end addr, inclusive\r\n\
page_write {on,off}: display, enable, disable paged writes\r\n\
eeprom_lock {on,off}: display, enable, disable software data protection\r\n\
test: drive each control line low in turn, advancing per received byte\r\n";

/// Control lines probed by the `test` command, in walk order.
const PROBES: &[(&str, ControlFlags)] = &[
    ("/OE", ControlFlags::OUTPUT_DISABLE),
    ("R//W", ControlFlags::READ_NOT_WRITE),
    ("/CE", ControlFlags::CHIP_DISABLE),
];

/// Chunk size for the next write round starting at `addr` with
/// `remaining` bytes left. Paged chunks stop at the next page boundary.
fn chunk_len(addr: u16, remaining: u32, paged: bool) -> u32 {
    if !paged {
        return 1;
    }
    u32::from(PAGE_SIZE - addr % PAGE_SIZE).min(remaining)
}

/// The command interpreter: one EEPROM, one host connection.
pub struct Console<B: BitbangBoard, T: Transport> {
    eeprom: Eeprom<B>,
    wire: T,
    session: Session,
    echo: bool,
    page_write: bool,
    lock: bool,
}

impl<B: BitbangBoard, T: Transport> Console<B, T> {
    /// New console with echo, paged writes and lock handling all
    /// enabled. Drives the device to its safe state.
    pub fn new(board: B, wire: T) -> Self {
        Self {
            eeprom: Eeprom::new(board),
            wire,
            session: Session::new(),
            echo: true,
            page_write: true,
            lock: true,
        }
    }

    /// Run the prompt/dispatch loop until the transport fails.
    pub fn run(&mut self) -> Result<()> {
        self.wire.send(b"\r\n")?;
        loop {
            self.wire.send(PROMPT)?;
            self.collect_line()?;
            self.dispatch()?;
            self.session.clear_line();
        }
    }

    /// Tear the console down, returning the device and the transport.
    pub fn into_parts(self) -> (Eeprom<B>, T) {
        (self.eeprom, self.wire)
    }

    /// Assemble one command line, mirroring bytes when echo is on. The
    /// terminating carriage return is echoed as a full line break.
    fn collect_line(&mut self) -> Result<()> {
        loop {
            let byte = self.wire.recv()?;
            match self.session.push_line_byte(byte) {
                LineStatus::Complete => {
                    if self.echo {
                        self.wire.send(b"\r\n")?;
                    }
                    return Ok(());
                }
                LineStatus::Pending => {
                    if self.echo {
                        self.wire.send(&[byte])?;
                    }
                }
            }
        }
    }

    fn dispatch(&mut self) -> Result<()> {
        if self.session.line_overflowed() {
            log::warn!("dropping overlong command line");
            return self.send_error(ParseError::LineTooLong);
        }
        if self.session.line().is_empty() {
            return Ok(());
        }
        match parser::parse(self.session.line()) {
            Ok(cmd) => self.exec(cmd),
            Err(err) => self.send_error(err),
        }
    }

    fn send_error(&mut self, err: ParseError) -> Result<()> {
        let mut msg = String::<80>::new();
        let _ = write!(msg, "{}\r\n", err);
        self.send_str(&msg)
    }

    fn exec(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Echo(Some(on)) => {
                self.echo = on;
                Ok(())
            }
            Command::Echo(None) => self.report_mode("echo", self.echo),
            Command::PageWrite(Some(on)) => {
                self.page_write = on;
                Ok(())
            }
            Command::PageWrite(None) => self.report_mode("page_write", self.page_write),
            Command::EepromLock(Some(on)) => {
                self.lock = on;
                Ok(())
            }
            Command::EepromLock(None) => self.report_mode("eeprom_lock", self.lock),
            Command::Read { start, end } => self.cmd_read(start, end),
            Command::Write { start, end } => self.cmd_write(start, end),
            Command::Help => self.send_str(HELP_TEXT),
            Command::Version => self.send_str(VERSION_LINE),
            Command::Test => self.cmd_test(),
        }
    }

    fn report_mode(&mut self, name: &str, value: bool) -> Result<()> {
        let mut msg = String::<64>::new();
        let _ = write!(
            msg,
            "Current {} mode: {} ({})\r\n",
            name,
            value as u8,
            if value { "true" } else { "false" }
        );
        self.send_str(&msg)
    }

    /// Stream the inclusive range as bare hex pairs, then return the
    /// device to its safe state. No other output is produced.
    fn cmd_read(&mut self, start: u16, end: u16) -> Result<()> {
        log::info!("read 0x{:04x}..=0x{:04x}", start, end);
        self.eeprom.begin_read();
        let mut result = Ok(());
        for value in self.eeprom.read_range(start, end) {
            let mut hex = String::<2>::new();
            let _ = write!(hex, "{:02x}", value);
            if let Err(err) = self.wire.send(hex.as_bytes()) {
                result = Err(err);
                break;
            }
        }
        self.eeprom.end_session();
        result
    }

    fn cmd_write(&mut self, start: u16, end: u16) -> Result<()> {
        log::info!(
            "write 0x{:04x}..=0x{:04x} paged={} lock={}",
            start,
            end,
            self.page_write,
            self.lock
        );
        let end = u32::from(end);
        let mut addr = u32::from(start);

        let mut msg = String::<64>::new();
        let _ = write!(msg, "Start addr: {:04x} ({})\r\n", addr, addr);
        self.send_str(&msg)?;
        msg.clear();
        let _ = write!(msg, "End addr: {:04x} ({})\r\n", end, end);
        self.send_str(&msg)?;
        msg.clear();
        let _ = write!(msg, "Total bytes to write: {}\r\n", end - addr + 1);
        self.send_str(&msg)?;

        self.eeprom.begin_write();
        if self.lock {
            self.eeprom.apply_protection(SDP_DISABLE);
        }

        let mut result = Ok(());
        'chunks: while addr <= end {
            let remaining = end - addr + 1;
            let chunk = chunk_len(addr as u16, remaining, self.page_write);

            msg.clear();
            let _ = write!(msg, "Send {} bytes, {} remaining...\r\n", chunk, remaining);
            if let Err(err) = self.wire.send(msg.as_bytes()) {
                result = Err(err);
                break;
            }

            self.session.begin_collect(chunk as usize);
            loop {
                match self.wire.recv() {
                    Ok(byte) => {
                        if self.session.push_payload_byte(byte) {
                            break;
                        }
                    }
                    Err(err) => {
                        result = Err(err);
                        self.session.finish_collect();
                        break 'chunks;
                    }
                }
            }
            let payload = self.session.finish_collect();
            for (offset, &value) in payload.iter().enumerate() {
                self.eeprom.write_byte((addr + offset as u32) as u16, value);
            }
            addr += chunk;
            self.eeprom.settle();
        }

        if result.is_ok() && self.lock {
            self.eeprom.apply_protection(SDP_ENABLE);
        }
        self.eeprom.end_session();
        result
    }

    /// Walk the control lines one at a time for probing with a meter.
    /// Each probe holds its line active until the host sends a byte;
    /// the byte is echoed back as the acknowledgement.
    fn cmd_test(&mut self) -> Result<()> {
        let mut result = Ok(());
        for &(name, line) in PROBES {
            let mut msg = String::<64>::new();
            let _ = write!(msg, "Driving {} low, send a byte to advance\r\n", name);
            if let Err(err) = self.wire.send(msg.as_bytes()) {
                result = Err(err);
                break;
            }
            self.eeprom.drive_low(line);
            self.session.begin_raw_echo();
            let ack = self.wire.recv();
            self.session.end_raw_echo();
            match ack {
                Ok(byte) => {
                    if let Err(err) = self.wire.send(&[byte]) {
                        result = Err(err);
                        break;
                    }
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.eeprom.end_session();
        result
    }

    fn send_str(&mut self, s: &str) -> Result<()> {
        self.wire.send(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaged_chunks_are_single_bytes() {
        assert_eq!(chunk_len(0x0000, 100, false), 1);
        assert_eq!(chunk_len(0x003f, 100, false), 1);
    }

    #[test]
    fn first_chunk_reaches_the_next_boundary() {
        assert_eq!(chunk_len(0x0000, 1000, true), 64);
        assert_eq!(chunk_len(0x0001, 1000, true), 63);
        assert_eq!(chunk_len(0x003f, 1000, true), 1);
        assert_eq!(chunk_len(0x0040, 1000, true), 64);
    }

    #[test]
    fn chunks_clamp_to_the_remaining_range() {
        assert_eq!(chunk_len(0x0000, 10, true), 10);
        assert_eq!(chunk_len(0x003e, 3, true), 2);
    }

    #[test]
    fn chunk_sequence_covers_any_range_without_crossing_pages() {
        for &(start, end) in &[(0u32, 0u32), (5, 200), (60, 68), (0x3f, 0x40), (100, 100)] {
            let mut addr = start;
            let mut total = 0u32;
            while addr <= end {
                let chunk = chunk_len(addr as u16, end - addr + 1, true);
                assert!(chunk >= 1);
                let first_page = addr / u32::from(PAGE_SIZE);
                let last_page = (addr + chunk - 1) / u32::from(PAGE_SIZE);
                assert_eq!(first_page, last_page);
                addr += chunk;
                total += chunk;
            }
            assert_eq!(total, end - start + 1);
        }
    }
}

//! Host-protocol scenario tests: a scripted serial host driving the full
//! console / EEPROM / bit-bang stack against the emulated board.

use std::collections::VecDeque;

use eeprog_core::console::Console;
use eeprog_core::eeprom::{SDP_DISABLE, SDP_ENABLE};
use eeprog_core::transport::Transport;
use eeprog_core::Error;
use eeprog_dummy::{DummyBoard, DummyConfig};

/// Transport fed from a pre-recorded host script. Once the script is
/// exhausted, `recv` reports the host as gone, which unwinds the run
/// loop.
struct ScriptedWire {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ScriptedWire {
    fn new(script: &[u8]) -> Self {
        Self {
            input: script.iter().copied().collect(),
            output: Vec::new(),
        }
    }
}

impl Transport for ScriptedWire {
    fn send(&mut self, data: &[u8]) -> eeprog_core::Result<()> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn recv(&mut self) -> eeprog_core::Result<u8> {
        self.input.pop_front().ok_or(Error::TransportClosed)
    }
}

/// Run the console over `script` until the script runs out, returning
/// the board for state assertions and everything the host received.
fn run_script(board: DummyBoard, script: &[u8]) -> (DummyBoard, Vec<u8>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut console = Console::new(board, ScriptedWire::new(script));
    assert_eq!(console.run(), Err(Error::TransportClosed));
    let (eeprom, wire) = console.into_parts();
    let board = eeprom.into_board();
    assert!(!board.had_contention(), "bus contention during scenario");
    (board, wire.output)
}

fn unprotected() -> DummyBoard {
    DummyBoard::new(DummyConfig {
        protected: false,
        ..DummyConfig::default()
    })
}

fn output_str(output: &[u8]) -> String {
    String::from_utf8_lossy(output).into_owned()
}

#[test]
fn read_streams_bare_hex_then_prompt() {
    let board = DummyBoard::with_data(DummyConfig::default(), &[0x11, 0x22, 0x33]);
    let (_, output) = run_script(board, b"echo off\rread 0x0000 0x0002\r");
    // with echo off the read response is exactly the hex stream
    assert_eq!(output, b"\r\nready>echo off\r\nready>112233ready>");
}

#[test]
fn single_byte_read() {
    let mut board = DummyBoard::new_default();
    board.memory_mut()[5] = 0x7a;
    let (_, output) = run_script(board, b"echo off\rread 0x0005 0x0005\r");
    assert_eq!(output, b"\r\nready>echo off\r\nready>7aready>");
}

#[test]
fn echo_mirrors_received_bytes_by_default() {
    let (_, output) = run_script(DummyBoard::new_default(), b"help\r");
    let text = output_str(&output);
    // the typed command comes back, CR expanded to a full line break
    assert!(text.contains("ready>help\r\n"));
    assert!(text.contains("help: this help information\r\n"));
}

#[test]
fn unpaged_write_round() {
    let script = b"echo off\rpage_write off\rwrite 0x0000 0x0001\r\xaa\xbb";
    let (board, output) = run_script(unprotected(), script);
    assert_eq!(board.committed_writes(), [(0x0000, 0xaa), (0x0001, 0xbb)]);
    assert_eq!(board.memory()[..2], [0xaa, 0xbb]);
    let text = output_str(&output);
    assert!(text.contains("Total bytes to write: 2\r\n"));
    assert!(text.contains("Send 1 bytes, 2 remaining...\r\n"));
    assert!(text.contains("Send 1 bytes, 1 remaining...\r\n"));
    assert!(text.ends_with("ready>"));
    // SDP unlock, two one-byte bursts, SDP relock: four settling pauses
    assert_eq!(board.delays(), [10, 10, 10, 10]);
}

#[test]
fn paged_write_chunks_align_to_page_boundaries() {
    let script = b"echo off\reeprom_lock off\rwrite 0x003e 0x0041\r\x01\x02\x03\x04";
    let (board, output) = run_script(unprotected(), script);
    let text = output_str(&output);
    assert!(text.contains("Send 2 bytes, 4 remaining...\r\n"));
    assert!(text.contains("Send 2 bytes, 2 remaining...\r\n"));
    assert_eq!(
        board.committed_writes(),
        [(0x003e, 1), (0x003f, 2), (0x0040, 3), (0x0041, 4)]
    );
    // one settle per chunk, none for protection handling
    assert_eq!(board.delays(), [10, 10]);
}

#[test]
fn lock_mode_wraps_the_write_in_protection_sequences() {
    let script = b"echo off\rpage_write off\rwrite 0x0010 0x0011\r\x55\x66";
    let (board, _) = run_script(DummyBoard::new_default(), script);
    assert_eq!(board.committed_writes(), [(0x0010, 0x55), (0x0011, 0x66)]);
    assert!(board.is_protected(), "relocked after the session");

    let attempts = board.write_attempts();
    assert_eq!(attempts.len(), SDP_DISABLE.len() + 2 + SDP_ENABLE.len());
    for (attempt, entry) in attempts.iter().zip(SDP_DISABLE) {
        assert_eq!(*attempt, (entry.addr, entry.data));
    }
    let tail = &attempts[attempts.len() - SDP_ENABLE.len()..];
    for (attempt, entry) in tail.iter().zip(SDP_ENABLE) {
        assert_eq!(*attempt, (entry.addr, entry.data));
    }
}

#[test]
fn lock_disabled_leaves_protected_memory_untouched() {
    let script = b"echo off\reeprom_lock off\rpage_write off\rwrite 0x0000 0x0000\r\x42";
    let (board, _) = run_script(DummyBoard::new_default(), script);
    assert!(board.committed_writes().is_empty());
    assert_eq!(board.memory()[0], 0xff);
    assert_eq!(board.write_attempts(), [(0x0000, 0x42)]);
}

#[test]
fn read_commands_never_touch_protection() {
    let (board, _) = run_script(
        DummyBoard::with_data(DummyConfig::default(), &[0xab]),
        b"echo off\rread 0x0000 0x0000\r",
    );
    assert!(board.write_attempts().is_empty());
    assert!(board.is_protected());
}

#[test]
fn inverted_write_range_is_rejected_without_side_effects() {
    let (board, output) = run_script(unprotected(), b"echo off\rwrite 0x0002 0x0001\r");
    let text = output_str(&output);
    assert!(text.contains("Invalid write command: start-addr > end-addr\r\n"));
    assert!(!text.contains("Send"));
    assert!(board.write_attempts().is_empty());
    assert!(board.delays().is_empty());
}

#[test]
fn malformed_commands_report_and_reprompt() {
    let script = b"echo off\rread 0x0 0x1\rread 0xzzzz 0x0001\rread 0x0000 0xqqqq\rbogus\r";
    let (board, output) = run_script(DummyBoard::new_default(), script);
    let text = output_str(&output);
    assert!(text.contains("Invalid read command: wrong length: 12, expecting 18\r\n"));
    assert!(text.contains("Invalid read command: cannot parse start addr\r\n"));
    assert!(text.contains("Invalid read command: cannot parse end addr\r\n"));
    assert!(text.contains("Invalid command\r\n"));
    assert!(board.write_attempts().is_empty());
}

#[test]
fn page_suffix_variant_is_not_accepted() {
    let (_, output) = run_script(unprotected(), b"echo off\rwrite 0x0000 0x00ff nopage\r");
    let text = output_str(&output);
    assert!(text.contains("Invalid write command: wrong length: 26, expecting 19\r\n"));
}

#[test]
fn empty_line_silently_reprompts() {
    let (_, output) = run_script(DummyBoard::new_default(), b"echo off\r\r\r");
    assert_eq!(output, b"\r\nready>echo off\r\nready>ready>ready>");
}

#[test]
fn overlong_line_is_dropped_with_a_diagnostic() {
    let mut script = Vec::new();
    script.extend_from_slice(b"echo off\r");
    script.extend_from_slice(&[b'x'; 60]);
    script.push(b'\r');
    let (board, output) = run_script(DummyBoard::new_default(), &script);
    let text = output_str(&output);
    assert!(text.contains("Invalid command: line too long\r\n"));
    assert!(board.write_attempts().is_empty());
}

#[test]
fn toggles_are_idempotent_and_reports_do_not_mutate() {
    let script = b"echo off\recho off\recho\recho\rpage_write off\rpage_write\r";
    let (_, output) = run_script(DummyBoard::new_default(), script);
    let text = output_str(&output);
    assert_eq!(text.matches("Current echo mode: 0 (false)\r\n").count(), 2);
    assert!(text.contains("Current page_write mode: 0 (false)\r\n"));
}

#[test]
fn mode_reports_show_enabled_defaults() {
    let script = b"echo off\rpage_write\reeprom_lock\r";
    let (_, output) = run_script(DummyBoard::new_default(), script);
    let text = output_str(&output);
    assert!(text.contains("Current page_write mode: 1 (true)\r\n"));
    assert!(text.contains("Current eeprom_lock mode: 1 (true)\r\n"));
}

#[test]
fn version_reports_name_and_crate_version() {
    let (_, output) = run_script(DummyBoard::new_default(), b"echo off\rversion\r");
    let text = output_str(&output);
    assert!(text.contains(concat!("eeprog ", env!("CARGO_PKG_VERSION"), "\r\n")));
}

#[test]
fn signal_walk_probes_each_control_line() {
    let (board, output) = run_script(DummyBoard::new_default(), b"echo off\rtest\rxyz");
    let text = output_str(&output);
    assert!(text.contains("Driving /OE low, send a byte to advance\r\n"));
    assert!(text.contains("Driving R//W low, send a byte to advance\r\n"));
    assert!(text.contains("Driving /CE low, send a byte to advance\r\n"));
    // each advance byte is echoed back as the acknowledgement
    let oe = text.find("Driving /OE").unwrap();
    let rw = text.find("Driving R//W").unwrap();
    let ce = text.find("Driving /CE").unwrap();
    assert!(oe < rw && rw < ce);
    assert!(text[rw..].starts_with("Driving R//W low, send a byte to advance\r\n"));
    assert!(text.contains('x') && text.contains('y') && text.contains('z'));
    // walking the strobe never fires a write: the chip stays deselected
    assert!(board.write_attempts().is_empty());
}

#[test]
fn write_survives_into_a_following_read() {
    let script =
        b"echo off\rpage_write off\rwrite 0x0100 0x0101\r\xde\xadread 0x0100 0x0101\r";
    let (board, output) = run_script(unprotected(), script);
    assert_eq!(board.memory()[0x0100..0x0102], [0xde, 0xad]);
    let text = output_str(&output);
    assert!(text.ends_with("deadready>"));
}

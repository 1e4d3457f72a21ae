//! Command-line grammar
//!
//! Commands are fixed-shape: the address-taking verbs are validated by
//! exact line length before any field is examined, and the toggle verbs
//! accept `on`, `off` or nothing. Parsing produces an owned [`Command`]
//! so dispatch never borrows the line buffer.

use core::fmt;

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `echo [on|off]`
    Echo(Option<bool>),
    /// `read 0xaaaa 0xbbbb`, inclusive range.
    Read {
        /// First address to read.
        start: u16,
        /// Last address to read.
        end: u16,
    },
    /// `write 0xaaaa 0xbbbb`, inclusive range.
    Write {
        /// First address to write.
        start: u16,
        /// Last address to write.
        end: u16,
    },
    /// `page_write [on|off]`
    PageWrite(Option<bool>),
    /// `eeprom_lock [on|off]`
    EepromLock(Option<bool>),
    /// `help`
    Help,
    /// `version`
    Version,
    /// `test`
    Test,
}

/// The verb a malformed address command was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `read`
    Read,
    /// `write`
    Write,
}

impl Verb {
    fn name(self) -> &'static str {
        match self {
            Verb::Read => "read",
            Verb::Write => "write",
        }
    }

    fn expected_len(self) -> usize {
        match self {
            Verb::Read => 18,
            Verb::Write => 19,
        }
    }
}

/// Why a command line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Address command with the wrong total length.
    WrongLength {
        /// The verb the line was recognized as.
        verb: Verb,
        /// The length the line actually had.
        got: usize,
    },
    /// Start address field did not parse as hex.
    BadStartAddr(Verb),
    /// End address field did not parse as hex.
    BadEndAddr(Verb),
    /// Start address above end address.
    StartAfterEnd(Verb),
    /// Line exceeded the command buffer.
    LineTooLong,
    /// Unrecognized verb.
    Unknown,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::WrongLength { verb, got } => write!(
                f,
                "Invalid {} command: wrong length: {}, expecting {}",
                verb.name(),
                got,
                verb.expected_len()
            ),
            ParseError::BadStartAddr(verb) => {
                write!(f, "Invalid {} command: cannot parse start addr", verb.name())
            }
            ParseError::BadEndAddr(verb) => {
                write!(f, "Invalid {} command: cannot parse end addr", verb.name())
            }
            ParseError::StartAfterEnd(verb) => {
                write!(f, "Invalid {} command: start-addr > end-addr", verb.name())
            }
            ParseError::LineTooLong => write!(f, "Invalid command: line too long"),
            ParseError::Unknown => write!(f, "Invalid command"),
        }
    }
}

/// Parse a completed command line. Empty lines are the caller's concern.
pub fn parse(line: &[u8]) -> Result<Command, ParseError> {
    if line.starts_with(b"echo") {
        Ok(Command::Echo(toggle_arg(line, b"echo")))
    } else if line.starts_with(b"read") {
        parse_range(line, Verb::Read).map(|(start, end)| Command::Read { start, end })
    } else if line.starts_with(b"page_write") {
        Ok(Command::PageWrite(toggle_arg(line, b"page_write")))
    } else if line.starts_with(b"eeprom_lock") {
        Ok(Command::EepromLock(toggle_arg(line, b"eeprom_lock")))
    } else if line.starts_with(b"write") {
        parse_range(line, Verb::Write).map(|(start, end)| Command::Write { start, end })
    } else if line == b"help" {
        Ok(Command::Help)
    } else if line == b"version" {
        Ok(Command::Version)
    } else if line == b"test" {
        Ok(Command::Test)
    } else {
        Err(ParseError::Unknown)
    }
}

/// `on`/`off` argument of a toggle verb. Anything else, including a
/// bare verb, selects the reporting form.
fn toggle_arg(line: &[u8], verb: &[u8]) -> Option<bool> {
    match &line[verb.len()..] {
        b" on" => Some(true),
        b" off" => Some(false),
        _ => None,
    }
}

fn parse_range(line: &[u8], verb: Verb) -> Result<(u16, u16), ParseError> {
    if line.len() != verb.expected_len() {
        return Err(ParseError::WrongLength {
            verb,
            got: line.len(),
        });
    }
    // verb, space, two 0x-prefixed fields separated by one space
    let fields = &line[verb.name().len() + 1..];
    let start = parse_addr(&fields[..6]).ok_or(ParseError::BadStartAddr(verb))?;
    let end = parse_addr(&fields[7..]).ok_or(ParseError::BadEndAddr(verb))?;
    if start > end {
        return Err(ParseError::StartAfterEnd(verb));
    }
    Ok((start, end))
}

/// Parse one `0x`-prefixed 4-digit address field.
///
/// Digits are consumed greedily from the start of the digit region; a
/// result of zero is only accepted when the field is literally `0000`,
/// so an all-garbage field cannot masquerade as address zero.
fn parse_addr(field: &[u8]) -> Option<u16> {
    let digits = &field[2..6];
    let mut value: u16 = 0;
    let mut consumed = 0;
    for &b in digits {
        let nibble = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => break,
        };
        value = value << 4 | u16::from(nibble);
        consumed += 1;
    }
    if value == 0 && (consumed == 0 || digits != b"0000") {
        return None;
    }
    Some(value)
}

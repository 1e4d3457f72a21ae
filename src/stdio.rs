//! Stdio-backed byte transport for the simulator
//!
//! Stands in for the firmware's UART: blocking one-byte reads from
//! stdin, blocking writes to stdout. When stdin is a terminal, line
//! feeds are translated to the protocol's carriage-return terminator so
//! an interactive session works with a plain Enter key; piped input is
//! passed through untouched so raw write payloads survive.

use std::io::{IsTerminal, Read, Write};

use eeprog_core::transport::Transport;
use eeprog_core::Error;

pub struct StdioTransport {
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
    translate_newlines: bool,
}

impl StdioTransport {
    pub fn new() -> Self {
        let stdin = std::io::stdin();
        let translate_newlines = stdin.is_terminal();
        Self {
            stdin,
            stdout: std::io::stdout(),
            translate_newlines,
        }
    }
}

impl Transport for StdioTransport {
    fn send(&mut self, data: &[u8]) -> eeprog_core::Result<()> {
        self.stdout
            .write_all(data)
            .and_then(|_| self.stdout.flush())
            .map_err(|e| {
                log::error!("stdout write failed: {}", e);
                Error::TransportFailed
            })
    }

    fn recv(&mut self) -> eeprog_core::Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.stdin.read(&mut byte) {
                Ok(0) => return Err(Error::TransportClosed),
                Ok(_) => {
                    if self.translate_newlines && byte[0] == b'\n' {
                        byte[0] = b'\r';
                    }
                    return Ok(byte[0]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("stdin read failed: {}", e);
                    return Err(Error::TransportFailed);
                }
            }
        }
    }
}

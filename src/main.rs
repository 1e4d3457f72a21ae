//! eeprog - serial console programmer for parallel EEPROMs
//!
//! Runs the firmware's command console against an in-memory emulated
//! device, with stdio standing in for the serial line. The same core
//! crate drives real shift-register hardware when given a board
//! implementation for it; this binary is the host-side simulator used
//! for development and protocol testing.

mod cli;
mod stdio;

use clap::Parser;
use cli::Cli;
use eeprog_core::console::Console;
use eeprog_core::Error;
use eeprog_dummy::{DummyBoard, DummyConfig};
use std::path::PathBuf;
use stdio::StdioTransport;

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("image is {got} bytes but the emulated device holds {size}")]
    ImageTooLarge { got: usize, size: usize },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let board = build_board(&cli)?;
    log::info!(
        "emulating {} byte EEPROM, protection initially {}",
        cli.size,
        if cli.unprotected { "off" } else { "on" }
    );

    let mut console = Console::new(board, StdioTransport::new());
    match console.run() {
        Err(Error::TransportClosed) => {
            log::info!("host closed the connection");
            Ok(())
        }
        Err(err) => Err(err.into()),
        Ok(()) => Ok(()),
    }
}

fn build_board(cli: &Cli) -> Result<DummyBoard, SimError> {
    let config = DummyConfig {
        size: cli.size,
        protected: !cli.unprotected,
    };
    let mut board = DummyBoard::new(config);
    if let Some(path) = &cli.image {
        let data = std::fs::read(path).map_err(|source| SimError::Image {
            path: path.clone(),
            source,
        })?;
        if data.len() > cli.size {
            return Err(SimError::ImageTooLarge {
                got: data.len(),
                size: cli.size,
            });
        }
        board.memory_mut()[..data.len()].copy_from_slice(&data);
        log::info!("preloaded {} bytes from {}", data.len(), path.display());
    }
    Ok(board)
}

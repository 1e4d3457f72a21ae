//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Parse a string as a hex or decimal size
fn parse_size(s: &str) -> Result<usize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<usize>()
            .map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "eeprog")]
#[command(author, version, about = "Serial console EEPROM programmer (stdio simulator)", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emulated EEPROM size in bytes (hex with 0x prefix, or decimal)
    #[arg(long, default_value = "0x8000", value_parser = parse_size)]
    pub size: usize,

    /// Preload the emulated EEPROM from this image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Start with software data protection disabled
    #[arg(long)]
    pub unprotected: bool,
}

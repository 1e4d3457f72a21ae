//! eeprog-core - Core library for serial-controlled parallel EEPROM programming
//!
//! This crate implements the firmware core of a programmer that drives a
//! parallel EEPROM through three external shift-register chains (control
//! flags, address, data) and talks to a host over a line-oriented serial
//! protocol. It is `no_std` compatible so the same code runs on a
//! microcontroller and inside a host-side simulator.
//!
//! The physical wiring (pins, clocks, settling delays) sits behind the
//! [`board::BitbangBoard`] trait; the host link sits behind
//! [`transport::Transport`]. Everything in between - the bit-serialization
//! protocol, the EEPROM read/write/protection sequencing, and the command
//! interpreter with its session state machine - lives here.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use eeprog_core::console::Console;
//!
//! fn serve<B: BitbangBoard, T: Transport>(board: B, wire: T) {
//!     let mut console = Console::new(board, wire);
//!     let _ = console.run();
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod board;
pub mod console;
pub mod eeprom;
pub mod error;
pub mod shiftreg;
pub mod transport;

pub use error::{Error, Result};

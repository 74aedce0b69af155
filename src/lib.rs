//! uartline: serial transaction engine for command-driven UART peripherals.
//!
//! Turns a UART byte stream that may fragment at any byte boundary into
//! command responses and positional sentence fields, within a fixed memory
//! budget and a bounded wait. Shared by the Bluetooth AT module, the GNSS
//! receiver and the sub-GHz radio drivers.
//!
//! The crate is `no_std` with no allocator, testable on any host with
//! `cargo test`. The UART driver stays outside: implement
//! [`transport::ByteSource`] for it and hand it to a [`link::Link`] along with
//! an `embedded_hal` delay.
//!
//! - `accumulator`: bounded receive buffer with oldest-byte eviction
//! - `waiter`: poll-budgeted wait for a success or error token
//! - `command`: command line formatting
//! - `sentence`: positional field extraction from NMEA-style sentences
//! - `link`: owns transport, delay and buffer; runs transactions
//! - `config`, `defaults`: runtime settings and built-in device profiles

#![cfg_attr(not(test), no_std)]

pub mod accumulator;
pub mod command;
pub mod config;
pub mod defaults;
pub mod error;
pub mod link;
pub mod sentence;
pub mod transport;
pub mod waiter;

#[cfg(test)]
mod mock;

pub use error::{ConfigError, Error, FieldError, FormatError};
pub use link::Link;

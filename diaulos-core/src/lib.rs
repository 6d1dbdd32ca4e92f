//! Target-agnostic buffered UART transport engine
//!
//! Moves bytes between a FIFO-less UART data register and application code
//! through fixed-capacity software ring buffers, one pair per channel,
//! with optional in-band XON/XOFF flow control:
//!
//! - Interrupt-driven transmit drain and receive capture
//! - Busy-waiting as the only blocking primitive (no OS, no allocator)
//! - Channel-indexed API that treats bad indices as no-ops, never faults
//! - Hardware reached only through the `diaulos-hal` traits
//!
//! The engine is `no_std` and owns no interrupt plumbing of its own: a
//! chip HAL implements [`UartPort`], provides a `critical-section`
//! implementation, and routes its vectors to trampolines generated with
//! [`uart_channel_isrs!`].

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod ring;
pub mod serial;

mod channel;
mod flow;

pub use config::SerialConfig;
pub use serial::{Port, Serial};

// Re-export the device-layer vocabulary so downstream crates only need
// this one dependency.
pub use diaulos_hal::{BaudDivisor, DataBits, LineConfig, Parity, StopBits, UartPort};

//! Recording mock UART device
//!
//! Implements [`UartPort`] over plain recorded state so the transport
//! engine can be exercised on the host. Tests play the interrupt context
//! themselves: load a byte with [`MockUart::set_rx_data`] and call the
//! engine's receive handler, or pump the transmit handler while
//! [`MockUart::tx_interrupt_enabled`] reports the drain is live. Everything
//! written to a data register lands on that channel's [`MockUart::wire`].

#![no_std]
#![deny(unsafe_code)]

use core::cell::RefCell;

use critical_section::Mutex;
use diaulos_hal::{BaudDivisor, LineConfig, UartPort};
use heapless::Vec;

/// Bytes of transmitted output retained per channel.
pub const WIRE_CAPACITY: usize = 256;

/// Recorded state of one mock peripheral.
struct PortState {
    active: bool,
    divisor: u16,
    line: LineConfig,
    tx_interrupt: bool,
    kicks: u32,
    rx_data: u8,
    wire: Vec<u8, WIRE_CAPACITY>,
}

impl PortState {
    const fn new() -> Self {
        Self {
            active: false,
            divisor: 0,
            line: LineConfig::eight_n_one(),
            tx_interrupt: false,
            kicks: 0,
            rx_data: 0,
            wire: Vec::new(),
        }
    }
}

/// Mock device with `N` UART channels.
pub struct MockUart<const N: usize> {
    ports: [Mutex<RefCell<PortState>>; N],
}

impl<const N: usize> MockUart<N> {
    /// Create a mock with every channel inactive.
    pub const fn new() -> Self {
        Self {
            ports: [const { Mutex::new(RefCell::new(PortState::new())) }; N],
        }
    }

    fn with_port<R>(&self, channel: usize, f: impl FnOnce(&mut PortState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.ports[channel].borrow_ref_mut(cs)))
    }

    /// True after `configure`, false after `shutdown`.
    pub fn is_active(&self, channel: usize) -> bool {
        self.with_port(channel, |port| port.active)
    }

    /// Divisor recorded by the last `configure`.
    pub fn divisor(&self, channel: usize) -> u16 {
        self.with_port(channel, |port| port.divisor)
    }

    /// Line format recorded by the last `configure`.
    pub fn line(&self, channel: usize) -> LineConfig {
        self.with_port(channel, |port| port.line)
    }

    /// Whether the data-register-empty interrupt source is enabled.
    pub fn tx_interrupt_enabled(&self, channel: usize) -> bool {
        self.with_port(channel, |port| port.tx_interrupt)
    }

    /// How many synthetic data-register-empty events were forced.
    pub fn kick_count(&self, channel: usize) -> u32 {
        self.with_port(channel, |port| port.kicks)
    }

    /// Load the receive data register with the next incoming byte.
    pub fn set_rx_data(&self, channel: usize, byte: u8) {
        self.with_port(channel, |port| port.rx_data = byte);
    }

    /// Everything written to the transmit data register so far.
    pub fn wire(&self, channel: usize) -> Vec<u8, WIRE_CAPACITY> {
        self.with_port(channel, |port| port.wire.clone())
    }

    /// Take and clear the transmitted output.
    pub fn take_wire(&self, channel: usize) -> Vec<u8, WIRE_CAPACITY> {
        self.with_port(channel, |port| {
            let taken = port.wire.clone();
            port.wire.clear();
            taken
        })
    }
}

impl<const N: usize> Default for MockUart<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> UartPort for MockUart<N> {
    const CHANNELS: usize = N;
    // Generous budget; capacity pressure is not what this mock tests.
    const BUFFER_MEMORY: usize = 4096;

    fn configure(&self, channel: usize, baud: BaudDivisor, line: LineConfig) {
        self.with_port(channel, |port| {
            port.active = true;
            port.divisor = baud.raw();
            port.line = line;
            port.tx_interrupt = false;
        });
    }

    fn shutdown(&self, channel: usize) {
        self.with_port(channel, |port| {
            port.active = false;
            port.tx_interrupt = false;
        });
    }

    fn read_data(&self, channel: usize) -> u8 {
        self.with_port(channel, |port| port.rx_data)
    }

    fn write_data(&self, channel: usize, byte: u8) {
        self.with_port(channel, |port| {
            let _ = port.wire.push(byte);
        });
    }

    fn set_tx_interrupt(&self, channel: usize, enabled: bool) {
        self.with_port(channel, |port| port.tx_interrupt = enabled);
    }

    fn kick_tx(&self, channel: usize) {
        self.with_port(channel, |port| port.kicks += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_records_settings() {
        let mock = MockUart::<2>::new();
        assert!(!mock.is_active(1));

        mock.configure(1, BaudDivisor(25), LineConfig::eight_n_one());
        assert!(mock.is_active(1));
        assert_eq!(mock.divisor(1), 25);
        assert!(!mock.is_active(0));
    }

    #[test]
    fn test_wire_records_written_bytes() {
        let mock = MockUart::<1>::new();
        mock.write_data(0, b'a');
        mock.write_data(0, b'b');
        assert_eq!(mock.wire(0).as_slice(), &b"ab"[..]);

        assert_eq!(mock.take_wire(0).as_slice(), &b"ab"[..]);
        assert!(mock.wire(0).is_empty());
    }
}

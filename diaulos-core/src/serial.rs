//! Channel multiplexer: N independent buffered UART channels over one
//! device
//!
//! Exactly two execution contexts touch a channel: the foreground
//! application and that channel's own interrupt handlers. Every access to
//! shared channel state happens inside a critical section, and every
//! busy-wait releases the section on each spin so the interrupt side can
//! make progress. The interrupt entry points themselves are O(1) and never
//! wait.
//!
//! Invalid channel indices are silently ignored: operations on them are
//! no-ops returning neutral values, never faults.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use diaulos_hal::{BaudDivisor, UartPort};

use crate::channel::{Channel, TxStep};
use crate::config::SerialConfig;
use crate::flow::FlowState;

/// Multi-channel buffered UART driver.
///
/// `CHANNELS` must match the device's channel count; `RX` and `TX` are the
/// per-channel ring sizes. Constructing the driver in a `static` turns the
/// capacity checks in [`Serial::new`] into compile-time checks.
///
/// ```ignore
/// static SERIAL: Serial<BoardUart, 2, 32, 16> =
///     Serial::new(BoardUart::new(), SerialConfig::with_flow_control());
///
/// diaulos_core::uart_channel_isrs!(SERIAL, 0, uart0_rx, uart0_tx);
/// diaulos_core::uart_channel_isrs!(SERIAL, 1, uart1_rx, uart1_tx);
///
/// fn run() {
///     SERIAL.init(0, BaudDivisor::from_clock(16_000_000, 38_400));
///     SERIAL.write_str(0, "hello\n");
///     loop {
///         if SERIAL.has_char(0) {
///             let byte = SERIAL.read(0);
///             SERIAL.write(0, byte);
///         }
///     }
/// }
/// ```
pub struct Serial<D, const CHANNELS: usize, const RX: usize, const TX: usize> {
    device: D,
    config: SerialConfig,
    channels: [Mutex<RefCell<Channel<RX, TX>>>; CHANNELS],
}

impl<D: UartPort, const CHANNELS: usize, const RX: usize, const TX: usize>
    Serial<D, CHANNELS, RX, TX>
{
    /// Create a driver over `device`.
    ///
    /// Panics when the capacities don't fit the device or the flow-control
    /// configuration; in a `const`/`static` context the panic happens at
    /// compile time.
    pub const fn new(device: D, config: SerialConfig) -> Self {
        assert!(CHANNELS == D::CHANNELS, "channel count must match the device");
        assert!(RX >= 2 && TX >= 2, "ring buffers need at least 2 slots");
        assert!(RX <= u16::MAX as usize && TX <= u16::MAX as usize, "ring cursors must fit 16 bits");
        assert!(
            (RX + TX) * CHANNELS <= D::BUFFER_MEMORY,
            "ring buffers exceed the device memory budget"
        );
        if config.flow_control {
            assert!(RX >= 8 && TX >= 8, "flow control needs at least 8 slots per ring");
            assert!(
                config.flow_mark >= 1 && (config.flow_mark as usize) < RX,
                "flow mark must fall inside the receive ring"
            );
        }
        Self {
            device,
            config,
            channels: [const { Mutex::new(RefCell::new(Channel::new())) }; CHANNELS],
        }
    }

    /// Number of channels this driver multiplexes.
    pub const fn channel_count(&self) -> usize {
        CHANNELS
    }

    /// The underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Configure the hardware and reset the channel state.
    pub fn init(&self, channel: usize, baud: BaudDivisor) {
        if channel >= CHANNELS {
            return;
        }
        critical_section::with(|cs| {
            self.channels[channel].borrow_ref_mut(cs).reset();
            self.device.configure(channel, baud, self.config.line);
        });
    }

    /// Drain outstanding transmissions, then deactivate the channel.
    ///
    /// The hardware disable and the state reset share one critical section,
    /// so a handler never observes a half-reset channel. The channel is
    /// inert afterwards until the next `init`.
    pub fn close(&self, channel: usize) {
        if channel >= CHANNELS {
            return;
        }
        self.wait_drained(channel);
        critical_section::with(|cs| {
            self.device.shutdown(channel);
            self.channels[channel].borrow_ref_mut(cs).reset();
        });
    }

    /// Manually pause (`false`) or resume (`true`) the remote sender.
    ///
    /// Returns once the control byte has been handed to the hardware (not
    /// necessarily shifted out). No-op when flow control is disabled or the
    /// state already matches.
    pub fn set_flow(&self, channel: usize, on: bool) {
        if channel >= CHANNELS || !self.config.flow_control {
            return;
        }
        let unchanged = critical_section::with(|cs| {
            (self.channels[channel].borrow_ref(cs).flow.state() == FlowState::On) == on
        });
        if unchanged {
            return;
        }
        self.queue_control(channel, on);
        self.wait_pending_clear(channel);
    }

    // ---------------------
    // |     Reception     |
    // ---------------------

    /// True when at least one received byte is buffered.
    pub fn has_char(&self, channel: usize) -> bool {
        if channel >= CHANNELS {
            return false;
        }
        critical_section::with(|cs| !self.channels[channel].borrow_ref(cs).rx.is_empty())
    }

    /// Take one received byte, or the neutral `0` when the buffer is empty.
    ///
    /// Draining to the low-water mark resumes a paused remote sender.
    pub fn read(&self, channel: usize) -> u8 {
        if channel >= CHANNELS {
            return 0;
        }
        let (byte, resume) = critical_section::with(|cs| {
            let mut ch = self.channels[channel].borrow_ref_mut(cs);
            match ch.rx.pop() {
                Some(byte) if self.config.flow_control => {
                    ch.flow.record_consumed();
                    (byte, ch.flow.should_resume(self.config.flow_mark))
                }
                Some(byte) => (byte, false),
                None => (0, false),
            }
        });
        if resume {
            self.queue_control(channel, true);
        }
        byte
    }

    /// Busy-wait until a byte arrives, then take it.
    pub fn read_blocking(&self, channel: usize) -> u8 {
        if channel >= CHANNELS {
            return 0;
        }
        while !self.has_char(channel) {
            core::hint::spin_loop();
        }
        self.read(channel)
    }

    /// True when the receive ring cannot accept another byte.
    pub fn rx_full(&self, channel: usize) -> bool {
        if channel >= CHANNELS {
            return false;
        }
        critical_section::with(|cs| self.channels[channel].borrow_ref(cs).rx.is_full())
    }

    /// True when no received byte is buffered.
    pub fn rx_empty(&self, channel: usize) -> bool {
        if channel >= CHANNELS {
            return false;
        }
        critical_section::with(|cs| self.channels[channel].borrow_ref(cs).rx.is_empty())
    }

    // ----------------------
    // |    Transmission    |
    // ----------------------

    /// Queue one byte for transmission, busy-waiting while the ring is
    /// full.
    ///
    /// A full ring is backpressure, not failure: the interrupt drain frees
    /// a slot as long as the hardware is alive and serviced.
    pub fn write(&self, channel: usize, byte: u8) {
        if channel >= CHANNELS {
            return;
        }
        if self.config.inject_cr && byte == b'\n' {
            self.push_byte(channel, b'\r');
        }
        self.push_byte(channel, byte);
    }

    /// Queue every byte of `text`.
    pub fn write_str(&self, channel: usize, text: &str) {
        if channel >= CHANNELS {
            return;
        }
        for byte in text.bytes() {
            self.write(channel, byte);
        }
    }

    /// Queue `value` as decimal ASCII, most significant digit first.
    pub fn write_u16(&self, channel: usize, value: u16) {
        if channel >= CHANNELS {
            return;
        }
        let mut digits = [0u8; 5];
        let mut count = 0;
        let mut rest = value;
        if rest == 0 {
            count = 1;
        } else {
            while rest > 0 {
                digits[count] = (rest % 10) as u8;
                rest /= 10;
                count += 1;
            }
        }
        for index in (0..count).rev() {
            self.write(channel, b'0' + digits[index]);
        }
    }

    /// True when the transmit ring cannot accept another byte.
    pub fn tx_full(&self, channel: usize) -> bool {
        if channel >= CHANNELS {
            return false;
        }
        critical_section::with(|cs| self.channels[channel].borrow_ref(cs).tx.is_full())
    }

    /// True when no byte is waiting for transmission.
    pub fn tx_empty(&self, channel: usize) -> bool {
        if channel >= CHANNELS {
            return false;
        }
        critical_section::with(|cs| self.channels[channel].borrow_ref(cs).tx.is_empty())
    }

    // ----------------------
    // |     Interrupts     |
    // ----------------------

    /// Receive-complete interrupt entry point.
    ///
    /// Always reads the data register - the hardware byte-ready condition
    /// must clear even when the byte is dropped on overflow. O(1), never
    /// waits.
    pub fn on_receive(&self, channel: usize) {
        if channel >= CHANNELS {
            return;
        }
        critical_section::with(|cs| {
            let byte = self.device.read_data(channel);
            let kick = self.channels[channel]
                .borrow_ref_mut(cs)
                .rx_byte(byte, &self.config);
            if kick {
                self.activate(channel);
            }
        });
    }

    /// Data-register-empty interrupt entry point.
    ///
    /// Pending control byte first, then one data byte, else the engine goes
    /// Idle and the interrupt source is disabled. O(1), never waits.
    pub fn on_transmit(&self, channel: usize) {
        if channel >= CHANNELS {
            return;
        }
        critical_section::with(|cs| {
            match self.channels[channel].borrow_ref_mut(cs).tx_ready() {
                TxStep::Send(byte) => self.device.write_data(channel, byte),
                TxStep::Stop => self.device.set_tx_interrupt(channel, false),
            }
        });
    }

    /// Validated per-channel handle for the [`embedded_io`] and
    /// [`core::fmt::Write`] interfaces.
    pub fn port(&self, channel: usize) -> Option<Port<'_, D, CHANNELS, RX, TX>> {
        if channel >= CHANNELS {
            return None;
        }
        Some(Port {
            serial: self,
            channel,
        })
    }

    // ----------------------
    // |      Internal      |
    // ----------------------

    /// Enable the data-register-empty interrupt and force the first event.
    fn activate(&self, channel: usize) {
        self.device.set_tx_interrupt(channel, true);
        self.device.kick_tx(channel);
    }

    fn push_byte(&self, channel: usize, byte: u8) {
        loop {
            let pushed = critical_section::with(|cs| {
                let mut ch = self.channels[channel].borrow_ref_mut(cs);
                if ch.tx.push(byte).is_err() {
                    return false;
                }
                if ch.begin_drain() {
                    self.activate(channel);
                }
                true
            });
            if pushed {
                break;
            }
            core::hint::spin_loop();
        }
    }

    /// Queue a control byte once the single pending slot is free, kicking
    /// the transmit engine if it was idle. Foreground contexts only.
    fn queue_control(&self, channel: usize, on: bool) {
        self.wait_pending_clear(channel);
        critical_section::with(|cs| {
            let mut ch = self.channels[channel].borrow_ref_mut(cs);
            if on {
                ch.flow.resume(self.config.resume_byte);
            } else {
                ch.flow.pause(self.config.pause_byte);
            }
            if ch.begin_drain() {
                self.activate(channel);
            }
        });
    }

    fn wait_pending_clear(&self, channel: usize) {
        loop {
            let clear = critical_section::with(|cs| {
                self.channels[channel].borrow_ref(cs).flow.pending_clear()
            });
            if clear {
                break;
            }
            core::hint::spin_loop();
        }
    }

    fn wait_drained(&self, channel: usize) {
        loop {
            let drained = critical_section::with(|cs| {
                let ch = self.channels[channel].borrow_ref(cs);
                ch.tx.is_empty() && ch.flow.pending_clear() && ch.is_idle()
            });
            if drained {
                break;
            }
            core::hint::spin_loop();
        }
    }
}

/// One channel of a [`Serial`] driver.
///
/// Handed out by [`Serial::port`] with the index already validated, so the
/// trait implementations below carry no bad-index path.
pub struct Port<'a, D, const CHANNELS: usize, const RX: usize, const TX: usize> {
    serial: &'a Serial<D, CHANNELS, RX, TX>,
    channel: usize,
}

impl<D: UartPort, const CHANNELS: usize, const RX: usize, const TX: usize>
    Port<'_, D, CHANNELS, RX, TX>
{
    /// Channel index this handle is bound to.
    pub fn channel(&self) -> usize {
        self.channel
    }
}

impl<D: UartPort, const CHANNELS: usize, const RX: usize, const TX: usize>
    embedded_io::ErrorType for Port<'_, D, CHANNELS, RX, TX>
{
    type Error = core::convert::Infallible;
}

impl<D: UartPort, const CHANNELS: usize, const RX: usize, const TX: usize> embedded_io::Read
    for Port<'_, D, CHANNELS, RX, TX>
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.serial.read_blocking(self.channel);
        let mut count = 1;
        while count < buf.len() && self.serial.has_char(self.channel) {
            buf[count] = self.serial.read(self.channel);
            count += 1;
        }
        Ok(count)
    }
}

impl<D: UartPort, const CHANNELS: usize, const RX: usize, const TX: usize> embedded_io::Write
    for Port<'_, D, CHANNELS, RX, TX>
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.serial.write(self.channel, buf[0]);
        let mut count = 1;
        while count < buf.len() && !self.serial.tx_full(self.channel) {
            self.serial.write(self.channel, buf[count]);
            count += 1;
        }
        Ok(count)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.serial.wait_drained(self.channel);
        Ok(())
    }
}

impl<D: UartPort, const CHANNELS: usize, const RX: usize, const TX: usize> fmt::Write
    for Port<'_, D, CHANNELS, RX, TX>
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.serial.write_str(self.channel, s);
        Ok(())
    }
}

/// Generate the thin per-channel interrupt trampolines for one channel.
///
/// Interrupt vectors cannot carry a parameter on this class of hardware,
/// so each physical vector gets a zero-argument function with the channel
/// index baked in; the device layer routes its two vectors there.
///
/// ```ignore
/// static SERIAL: Serial<BoardUart, 2, 32, 16> = /* ... */;
///
/// diaulos_core::uart_channel_isrs!(SERIAL, 0, uart0_rx, uart0_tx);
/// diaulos_core::uart_channel_isrs!(SERIAL, 1, uart1_rx, uart1_tx);
/// ```
#[macro_export]
macro_rules! uart_channel_isrs {
    ($serial:path, $channel:expr, $rx:ident, $tx:ident) => {
        /// Receive-complete trampoline.
        pub fn $rx() {
            $serial.on_receive($channel);
        }

        /// Data-register-empty trampoline.
        pub fn $tx() {
            $serial.on_transmit($channel);
        }
    };
}

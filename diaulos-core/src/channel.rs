//! Per-channel state and the transmit/receive engine transitions
//!
//! Everything here is pure state manipulation; touching the data register
//! and the interrupt-enable bits is the driver's job. The split keeps the
//! engine logic testable without hardware.

use crate::config::SerialConfig;
use crate::flow::FlowControl;
use crate::ring::RingBuffer;

/// Transmit engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxState {
    /// No interrupt-driven drain is scheduled.
    Idle,
    /// The data-register-empty interrupt is live and draining the ring.
    Draining,
}

/// What the transmit interrupt must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxStep {
    /// Place this byte in the data register.
    Send(u8),
    /// Nothing left: disable the data-register-empty interrupt source.
    Stop,
}

/// One channel: its two rings, the transmit engine state and the flow
/// bookkeeping.
pub(crate) struct Channel<const RX: usize, const TX: usize> {
    pub rx: RingBuffer<RX>,
    pub tx: RingBuffer<TX>,
    state: TxState,
    pub flow: FlowControl,
}

impl<const RX: usize, const TX: usize> Channel<RX, TX> {
    pub const fn new() -> Self {
        Self {
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            state: TxState::Idle,
            flow: FlowControl::new(),
        }
    }

    /// Return to the just-initialized state.
    pub fn reset(&mut self) {
        self.rx.clear();
        self.tx.clear();
        self.state = TxState::Idle;
        self.flow.reset();
    }

    pub fn is_idle(&self) -> bool {
        self.state == TxState::Idle
    }

    /// Idle -> Draining edge. Returns true exactly once per becoming
    /// active; the caller must then enable and kick the interrupt source.
    pub fn begin_drain(&mut self) -> bool {
        if self.state == TxState::Idle {
            self.state = TxState::Draining;
            true
        } else {
            false
        }
    }

    /// One transmit-interrupt step: pending control byte first, then one
    /// data byte, else Draining -> Idle.
    pub fn tx_ready(&mut self) -> TxStep {
        if let Some(byte) = self.flow.take_pending() {
            return TxStep::Send(byte);
        }
        match self.tx.pop() {
            Some(byte) => TxStep::Send(byte),
            None => {
                self.state = TxState::Idle;
                TxStep::Stop
            }
        }
    }

    /// One receive-interrupt step. Returns true when a control byte was
    /// queued and the transmit engine must be kicked out of Idle.
    ///
    /// A byte arriving into a full ring is dropped - the newest byte is the
    /// one lost, the buffered backlog is kept - because the handler must
    /// not stall.
    pub fn rx_byte(&mut self, byte: u8, config: &SerialConfig) -> bool {
        let stored = self.rx.push(byte).is_ok();
        if !config.flow_control || !stored {
            return false;
        }
        self.flow.record_stored();
        if self.flow.should_pause(RX as u16 - config.flow_mark) {
            self.flow.pause(config.pause_byte);
            return self.begin_drain();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_byte_preempts_data() {
        let mut channel = Channel::<8, 8>::new();
        channel.tx.push(b'A').unwrap();
        channel.begin_drain();
        channel.flow.pause(0x13);

        assert_eq!(channel.tx_ready(), TxStep::Send(0x13));
        assert_eq!(channel.tx_ready(), TxStep::Send(b'A'));
        assert_eq!(channel.tx_ready(), TxStep::Stop);
        assert!(channel.is_idle());
    }

    #[test]
    fn test_begin_drain_fires_once_per_activation() {
        let mut channel = Channel::<8, 8>::new();
        assert!(channel.begin_drain());
        assert!(!channel.begin_drain());

        // Draining runs dry, engine returns to Idle.
        assert_eq!(channel.tx_ready(), TxStep::Stop);
        assert!(channel.begin_drain());
    }

    #[test]
    fn test_rx_overflow_drops_newest() {
        let mut channel = Channel::<4, 4>::new();
        let config = SerialConfig::new();
        for byte in 0..5 {
            assert!(!channel.rx_byte(byte, &config));
        }
        // Three slots usable; the backlog survives, arrivals 3 and 4 don't.
        assert_eq!(channel.rx.pop(), Some(0));
        assert_eq!(channel.rx.pop(), Some(1));
        assert_eq!(channel.rx.pop(), Some(2));
        assert_eq!(channel.rx.pop(), None);
    }

    #[test]
    fn test_rx_crossing_high_water_kicks_once() {
        let mut channel = Channel::<16, 16>::new();
        let config = SerialConfig::with_flow_control();

        for byte in 0..10 {
            assert!(!channel.rx_byte(byte, &config));
        }
        // Arrival 11 crosses capacity - flow_mark = 11.
        assert!(channel.rx_byte(10, &config));
        assert_eq!(channel.flow.take_pending(), Some(0x13));

        // Flow is off now; further arrivals queue nothing.
        assert!(!channel.rx_byte(11, &config));
        assert!(channel.flow.pending_clear());
    }

    #[test]
    fn test_rx_kick_suppressed_while_draining() {
        let mut channel = Channel::<16, 16>::new();
        let config = SerialConfig::with_flow_control();
        channel.tx.push(b'x').unwrap();
        channel.begin_drain();

        for byte in 0..11 {
            // The pause byte is queued but the engine is already active.
            assert!(!channel.rx_byte(byte, &config));
        }
        assert_eq!(channel.tx_ready(), TxStep::Send(0x13));
        assert_eq!(channel.tx_ready(), TxStep::Send(b'x'));
    }
}

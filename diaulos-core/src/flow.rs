//! XON/XOFF flow-control state machine
//!
//! Layered on the receive ring: occupancy crossing the high-water mark
//! queues the pause byte, draining back to the low-water mark queues the
//! resume byte. The pending slot holds at most one control byte at a time;
//! the transmit interrupt serves it with priority over data.

/// Flow-control negotiation state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowState {
    /// The remote side may send.
    On,
    /// The pause byte has been issued; waiting for the buffer to drain.
    Off,
}

/// Per-channel flow bookkeeping: negotiation state, the single pending
/// control byte, and the count of bytes resident in the receive ring.
///
/// The count is kept separately from the ring cursors so it stays valid
/// across cursor wraps. It moves only when a byte is actually stored or
/// consumed, so it never exceeds the ring capacity.
#[derive(Debug)]
pub(crate) struct FlowControl {
    state: FlowState,
    pending: Option<u8>,
    held: u16,
}

impl FlowControl {
    pub const fn new() -> Self {
        Self {
            state: FlowState::On,
            pending: None,
            held: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// True when the pending control-byte slot is free.
    pub fn pending_clear(&self) -> bool {
        self.pending.is_none()
    }

    /// Hand the queued control byte to the transmit engine, freeing the
    /// slot.
    pub fn take_pending(&mut self) -> Option<u8> {
        self.pending.take()
    }

    /// Account for a byte stored into the receive ring.
    pub fn record_stored(&mut self) {
        self.held = self.held.saturating_add(1);
    }

    /// Account for a byte consumed from the receive ring.
    pub fn record_consumed(&mut self) {
        self.held = self.held.saturating_sub(1);
    }

    /// True on the On -> Off crossing: flow is on and occupancy has reached
    /// the high-water mark.
    pub fn should_pause(&self, high_water: u16) -> bool {
        self.state == FlowState::On && self.held >= high_water
    }

    /// True on the Off -> On crossing: flow is off and occupancy has
    /// drained to the low-water mark.
    pub fn should_resume(&self, low_water: u16) -> bool {
        self.state == FlowState::Off && self.held <= low_water
    }

    /// Queue the pause byte and turn flow off.
    ///
    /// May overwrite an unsent control byte: the receive interrupt cannot
    /// wait for the slot.
    pub fn pause(&mut self, byte: u8) {
        self.pending = Some(byte);
        self.state = FlowState::Off;
    }

    /// Queue the resume byte and turn flow on.
    pub fn resume(&mut self, byte: u8) {
        self.pending = Some(byte);
        self.state = FlowState::On;
    }
}

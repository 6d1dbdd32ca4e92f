//! Driver configuration
//!
//! Everything tunable per build target that is not a buffer capacity lives
//! in one value handed to [`Serial::new`](crate::Serial::new): flow-control
//! activation and marks, the reserved control bytes, CR injection, and the
//! line format. Capacities are const generics on the driver itself.

use diaulos_hal::LineConfig;

/// Default resume (XON) control byte.
pub const XON: u8 = 0x11;
/// Default pause (XOFF) control byte.
pub const XOFF: u8 = 0x13;
/// Default flow mark: pause when `capacity - FLOW_MARK` bytes are held,
/// resume when occupancy drains back to `FLOW_MARK`.
pub const FLOW_MARK: u16 = 5;

/// Build-target configuration for a [`Serial`](crate::Serial) driver.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Enable in-band XON/XOFF flow control. While on, the two control
    /// bytes are reserved and must not appear in the data stream;
    /// binary-clean transport needs this off.
    pub flow_control: bool,
    /// Hysteresis mark, in bytes of receive-ring occupancy.
    pub flow_mark: u16,
    /// Control byte telling the remote side to stop sending.
    pub pause_byte: u8,
    /// Control byte telling the remote side to resume sending.
    pub resume_byte: u8,
    /// Enqueue a carriage return before every line feed. Line-oriented
    /// consoles want this; binary transport does not.
    pub inject_cr: bool,
    /// Frame format programmed into the hardware by `init`.
    pub line: LineConfig,
}

impl SerialConfig {
    /// Binary-clean transport: no flow control, no CR injection, 8N1.
    pub const fn new() -> Self {
        Self {
            flow_control: false,
            flow_mark: FLOW_MARK,
            pause_byte: XOFF,
            resume_byte: XON,
            inject_cr: false,
            line: LineConfig::eight_n_one(),
        }
    }

    /// Transport with XON/XOFF flow control at the default marks.
    pub const fn with_flow_control() -> Self {
        let mut config = Self::new();
        config.flow_control = true;
        config
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}

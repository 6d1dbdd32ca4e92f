//! UART device-layer interface
//!
//! The transport engine drives the hardware exclusively through
//! [`UartPort`]: a register-level contract a chip-specific HAL implements
//! over its own descriptor tables. One implementor covers all UART
//! peripherals of a target; channels are addressed by index.

/// Baud-rate divisor register value.
///
/// This is the raw value programmed into the divisor register, not a baud
/// rate. Use [`BaudDivisor::from_clock`] to compute it; whether the target
/// exposes the divisor as one 16-bit register or a split high/low pair is
/// the implementor's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaudDivisor(pub u16);

impl BaudDivisor {
    /// Compute the divisor for a peripheral clock and a target baud rate,
    /// assuming the usual 16x oversampling: `clock / (16 * baud) - 1`.
    pub const fn from_clock(clock_hz: u32, baud: u32) -> Self {
        Self((clock_hz / (baud * 16) - 1) as u16)
    }

    /// The raw register value.
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopBits {
    One,
    Two,
}

/// Frame format programmed into the hardware at channel initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineConfig {
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl LineConfig {
    /// 8 data bits, no parity, 1 stop bit.
    pub const fn eight_n_one() -> Self {
        Self {
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::eight_n_one()
    }
}

/// Register-level access to every UART peripheral of one target.
///
/// Implementations wrap the chip's register/bit descriptor tables. All
/// methods take a channel index already validated by the engine
/// (`0 <= channel < CHANNELS`); they are called from both the foreground
/// and the interrupt context, always inside a critical section.
pub trait UartPort {
    /// Number of UART peripherals on this target.
    const CHANNELS: usize;

    /// Bytes of RAM the transport may spend on ring buffers. The engine
    /// checks its total buffer allocation against this at build time.
    const BUFFER_MEMORY: usize;

    /// Program baud divisor and frame format, enable receiver, transmitter
    /// and the receive-complete interrupt source.
    fn configure(&self, channel: usize, baud: BaudDivisor, line: LineConfig);

    /// Disable the peripheral and all of its interrupt sources.
    fn shutdown(&self, channel: usize);

    /// Read the receive data register, clearing the byte-ready condition.
    fn read_data(&self, channel: usize) -> u8;

    /// Place one byte in the transmit data register.
    fn write_data(&self, channel: usize, byte: u8);

    /// Enable or disable the data-register-empty interrupt source.
    fn set_tx_interrupt(&self, channel: usize, enabled: bool);

    /// Force one synthetic data-register-empty event.
    ///
    /// Needed on targets where enabling the interrupt source alone does not
    /// re-trigger a pending empty condition; a no-op elsewhere.
    fn kick_tx(&self, channel: usize);
}

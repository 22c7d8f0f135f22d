//! Shared types used across the amplifier firmware
//!
//! Domain newtypes and enums that keep raw register values, pin levels and
//! EEPROM bytes from being mixed up between layers.

use core::fmt;

/// Lifecycle of one asynchronous transfer
///
/// Stored as a single byte in a [`TransferCell`](crate::transfer::TransferCell)
/// so the interrupt path and the main loop never see a torn value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TransferState {
    /// No transfer in flight
    #[default]
    Idle = 0,
    /// Hardware owns the buffer
    Busy = 1,
    /// Last transfer finished; not yet acknowledged
    CompletedOk = 2,
    /// Last transfer failed; not yet acknowledged
    Error = 3,
}

impl TransferState {
    /// Raw byte representation
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a raw byte; unknown values read as `Error`
    #[must_use]
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Busy,
            2 => Self::CompletedOk,
            _ => Self::Error,
        }
    }

    /// Whether an outcome is waiting to be acknowledged
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::CompletedOk | Self::Error)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TransferState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::Busy => defmt::write!(f, "BUSY"),
            Self::CompletedOk => defmt::write!(f, "DONE"),
            Self::Error => defmt::write!(f, "ERROR"),
        }
    }
}

/// Firmware-level error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmpError {
    /// No valid clock configuration exists for the requested target
    Configuration,
    /// A peripheral failed to initialise
    DeviceInit,
    /// An asynchronous transfer failed
    Transfer,
    /// Device is mid-transfer; try again later
    Busy,
    /// A blocking I2C or SPI exchange failed
    Bus,
}

impl fmt::Display for AmpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Configuration => "no valid clock configuration",
            Self::DeviceInit => "device initialisation failed",
            Self::Transfer => "transfer failed",
            Self::Busy => "device busy",
            Self::Bus => "bus error",
        };
        f.write_str(text)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AmpError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Configuration => defmt::write!(f, "Configuration"),
            Self::DeviceInit => defmt::write!(f, "DeviceInit"),
            Self::Transfer => defmt::write!(f, "Transfer"),
            Self::Busy => defmt::write!(f, "Busy"),
            Self::Bus => defmt::write!(f, "Bus"),
        }
    }
}

/// Front-panel rotary control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Control {
    /// Master volume
    Volume,
    /// Bass tone band
    Bass,
    /// Treble tone band
    Treble,
}

/// Audio input selection (1..=4, as printed on the panel)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputChannel(u8);

impl InputChannel {
    /// First input
    pub const MIN: u8 = 1;

    /// Last input
    pub const MAX: u8 = 4;

    /// Create from a panel number, `None` if out of range
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if number >= Self::MIN && number <= Self::MAX {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Panel number (1-based)
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based index for LED arrays
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    /// Next input, saturating at the last one
    #[must_use]
    pub const fn up(self) -> Self {
        if self.0 < Self::MAX {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    /// Previous input, saturating at the first one
    #[must_use]
    pub const fn down(self) -> Self {
        if self.0 > Self::MIN {
            Self(self.0 - 1)
        } else {
            self
        }
    }
}

impl Default for InputChannel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Debug for InputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input({})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for InputChannel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "IN{}", self.0);
    }
}

/// Amplifier output gain step (0..=3)
///
/// Driven onto two select pins, see [`OutputGain::pin_levels`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct OutputGain(u8);

impl OutputGain {
    /// Highest gain step
    pub const MAX: u8 = 3;

    /// Create from a raw step, `None` if out of range
    #[must_use]
    pub const fn new(step: u8) -> Option<Self> {
        if step <= Self::MAX {
            Some(Self(step))
        } else {
            None
        }
    }

    /// Raw step
    #[must_use]
    pub const fn step(self) -> u8 {
        self.0
    }

    /// Levels of the `(gain0, gain1)` select pins, `true` = high
    ///
    /// ```text
    /// step  gain0  gain1
    ///   0     H      H
    ///   1     L      H
    ///   2     H      L
    ///   3     L      L
    /// ```
    #[must_use]
    pub const fn pin_levels(self) -> (bool, bool) {
        (self.0 & 0b01 == 0, self.0 & 0b10 == 0)
    }

    /// One step up, saturating
    #[must_use]
    pub const fn up(self) -> Self {
        if self.0 < Self::MAX {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    /// One step down, saturating
    #[must_use]
    pub const fn down(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OutputGain {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "G{}", self.0);
    }
}

/// Value clamped to an inclusive range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundedValue<T> {
    value: T,
    min: T,
    max: T,
}

impl<T: Copy + Ord> BoundedValue<T> {
    /// Create a new bounded value (clamped into range)
    #[must_use]
    pub fn new(value: T, min: T, max: T) -> Self {
        let mut bounded = Self { value: min, min, max };
        bounded.set(value);
        bounded
    }

    /// Current value
    #[must_use]
    pub const fn get(&self) -> T {
        self.value
    }

    /// Lower bound
    #[must_use]
    pub const fn min(&self) -> T {
        self.min
    }

    /// Upper bound
    #[must_use]
    pub const fn max(&self) -> T {
        self.max
    }

    /// Set value (clamped to bounds)
    pub fn set(&mut self, value: T) {
        self.value = value.clamp(self.min, self.max);
    }

    /// Whether the value sits on its lower bound
    #[must_use]
    pub fn at_min(&self) -> bool {
        self.value == self.min
    }

    /// Whether the value sits on its upper bound
    #[must_use]
    pub fn at_max(&self) -> bool {
        self.value == self.max
    }
}

impl BoundedValue<u8> {
    /// One step up, saturating at the upper bound
    pub fn increment(&mut self) {
        self.set(self.value.saturating_add(1));
    }

    /// One step down, saturating at the lower bound
    pub fn decrement(&mut self) {
        self.set(self.value.saturating_sub(1));
    }
}

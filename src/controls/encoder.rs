//! Rotary Encoder Decoding
//!
//! Each front-panel encoder is wired to a timer in quadrature mode, so the
//! hardware does the edge counting. This module turns the free-running
//! counter into one step per poll.
//!
//! The counter wraps at `counter_max`. A jump `max -> 0` or `0 -> max`
//! between two polls is a single step across the wrap point; any other
//! change is signed by `previous - current`, because the timer counts down
//! for clockwise rotation on this board. [`Polarity::Inverted`] flips the
//! reported direction for encoders wired the other way round.

use crate::device::{Pollable, Startable};
use crate::types::AmpError;

/// Encoder rotation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise rotation (increment)
    Clockwise,
    /// Counter-clockwise rotation (decrement)
    CounterClockwise,
}

impl Direction {
    /// Direction of a signed delta; `None` for zero
    #[must_use]
    pub const fn from_delta(delta: i64) -> Option<Self> {
        if delta > 0 {
            Some(Self::Clockwise)
        } else if delta < 0 {
            Some(Self::CounterClockwise)
        } else {
            None
        }
    }

    /// `+1` clockwise, `-1` counter-clockwise
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Clockwise => 1,
            Self::CounterClockwise => -1,
        }
    }

    /// The opposite direction
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Direction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Clockwise => defmt::write!(f, "CW"),
            Self::CounterClockwise => defmt::write!(f, "CCW"),
        }
    }
}

/// Source of a raw quadrature count
pub trait CounterReader {
    /// Current counter value
    fn read_counter(&mut self) -> u32;
}

impl<R: CounterReader + ?Sized> CounterReader for &mut R {
    fn read_counter(&mut self) -> u32 {
        (**self).read_counter()
    }
}

/// Mapping between counter direction and knob direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Counting down is clockwise
    #[default]
    Normal,
    /// Counting up is clockwise
    Inverted,
}

/// Encoder scaling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Largest raw counter value before wrapping
    pub counter_max: u32,
    /// Raw counts per reported step
    pub step_divisor: u32,
    /// Direction mapping
    pub polarity: Polarity,
}

impl EncoderConfig {
    /// Config for a counter wrapping at `counter_max`
    #[must_use]
    pub const fn new(counter_max: u32, step_divisor: u32) -> Self {
        Self {
            counter_max,
            step_divisor,
            polarity: Polarity::Normal,
        }
    }

    /// Same config with a different polarity
    #[must_use]
    pub const fn with_polarity(self, polarity: Polarity) -> Self {
        Self { polarity, ..self }
    }

    /// Largest value after scaling by the divisor
    #[must_use]
    pub const fn scaled_max(&self) -> u32 {
        self.counter_max / self.divisor()
    }

    const fn divisor(&self) -> u32 {
        if self.step_divisor == 0 {
            1
        } else {
            self.step_divisor
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new(0xFFFF, 1)
    }
}

/// Signed movement between two scaled counter samples
///
/// Crossing the wrap point counts as one step in the direction of travel.
#[must_use]
pub fn counter_delta(previous: u32, current: u32, max: u32) -> i64 {
    if previous == max && current == 0 {
        -1
    } else if previous == 0 && current == max {
        1
    } else {
        i64::from(previous) - i64::from(current)
    }
}

/// Poll-driven decoder over one hardware counter
pub struct EncoderDecoder<R> {
    reader: R,
    config: EncoderConfig,
    previous: u32,
}

impl<R: CounterReader> EncoderDecoder<R> {
    /// Create a decoder; the baseline is zero until [`start`](Self::start)
    pub const fn new(reader: R, config: EncoderConfig) -> Self {
        Self {
            reader,
            config,
            previous: 0,
        }
    }

    /// Re-baseline from the current counter value
    pub fn start(&mut self) {
        self.previous = self.sample();
    }

    /// One step in the direction of travel, `None` if the counter is unchanged
    ///
    /// Larger jumps still report a single step.
    pub fn poll(&mut self) -> Option<Direction> {
        let current = self.sample();
        if current == self.previous {
            return None;
        }
        let delta = counter_delta(self.previous, current, self.config.scaled_max());
        trace!("encoder {} -> {}", self.previous, current);
        self.previous = current;

        let direction = Direction::from_delta(delta)?;
        Some(match self.config.polarity {
            Polarity::Normal => direction,
            Polarity::Inverted => direction.reversed(),
        })
    }

    /// Poll and hand a `+1`/`-1` step to `handler`
    pub fn periodic<F: FnOnce(i8)>(&mut self, handler: F) {
        if let Some(direction) = self.poll() {
            handler(direction.sign());
        }
    }

    /// Last scaled sample
    #[must_use]
    pub const fn previous(&self) -> u32 {
        self.previous
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> EncoderConfig {
        self.config
    }

    /// Release the counter
    pub fn release(self) -> R {
        self.reader
    }

    fn sample(&mut self) -> u32 {
        let raw = self.reader.read_counter().min(self.config.counter_max);
        raw / self.config.divisor()
    }
}

impl<R: CounterReader> Startable for EncoderDecoder<R> {
    type Params = ();

    fn start(&mut self, (): ()) -> Result<(), AmpError> {
        EncoderDecoder::start(self);
        Ok(())
    }

    fn stop(&mut self) {}
}

impl<R: CounterReader> Pollable for EncoderDecoder<R> {
    type Event = Direction;

    fn poll(&mut self) -> Option<Direction> {
        EncoderDecoder::poll(self)
    }
}

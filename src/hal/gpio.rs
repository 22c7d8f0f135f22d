//! GPIO Abstractions
//!
//! Type-safe wrappers giving the amplifier's output pins a meaning: LEDs,
//! the amplifier mute/enable pair and the output gain select lines.
//!
//! Everything is generic over `embedded_hal` output pins whose writes cannot
//! fail (`Error = Infallible`), which covers MCU GPIO and the host mocks.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::types::{InputChannel, OutputGain};

/// Drive an infallible pin
pub fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    pin.set_state(PinState::from(high))
        .unwrap_or_else(|never| match never {});
}

/// LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Which LED terminal is tied to the pin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedWiring {
    /// Pin drives the anode: high is on
    Anode,
    /// Pin sinks the cathode: low is on
    Cathode,
}

/// Single LED
pub struct Led<P> {
    pin: P,
    wiring: LedWiring,
    state: LedState,
}

impl<P: OutputPin<Error = Infallible>> Led<P> {
    /// Wrap a pin and switch the LED off
    pub fn new(pin: P, wiring: LedWiring) -> Self {
        let mut led = Self {
            pin,
            wiring,
            state: LedState::On,
        };
        led.off();
        led
    }

    /// Set a state
    pub fn set(&mut self, state: LedState) {
        let on = state == LedState::On;
        let high = match self.wiring {
            LedWiring::Anode => on,
            LedWiring::Cathode => !on,
        };
        drive(&mut self.pin, high);
        self.state = state;
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.set(LedState::On);
    }

    /// Turn LED off
    pub fn off(&mut self) {
        self.set(LedState::Off);
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        self.set(self.state.toggle());
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }

    /// Whether the LED is lit
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state == LedState::On
    }
}

/// Status LED plus one LED per input
pub struct PanelLeds<P> {
    /// Activity LED
    pub status: Led<P>,
    inputs: [Led<P>; 4],
}

impl<P: OutputPin<Error = Infallible>> PanelLeds<P> {
    /// Group the panel LEDs; input LEDs in panel order
    pub fn new(status: Led<P>, inputs: [Led<P>; 4]) -> Self {
        Self { status, inputs }
    }

    /// Light only the LED of `input`
    pub fn show_input(&mut self, input: InputChannel) {
        for (i, led) in self.inputs.iter_mut().enumerate() {
            led.set(if i == input.index() {
                LedState::On
            } else {
                LedState::Off
            });
        }
    }

    /// Set one input LED without touching the others
    pub fn set_input(&mut self, input: InputChannel, state: LedState) {
        self.inputs[input.index()].set(state);
    }

    /// Toggle one input LED
    pub fn toggle_input(&mut self, input: InputChannel) {
        self.inputs[input.index()].toggle();
    }

    /// State of one input LED
    #[must_use]
    pub fn input_state(&self, input: InputChannel) -> LedState {
        self.inputs[input.index()].state()
    }

    /// Everything dark
    pub fn all_off(&mut self) {
        self.status.off();
        for led in &mut self.inputs {
            led.off();
        }
    }
}

/// Amplifier mute and enable switches
///
/// Both lines are active low. Unmuting enables the power stage first and
/// releases the mute after it settles; muting runs the same sequence in
/// reverse so neither edge pops.
pub struct AmpPower<P> {
    mute: P,
    enable: P,
    muted: bool,
}

impl<P: OutputPin<Error = Infallible>> AmpPower<P> {
    /// Take the pins and hold the amplifier muted and disabled
    pub fn new(mute: P, enable: P) -> Self {
        let mut power = Self {
            mute,
            enable,
            muted: true,
        };
        power.force_mute();
        power
    }

    /// Enable, settle, release mute
    pub fn unmute<D: DelayNs>(&mut self, delay: &mut D, settle_ms: u32) {
        drive(&mut self.enable, false);
        delay.delay_ms(settle_ms);
        drive(&mut self.mute, true);
        self.muted = false;
        debug!("amplifier on");
    }

    /// Mute, settle, disable
    pub fn mute<D: DelayNs>(&mut self, delay: &mut D, settle_ms: u32) {
        drive(&mut self.mute, false);
        delay.delay_ms(settle_ms);
        drive(&mut self.enable, true);
        self.muted = true;
        debug!("amplifier off");
    }

    /// Mute and disable at once; for fault paths
    pub fn force_mute(&mut self) {
        drive(&mut self.mute, false);
        drive(&mut self.enable, true);
        self.muted = true;
    }

    /// Whether the output is muted
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }
}

/// Two-bit output gain select
pub struct GainSelector<P> {
    gain0: P,
    gain1: P,
    gain: OutputGain,
}

impl<P: OutputPin<Error = Infallible>> GainSelector<P> {
    /// Take the pins and select the lowest gain
    pub fn new(gain0: P, gain1: P) -> Self {
        let mut selector = Self {
            gain0,
            gain1,
            gain: OutputGain::default(),
        };
        selector.set(OutputGain::default());
        selector
    }

    /// Select a gain step
    pub fn set(&mut self, gain: OutputGain) {
        let (g0, g1) = gain.pin_levels();
        drive(&mut self.gain0, g0);
        drive(&mut self.gain1, g1);
        self.gain = gain;
    }

    /// Selected gain step
    #[must_use]
    pub const fn gain(&self) -> OutputGain {
        self.gain
    }
}

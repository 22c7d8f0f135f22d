//! Front-panel application logic
//!
//! Ties the encoders and keys to the audio processor, the amplifier
//! switches, the LEDs and the persisted settings. Runs entirely in loop
//! context; every method returns quickly apart from the amplifier switch
//! settle delays.
//!
//! | Input                | Effect                                          |
//! |----------------------|-------------------------------------------------|
//! | volume encoder       | volume ±1, mute at 0, unmute when leaving 0     |
//! | bass/treble encoder  | tone ±1                                         |
//! | key 1..4             | select input (saved immediately)                |
//! | keys 1+2             | input gain mode: key 1 down, key 2 up           |
//! | keys 3+4             | output gain mode: key 3 down, key 4 up          |
//!
//! Encoder changes are saved after
//! [`EEPROM_SAVE_DELAY_MS`](crate::config::EEPROM_SAVE_DELAY_MS) of quiet.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use crate::config::AMP_SWITCH_DELAY_MS;
use crate::controls::{Direction, KeyPress};
use crate::drivers::tda7439::{Tda7439, ToneBand};
use crate::hal::gpio::{AmpPower, GainSelector, LedState, PanelLeds};
use crate::persist::ByteStorage;
use crate::types::{AmpError, Control, InputChannel, OutputGain};

use super::settings::{Setting, Settings};

/// What an up/down step adjusts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Mode {
    /// Input selection
    #[default]
    Input,
    /// Input gain
    InputGain,
    /// Output gain
    OutputGain,
    /// Volume
    Volume,
    /// Processor mute (up mutes, down unmutes)
    Mute,
    /// Bass tone
    Bass,
    /// Middle tone
    Middle,
    /// Treble tone
    Treble,
}

impl From<Control> for Mode {
    fn from(control: Control) -> Self {
        match control {
            Control::Volume => Self::Volume,
            Control::Bass => Self::Bass,
            Control::Treble => Self::Treble,
        }
    }
}

/// Map any bus error onto the firmware error
fn bus<E>(_: E) -> AmpError {
    AmpError::Bus
}

/// Amplifier front panel
pub struct AmpController<I2C, S, P, D> {
    dsp: Tda7439<I2C>,
    settings: Settings<S>,
    power: AmpPower<P>,
    gain: GainSelector<P>,
    leds: PanelLeds<P>,
    delay: D,
    mode: Mode,
}

impl<I2C, S, P, D> AmpController<I2C, S, P, D>
where
    I2C: I2c,
    S: ByteStorage,
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    /// Assemble the controller from its parts
    pub fn new(
        dsp: Tda7439<I2C>,
        settings: Settings<S>,
        power: AmpPower<P>,
        gain: GainSelector<P>,
        leds: PanelLeds<P>,
        delay: D,
    ) -> Self {
        Self {
            dsp,
            settings,
            power,
            gain,
            leds,
            delay,
            mode: Mode::Input,
        }
    }

    /// Restore saved settings into the hardware, then unmute unless the
    /// saved volume is zero
    ///
    /// # Errors
    /// `Bus` if the EEPROM or the audio processor does not respond; the
    /// amplifier stays muted.
    pub fn init(&mut self) -> Result<(), AmpError> {
        self.leds.status.on();
        let restored = self.restore();
        self.leds.status.off();
        restored?;

        if self.dsp.is_volume_min() {
            info!("volume 0, staying muted");
        } else {
            self.amp_unmute();
        }
        Ok(())
    }

    /// One encoder detent
    ///
    /// # Errors
    /// `Bus` if the audio processor write failed.
    pub fn on_rotate(&mut self, control: Control, direction: Direction, now_ms: u32) -> Result<(), AmpError> {
        let mode = Mode::from(control);
        self.step(mode, direction)?;
        if let Some((setting, value)) = self.persisted(mode) {
            self.settings.schedule(setting, value, now_ms);
        }
        Ok(())
    }

    /// One key press
    ///
    /// # Errors
    /// `Bus` if a device write failed.
    pub fn on_key(&mut self, press: KeyPress) -> Result<(), AmpError> {
        let held = press.held;
        if held.count() <= 1 {
            match (self.mode, press.key) {
                (Mode::InputGain, 1) | (Mode::OutputGain, 3) => {
                    self.adjust_gain(Direction::CounterClockwise)
                }
                (Mode::InputGain, 2) | (Mode::OutputGain, 4) => self.adjust_gain(Direction::Clockwise),
                _ => self.select_input(press.key),
            }
        } else if held.contains(1) && held.contains(2) {
            self.enter_gain_mode(Mode::InputGain, 1, 2);
            Ok(())
        } else if held.contains(3) && held.contains(4) {
            self.enter_gain_mode(Mode::OutputGain, 3, 4);
            Ok(())
        } else {
            Ok(())
        }
    }

    /// Once-per-second housekeeping: blink the active input while muted
    pub fn on_second(&mut self) {
        if self.power.is_muted() {
            self.leds.toggle_input(self.dsp.input());
        }
    }

    /// Flush settings whose quiet period is over
    ///
    /// # Errors
    /// `Bus` if the EEPROM write failed.
    pub fn tick(&mut self, now_ms: u32) -> Result<usize, AmpError> {
        self.settings.tick(now_ms).map_err(bus)
    }

    /// Mute and disable the amplifier immediately and darken the panel
    pub fn engage_safe_state(&mut self) {
        self.power.force_mute();
        self.leds.all_off();
        warn!("amplifier forced into safe state");
    }

    /// Current key mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Audio processor
    pub const fn dsp(&self) -> &Tda7439<I2C> {
        &self.dsp
    }

    /// Persisted settings
    pub const fn settings(&self) -> &Settings<S> {
        &self.settings
    }

    /// Persisted settings, mutably
    pub fn settings_mut(&mut self) -> &mut Settings<S> {
        &mut self.settings
    }

    /// Amplifier switches
    pub const fn power(&self) -> &AmpPower<P> {
        &self.power
    }

    /// Selected output gain
    #[must_use]
    pub const fn output_gain(&self) -> OutputGain {
        self.gain.gain()
    }

    /// Panel LEDs
    pub const fn leds(&self) -> &PanelLeds<P> {
        &self.leds
    }

    fn restore(&mut self) -> Result<(), AmpError> {
        let input = InputChannel::new(self.load(Setting::InputChannel)?).unwrap_or_default();
        self.dsp.set_input(input).map_err(bus)?;
        self.leds.show_input(input);

        let volume = self.load(Setting::Volume)?;
        self.dsp.set_volume(volume).map_err(bus)?;
        self.dsp.set_speaker_attenuation(0, 0).map_err(bus)?;

        let bass = self.load(Setting::Bass)?;
        self.dsp.set_tone(ToneBand::Bass, bass).map_err(bus)?;
        self.dsp.set_tone(ToneBand::Middle, 0).map_err(bus)?;
        let treble = self.load(Setting::Treble)?;
        self.dsp.set_tone(ToneBand::Treble, treble).map_err(bus)?;

        let input_gain = self.load(Setting::InputGain)?;
        self.dsp.set_input_gain(input_gain).map_err(bus)?;

        let gain = OutputGain::new(self.load(Setting::OutputGain)?).unwrap_or_default();
        self.gain.set(gain);

        info!(
            "restored {} vol={} bass={} treble={} in_gain={} out_gain={}",
            input,
            volume,
            bass,
            treble,
            input_gain,
            gain
        );
        Ok(())
    }

    fn load(&mut self, setting: Setting) -> Result<u8, AmpError> {
        self.settings.load(setting).map_err(bus)
    }

    /// Setting backing a mode and its current value
    fn persisted(&self, mode: Mode) -> Option<(Setting, u8)> {
        match mode {
            Mode::Input => Some((Setting::InputChannel, self.dsp.input().number())),
            Mode::InputGain => Some((Setting::InputGain, self.dsp.input_gain())),
            Mode::OutputGain => Some((Setting::OutputGain, self.gain.gain().step())),
            Mode::Volume => Some((Setting::Volume, self.dsp.volume())),
            Mode::Bass => Some((Setting::Bass, self.dsp.tone(ToneBand::Bass))),
            Mode::Treble => Some((Setting::Treble, self.dsp.tone(ToneBand::Treble))),
            Mode::Mute | Mode::Middle => None,
        }
    }

    fn step(&mut self, mode: Mode, direction: Direction) -> Result<(), AmpError> {
        self.leds.status.on();
        let result = match direction {
            Direction::Clockwise => self.step_up(mode),
            Direction::CounterClockwise => self.step_down(mode),
        };
        self.leds.status.off();
        debug!("{} {}", mode, direction);
        result
    }

    fn step_up(&mut self, mode: Mode) -> Result<(), AmpError> {
        match mode {
            Mode::Input => {
                self.dsp.input_up().map_err(bus)?;
                self.leds.show_input(self.dsp.input());
            }
            Mode::InputGain => self.dsp.input_gain_up().map_err(bus)?,
            Mode::OutputGain => self.gain.set(self.gain.gain().up()),
            Mode::Volume => {
                if self.dsp.is_volume_min() {
                    self.amp_unmute();
                }
                self.dsp.volume_up().map_err(bus)?;
            }
            Mode::Mute => self.dsp.mute().map_err(bus)?,
            Mode::Bass => self.dsp.tone_up(ToneBand::Bass).map_err(bus)?,
            Mode::Middle => self.dsp.tone_up(ToneBand::Middle).map_err(bus)?,
            Mode::Treble => self.dsp.tone_up(ToneBand::Treble).map_err(bus)?,
        }
        Ok(())
    }

    fn step_down(&mut self, mode: Mode) -> Result<(), AmpError> {
        match mode {
            Mode::Input => {
                self.dsp.input_down().map_err(bus)?;
                self.leds.show_input(self.dsp.input());
            }
            Mode::InputGain => self.dsp.input_gain_down().map_err(bus)?,
            Mode::OutputGain => self.gain.set(self.gain.gain().down()),
            Mode::Volume => {
                self.dsp.volume_down().map_err(bus)?;
                if self.dsp.is_volume_min() && !self.power.is_muted() {
                    self.amp_mute();
                }
            }
            Mode::Mute => self.dsp.unmute().map_err(bus)?,
            Mode::Bass => self.dsp.tone_down(ToneBand::Bass).map_err(bus)?,
            Mode::Middle => self.dsp.tone_down(ToneBand::Middle).map_err(bus)?,
            Mode::Treble => self.dsp.tone_down(ToneBand::Treble).map_err(bus)?,
        }
        Ok(())
    }

    /// Gain key in a gain mode: step and save right away
    fn adjust_gain(&mut self, direction: Direction) -> Result<(), AmpError> {
        let mode = self.mode;
        self.step(mode, direction)?;
        match self.persisted(mode) {
            Some((setting, value)) => self.settings.store(setting, value).map_err(bus),
            None => Ok(()),
        }
    }

    fn select_input(&mut self, key: u8) -> Result<(), AmpError> {
        let Some(input) = InputChannel::new(key) else {
            return Ok(());
        };
        self.mode = Mode::Input;
        self.dsp.set_input(input).map_err(bus)?;
        self.leds.show_input(input);
        self.settings
            .store(Setting::InputChannel, input.number())
            .map_err(bus)
    }

    /// Light the LEDs of the two chord keys
    fn enter_gain_mode(&mut self, mode: Mode, first: u8, second: u8) {
        self.mode = mode;
        if let (Some(a), Some(b)) = (InputChannel::new(first), InputChannel::new(second)) {
            self.leds.show_input(a);
            self.leds.set_input(b, LedState::On);
        }
        info!("{} mode", mode);
    }

    fn amp_unmute(&mut self) {
        self.power.unmute(&mut self.delay, AMP_SWITCH_DELAY_MS);
        self.leds.set_input(self.dsp.input(), LedState::On);
    }

    fn amp_mute(&mut self) {
        self.leds.set_input(self.dsp.input(), LedState::Off);
        self.power.mute(&mut self.delay, AMP_SWITCH_DELAY_MS);
    }
}

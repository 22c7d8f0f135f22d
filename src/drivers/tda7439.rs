//! TDA7439 Audio Processor Driver
//!
//! Three-band tone control, input selector and volume over I2C. The chip is
//! write-only: every register write is a `[register, value]` pair and the
//! driver keeps a shadow copy of each setting.
//!
//! Settings are stored in panel units (volume 0..=40 with 0 = silent, tone
//! 0..=14 with 7 = flat) and converted to chip codes on write.

use embedded_hal::i2c::I2c;

use crate::types::{BoundedValue, InputChannel};

/// Register addresses
mod reg {
    pub const INPUT_SELECT: u8 = 0x00;
    pub const INPUT_GAIN: u8 = 0x01;
    pub const VOLUME: u8 = 0x02;
    pub const BASS: u8 = 0x03;
    pub const MIDDLE: u8 = 0x04;
    pub const TREBLE: u8 = 0x05;
    pub const SPEAKER_ATT_RIGHT: u8 = 0x06;
    pub const SPEAKER_ATT_LEFT: u8 = 0x07;
}

/// Volume register value that mutes the output
pub const MUTE_CODE: u8 = 0x38;

/// Largest input gain step (2 dB each)
pub const INPUT_GAIN_MAX: u8 = 15;

/// Largest volume step
pub const VOLUME_MAX: u8 = 40;

/// Largest tone step
pub const TONE_MAX: u8 = 14;

/// Tone step with no boost or cut
pub const TONE_FLAT: u8 = 7;

/// Tone control band
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum ToneBand {
    /// Bass
    Bass,
    /// Middle
    Middle,
    /// Treble
    Treble,
}

impl ToneBand {
    const fn register(self) -> u8 {
        match self {
            Self::Bass => reg::BASS,
            Self::Middle => reg::MIDDLE,
            Self::Treble => reg::TREBLE,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Bass => 0,
            Self::Middle => 1,
            Self::Treble => 2,
        }
    }
}

/// Chip code for a tone step
///
/// Cuts (0..=7) map straight through; boosts 8..=14 run backwards as
/// 14..=8 in the register.
#[must_use]
pub const fn tone_code(step: u8) -> u8 {
    if step <= TONE_FLAT {
        step
    } else {
        (TONE_MAX + TONE_FLAT + 1).saturating_sub(step)
    }
}

/// Chip code selecting `input` (panel 1..=4 → code 3..=0)
#[must_use]
pub const fn input_code(input: InputChannel) -> u8 {
    InputChannel::MAX - input.number()
}

/// TDA7439 on an I2C bus
pub struct Tda7439<I2C> {
    i2c: I2C,
    address: u8,
    input: InputChannel,
    input_gain: BoundedValue<u8>,
    volume: BoundedValue<u8>,
    tone: [BoundedValue<u8>; 3],
    muted: bool,
}

impl<I2C: I2c> Tda7439<I2C> {
    /// Create the driver; nothing is written until a setter is called
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            input: InputChannel::default(),
            input_gain: BoundedValue::new(0, 0, INPUT_GAIN_MAX),
            volume: BoundedValue::new(0, 0, VOLUME_MAX),
            tone: [BoundedValue::new(TONE_FLAT, 0, TONE_MAX); 3],
            muted: false,
        }
    }

    /// Select an input
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn set_input(&mut self, input: InputChannel) -> Result<(), I2C::Error> {
        self.input = input;
        self.write(reg::INPUT_SELECT, input_code(input))
    }

    /// Selected input
    #[must_use]
    pub const fn input(&self) -> InputChannel {
        self.input
    }

    /// Next input, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn input_up(&mut self) -> Result<(), I2C::Error> {
        self.set_input(self.input.up())
    }

    /// Previous input, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn input_down(&mut self) -> Result<(), I2C::Error> {
        self.set_input(self.input.down())
    }

    /// Set input gain (clamped to 0..=15)
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn set_input_gain(&mut self, gain: u8) -> Result<(), I2C::Error> {
        self.input_gain.set(gain);
        self.write(reg::INPUT_GAIN, self.input_gain.get())
    }

    /// Input gain step
    #[must_use]
    pub const fn input_gain(&self) -> u8 {
        self.input_gain.get()
    }

    /// One input gain step up, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn input_gain_up(&mut self) -> Result<(), I2C::Error> {
        self.set_input_gain(self.input_gain.get().saturating_add(1))
    }

    /// One input gain step down, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn input_gain_down(&mut self) -> Result<(), I2C::Error> {
        self.set_input_gain(self.input_gain.get().saturating_sub(1))
    }

    /// Set volume (clamped to 0..=40); clears the mute
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn set_volume(&mut self, volume: u8) -> Result<(), I2C::Error> {
        self.volume.set(volume);
        self.muted = false;
        self.write(reg::VOLUME, VOLUME_MAX - self.volume.get())
    }

    /// Volume step
    #[must_use]
    pub const fn volume(&self) -> u8 {
        self.volume.get()
    }

    /// Whether the volume is at zero
    #[must_use]
    pub fn is_volume_min(&self) -> bool {
        self.volume.at_min()
    }

    /// One volume step up, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn volume_up(&mut self) -> Result<(), I2C::Error> {
        self.set_volume(self.volume.get().saturating_add(1))
    }

    /// One volume step down, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn volume_down(&mut self) -> Result<(), I2C::Error> {
        self.set_volume(self.volume.get().saturating_sub(1))
    }

    /// Mute the volume stage; the volume setting is kept
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn mute(&mut self) -> Result<(), I2C::Error> {
        self.muted = true;
        self.write(reg::VOLUME, MUTE_CODE)
    }

    /// Restore the stored volume
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn unmute(&mut self) -> Result<(), I2C::Error> {
        self.set_volume(self.volume.get())
    }

    /// Whether the volume stage is muted
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Set both speaker attenuators (raw register values)
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn set_speaker_attenuation(&mut self, left: u8, right: u8) -> Result<(), I2C::Error> {
        self.write(reg::SPEAKER_ATT_LEFT, left)?;
        self.write(reg::SPEAKER_ATT_RIGHT, right)
    }

    /// Set a tone band (clamped to 0..=14)
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn set_tone(&mut self, band: ToneBand, step: u8) -> Result<(), I2C::Error> {
        let slot = &mut self.tone[band.index()];
        slot.set(step);
        let code = tone_code(slot.get());
        self.write(band.register(), code)
    }

    /// Tone step of one band
    #[must_use]
    pub fn tone(&self, band: ToneBand) -> u8 {
        self.tone[band.index()].get()
    }

    /// One tone step up, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn tone_up(&mut self, band: ToneBand) -> Result<(), I2C::Error> {
        self.set_tone(band, self.tone(band).saturating_add(1))
    }

    /// One tone step down, saturating
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn tone_down(&mut self, band: ToneBand) -> Result<(), I2C::Error> {
        self.set_tone(band, self.tone(band).saturating_sub(1))
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        trace!("tda7439 [{=u8:#x}] <- {=u8:#x}", register, value);
        self.i2c.write(self.address, &[register, value]).map_err(|e| {
            warn!("tda7439 write to {=u8:#x} failed", register);
            e
        })
    }
}

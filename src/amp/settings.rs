//! Persisted panel settings
//!
//! Six one-byte EEPROM slots, each behind a [`DelayedByteStore`]. The
//! settings own the storage device so nothing else touches the EEPROM.

use crate::config::eeprom as layout;
use crate::persist::{or_default, ByteStorage, DelayedByteStore};

/// One persisted setting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Setting {
    /// Selected input (1..=4)
    InputChannel,
    /// Master volume
    Volume,
    /// Bass tone
    Bass,
    /// Treble tone
    Treble,
    /// Input gain
    InputGain,
    /// Output gain step
    OutputGain,
}

impl Setting {
    /// Every setting, in EEPROM order
    pub const ALL: [Self; 6] = [
        Self::InputChannel,
        Self::Volume,
        Self::Bass,
        Self::Treble,
        Self::InputGain,
        Self::OutputGain,
    ];

    /// EEPROM address
    #[must_use]
    pub const fn address(self) -> u16 {
        match self {
            Self::InputChannel => layout::INPUT_CHANNEL_ADDR,
            Self::Volume => layout::VOLUME_ADDR,
            Self::Bass => layout::BASS_ADDR,
            Self::Treble => layout::TREBLE_ADDR,
            Self::InputGain => layout::INPUT_GAIN_ADDR,
            Self::OutputGain => layout::OUTPUT_GAIN_ADDR,
        }
    }

    /// Value used when the cell is erased
    #[must_use]
    pub const fn default_value(self) -> u8 {
        match self {
            Self::InputChannel => layout::DEFAULT_INPUT_CHANNEL,
            Self::Volume => layout::DEFAULT_VOLUME,
            Self::Bass => layout::DEFAULT_BASS,
            Self::Treble => layout::DEFAULT_TREBLE,
            Self::InputGain => layout::DEFAULT_INPUT_GAIN,
            Self::OutputGain => layout::DEFAULT_OUTPUT_GAIN,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::InputChannel => 0,
            Self::Volume => 1,
            Self::Bass => 2,
            Self::Treble => 3,
            Self::InputGain => 4,
            Self::OutputGain => 5,
        }
    }
}

/// Settings store over a byte-addressed device
pub struct Settings<S> {
    storage: S,
    slots: [DelayedByteStore; 6],
    save_delay_ms: u32,
}

impl<S: ByteStorage> Settings<S> {
    /// Take ownership of the storage; changes are saved after `save_delay_ms`
    pub fn new(storage: S, save_delay_ms: u32) -> Self {
        Self {
            storage,
            slots: Setting::ALL.map(|s| DelayedByteStore::new(s.address())),
            save_delay_ms,
        }
    }

    /// Stored value, or the default for an erased cell
    ///
    /// # Errors
    /// Returns the storage error.
    pub fn load(&mut self, setting: Setting) -> Result<u8, S::Error> {
        let raw = self.slots[setting.index()].read(&mut self.storage)?;
        Ok(or_default(raw, setting.default_value()))
    }

    /// Write now, dropping any pending save
    ///
    /// # Errors
    /// Returns the storage error.
    pub fn store(&mut self, setting: Setting, value: u8) -> Result<(), S::Error> {
        self.slots[setting.index()].write(&mut self.storage, value)
    }

    /// Save after the quiet period, counted from `now_ms`
    pub fn schedule(&mut self, setting: Setting, value: u8, now_ms: u32) {
        self.slots[setting.index()].delayed_write(value, self.save_delay_ms, now_ms);
    }

    /// Flush every save whose quiet period is over; returns how many
    ///
    /// # Errors
    /// The first storage error; remaining slots are retried next tick.
    pub fn tick(&mut self, now_ms: u32) -> Result<usize, S::Error> {
        let mut written = 0;
        for slot in &mut self.slots {
            match slot.tick(&mut self.storage, now_ms) {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("settings save to {} failed", slot.address());
                    return Err(e);
                }
            }
        }
        Ok(written)
    }

    /// Whether a save is waiting for `setting`
    #[must_use]
    pub fn is_pending(&self, setting: Setting) -> bool {
        self.slots[setting.index()].is_pending()
    }

    /// Whether any save is waiting
    #[must_use]
    pub fn any_pending(&self) -> bool {
        self.slots.iter().any(DelayedByteStore::is_pending)
    }

    /// Borrow the storage device
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Borrow the storage device mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

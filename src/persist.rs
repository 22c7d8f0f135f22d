//! Delayed persistence
//!
//! The EEPROM endures a limited number of write cycles, and turning a knob
//! produces a burst of changes. Each persisted byte therefore sits behind a
//! [`DelayedByteStore`]: a change arms a deadline, further changes move it,
//! and one write happens after the knob has been quiet for the delay.

use crate::config::eeprom::ERASED;

/// Blocking byte-addressed storage
pub trait ByteStorage {
    /// Bus or device error
    type Error;

    /// Read one byte
    ///
    /// # Errors
    /// Returns the device error.
    fn read_byte(&mut self, address: u16) -> Result<u8, Self::Error>;

    /// Write one byte and wait until it is committed
    ///
    /// # Errors
    /// Returns the device error.
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), Self::Error>;
}

impl<S: ByteStorage + ?Sized> ByteStorage for &mut S {
    type Error = S::Error;

    fn read_byte(&mut self, address: u16) -> Result<u8, Self::Error> {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
        (**self).write_byte(address, value)
    }
}

/// Map an erased cell to `default`
#[must_use]
pub const fn or_default(raw: u8, default: u8) -> u8 {
    if raw == ERASED {
        default
    } else {
        raw
    }
}

/// A write waiting for its quiet period to pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingWrite {
    /// Byte to be written
    pub value: u8,
    since_ms: u32,
    delay_ms: u32,
}

impl PendingWrite {
    /// Whether the deadline has been reached at `now_ms`
    ///
    /// Uses wrapping arithmetic, so a deadline survives the 49-day rollover
    /// of a 32-bit millisecond clock.
    #[must_use]
    pub const fn is_due(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.since_ms) >= self.delay_ms
    }

    /// Absolute deadline (wrapping)
    #[must_use]
    pub const fn deadline_ms(&self) -> u32 {
        self.since_ms.wrapping_add(self.delay_ms)
    }
}

/// One persisted byte with write coalescing
#[derive(Clone, Copy, Debug)]
pub struct DelayedByteStore {
    address: u16,
    pending: Option<PendingWrite>,
}

impl DelayedByteStore {
    /// Slot for `address`, nothing pending
    #[must_use]
    pub const fn new(address: u16) -> Self {
        Self {
            address,
            pending: None,
        }
    }

    /// Storage address of this slot
    #[must_use]
    pub const fn address(&self) -> u16 {
        self.address
    }

    /// Read the stored byte now
    ///
    /// # Errors
    /// Returns the storage error.
    pub fn read<S: ByteStorage>(&self, storage: &mut S) -> Result<u8, S::Error> {
        storage.read_byte(self.address)
    }

    /// Write `value` now and drop any pending write
    ///
    /// # Errors
    /// Returns the storage error.
    pub fn write<S: ByteStorage>(&mut self, storage: &mut S, value: u8) -> Result<(), S::Error> {
        self.pending = None;
        storage.write_byte(self.address, value)?;
        debug!("eeprom[{}] <- {}", self.address, value);
        Ok(())
    }

    /// Write `value` once `delay_ms` have passed since `now_ms`
    ///
    /// Replaces any earlier pending value and deadline.
    pub fn delayed_write(&mut self, value: u8, delay_ms: u32, now_ms: u32) {
        self.pending = Some(PendingWrite {
            value,
            since_ms: now_ms,
            delay_ms,
        });
    }

    /// Perform the pending write if its deadline has been reached
    ///
    /// Returns whether a write was issued. The pending write is consumed
    /// even if the storage reports an error.
    ///
    /// # Errors
    /// Returns the storage error.
    pub fn tick<S: ByteStorage>(&mut self, storage: &mut S, now_ms: u32) -> Result<bool, S::Error> {
        match self.pending {
            Some(pending) if pending.is_due(now_ms) => {
                self.pending = None;
                storage.write_byte(self.address, pending.value)?;
                debug!("eeprom[{}] <- {} (delayed)", self.address, pending.value);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The write waiting for its deadline, if any
    #[must_use]
    pub const fn pending(&self) -> Option<PendingWrite> {
        self.pending
    }

    /// Whether a write is waiting
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending write without touching storage
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

//! Device capabilities
//!
//! Peripherals expose what they can do through small traits instead of a
//! class hierarchy. A device implements only the capabilities it has and the
//! application composes them by ownership.

use crate::types::{AmpError, TransferState};

/// A device with an explicit start/stop lifecycle
pub trait Startable {
    /// Parameters needed to start
    type Params;

    /// Bring the device into its running state
    ///
    /// # Errors
    /// Returns the reason the device could not start.
    fn start(&mut self, params: Self::Params) -> Result<(), AmpError>;

    /// Return the device to an inert state
    fn stop(&mut self);
}

/// A device that sends buffers asynchronously
pub trait Transferable {
    /// Word type moved per transfer
    type Word: Copy;

    /// Start sending `data` without blocking
    ///
    /// # Errors
    /// `AmpError::Busy` while a transfer is in flight, `AmpError::Transfer`
    /// when the hardware refuses the request.
    fn begin_transmit(&mut self, data: &[Self::Word]) -> Result<(), AmpError>;

    /// Current transfer state
    fn transfer_state(&self) -> TransferState;
}

/// A device serviced from the main loop
pub trait Pollable {
    /// What one poll can report
    type Event;

    /// Service the device once; `None` when nothing happened
    fn poll(&mut self) -> Option<Self::Event>;
}

//! Transfer Completion State Machine
//!
//! Shared by every asynchronous peripheral (I2S DMA, logger DMA, I2C/SPI DMA).
//!
//! ```text
//!            begin_transmit                on_complete
//!   Idle ─────────────────► Busy ─────────────────────► CompletedOk
//!    ▲                       │  ▲                            │
//!    │          on_error     │  └──── Rearm::transmit ───────┤
//!    │                       ▼                               │
//!    └──────── poll ─────── Error ◄── rearm failed ──────────┘
//!    ▲
//!    └── stop (from any state)
//! ```
//!
//! Interrupt handlers only move the state out of `Busy`. The main loop starts
//! transfers and acknowledges outcomes with `poll`. The state is one atomic
//! byte, so the loop sees either the value before a callback or the value
//! after it.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::device::{Pollable, Transferable};
use crate::types::{AmpError, TransferState};

/// Reason a transport refused to arm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum TransportError {
    /// Channel still running
    Busy,
    /// Peripheral reported a fault
    Hardware,
}

/// Hardware side of an asynchronous transfer
///
/// Implemented by a DMA channel, an I2S peripheral or a UART. The
/// implementation calls back into [`AsyncTransfer::on_complete`] or
/// [`AsyncTransfer::on_error`] from its interrupt vector.
pub trait Transport {
    /// Word moved per DMA beat
    type Word: Copy;

    /// Program the hardware to send `data`; must not block
    ///
    /// # Errors
    /// Returns why the transfer could not be armed.
    fn arm(&mut self, data: &[Self::Word]) -> Result<(), TransportError>;

    /// Abort whatever is in flight
    fn cancel(&mut self);
}

/// Atomic holder for one [`TransferState`]
#[derive(Debug)]
pub struct TransferCell(AtomicU8);

impl TransferCell {
    /// New cell in `Idle`
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(TransferState::Idle as u8))
    }

    /// Snapshot the state
    pub fn load(&self) -> TransferState {
        TransferState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Overwrite the state unconditionally
    pub fn store(&self, state: TransferState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Move `from -> to`; `false` if the state was not `from`
    pub fn transition(&self, from: TransferState, to: TransferState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for TransferCell {
    fn default() -> Self {
        Self::new()
    }
}

/// One asynchronous transport plus its completion state
pub struct AsyncTransfer<T: Transport> {
    transport: T,
    state: TransferCell,
    completions: u32,
}

impl<T: Transport> AsyncTransfer<T> {
    /// Wrap a transport; starts `Idle`
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            state: TransferCell::new(),
            completions: 0,
        }
    }

    /// Start sending `data`
    ///
    /// # Errors
    /// `Busy` unless the state is `Idle` (the transport is not touched);
    /// `Transfer` when the transport refuses, leaving the state `Idle`.
    pub fn begin_transmit(&mut self, data: &[T::Word]) -> Result<(), AmpError> {
        if self.state.load() != TransferState::Idle {
            return Err(AmpError::Busy);
        }
        // Published before arming: a completion may fire as soon as the
        // hardware is running.
        self.state.store(TransferState::Busy);
        if self.transport.arm(data).is_err() {
            self.state.store(TransferState::Idle);
            warn!("transport refused to arm");
            return Err(AmpError::Transfer);
        }
        Ok(())
    }

    /// Completion callback; interrupt context
    ///
    /// No-op returning `false` unless `Busy`. Otherwise moves to
    /// `CompletedOk` and then runs `hook`, which may re-arm through the
    /// [`Rearm`] handle.
    pub fn on_complete<F>(&mut self, hook: F) -> bool
    where
        F: FnOnce(&mut Rearm<'_, T>),
    {
        if !self
            .state
            .transition(TransferState::Busy, TransferState::CompletedOk)
        {
            trace!("completion ignored (not busy)");
            return false;
        }
        self.completions = self.completions.wrapping_add(1);
        let mut rearm = Rearm {
            transport: &mut self.transport,
            state: &self.state,
            armed: false,
        };
        hook(&mut rearm);
        true
    }

    /// Error callback; interrupt context. No retry.
    pub fn on_error(&self) -> bool {
        self.state
            .transition(TransferState::Busy, TransferState::Error)
    }

    /// Cancel the transport and force `Idle`
    pub fn stop(&mut self) {
        self.transport.cancel();
        self.state.store(TransferState::Idle);
    }

    /// Acknowledge a settled outcome back to `Idle`
    ///
    /// `None` while `Idle` or `Busy`.
    pub fn take_outcome(&self) -> Option<Result<(), AmpError>> {
        match self.state.load() {
            TransferState::CompletedOk => self
                .state
                .transition(TransferState::CompletedOk, TransferState::Idle)
                .then_some(Ok(())),
            TransferState::Error => self
                .state
                .transition(TransferState::Error, TransferState::Idle)
                .then_some(Err(AmpError::Transfer)),
            TransferState::Idle | TransferState::Busy => None,
        }
    }

    /// Current state
    pub fn state(&self) -> TransferState {
        self.state.load()
    }

    /// Completions accepted since construction (wrapping)
    #[must_use]
    pub const fn completions(&self) -> u32 {
        self.completions
    }

    /// Borrow the transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Transferable for AsyncTransfer<T> {
    type Word = T::Word;

    fn begin_transmit(&mut self, data: &[Self::Word]) -> Result<(), AmpError> {
        AsyncTransfer::begin_transmit(self, data)
    }

    fn transfer_state(&self) -> TransferState {
        self.state()
    }
}

impl<T: Transport> Pollable for AsyncTransfer<T> {
    type Event = Result<(), AmpError>;

    fn poll(&mut self) -> Option<Self::Event> {
        self.take_outcome()
    }
}

/// Handle passed to a completion hook for chaining the next transfer
pub struct Rearm<'a, T: Transport> {
    transport: &'a mut T,
    state: &'a TransferCell,
    armed: bool,
}

impl<T: Transport> Rearm<'_, T> {
    /// Arm the next transfer; the state is `Busy` again on success
    ///
    /// # Errors
    /// `Busy` if this hook already re-armed; `Transfer` if the transport
    /// refused, which leaves the state in `Error`.
    pub fn transmit(&mut self, data: &[T::Word]) -> Result<(), AmpError> {
        if self.armed {
            return Err(AmpError::Busy);
        }
        self.state.store(TransferState::Busy);
        match self.transport.arm(data) {
            Ok(()) => {
                self.armed = true;
                Ok(())
            }
            Err(_) => {
                self.state.store(TransferState::Error);
                Err(AmpError::Transfer)
            }
        }
    }

    /// Whether the hook chained a new transfer
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }
}

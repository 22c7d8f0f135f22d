//! Double-Buffered Streaming
//!
//! Two fixed buffers: DMA drains one while the producer refills the other.
//!
//! ```text
//!   start ──► hardware owns B, producer may write A
//!   drained ──► hardware owns A, producer may write B, refill requested
//!   drained ──► hardware owns B, producer may write A, refill requested
//! ```
//!
//! `refill_requested` is set once per drained buffer and cleared once by
//! [`DoubleBufferStreamer::confirm_filled`]. A drain that finds the flag still
//! set counts as an overrun: the hardware replayed stale data.

use crate::device::{Pollable, Startable};
use crate::types::{AmpError, TransferState};

use super::state::{AsyncTransfer, Transport};
use super::waveform::{self, SourceMode, MSB_OFFSET};

/// Which of the two stream buffers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum BufferId {
    /// First buffer
    A,
    /// Second buffer
    B,
}

impl BufferId {
    /// The opposite buffer
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Continuous DMA output from two `N`-word buffers
pub struct DoubleBufferStreamer<T: Transport<Word = u16>, const N: usize> {
    transfer: AsyncTransfer<T>,
    buffers: [[u16; N]; 2],
    hardware_owned: Option<BufferId>,
    refill_requested: bool,
    source: SourceMode,
    overruns: u32,
}

impl<T: Transport<Word = u16>, const N: usize> DoubleBufferStreamer<T, N> {
    /// Words per buffer
    pub const BLOCK_SIZE: usize = N;

    /// Create a stopped streamer with silent buffers
    pub const fn new(transport: T) -> Self {
        Self {
            transfer: AsyncTransfer::new(transport),
            buffers: [[MSB_OFFSET; N]; 2],
            hardware_owned: None,
            refill_requested: false,
            source: SourceMode::Stream,
            overruns: 0,
        }
    }

    /// Load both buffers for `source` and start draining buffer B
    ///
    /// # Errors
    /// `Busy` while a stream is running or its last outcome has not been
    /// taken with [`poll`](Self::poll); `Transfer` if the transport refuses.
    pub fn start(&mut self, source: SourceMode) -> Result<(), AmpError> {
        let state = self.transfer.state();
        if self.hardware_owned.is_some() || state != TransferState::Idle {
            return Err(AmpError::Busy);
        }

        let [a, b] = &mut self.buffers;
        waveform::fill(source, a, b);
        self.source = source;
        self.refill_requested = false;

        self.transfer
            .begin_transmit(&self.buffers[BufferId::B.index()])?;
        self.hardware_owned = Some(BufferId::B);
        info!("stream started: {} words x 2, {}", N, source);
        Ok(())
    }

    /// Buffer-drained callback; interrupt context
    ///
    /// Flips ownership and re-arms on the other buffer. Returns `false` when
    /// the stream is stopped. If re-arming fails the stream goes inactive and
    /// the failure shows up on the next [`poll`](Self::poll).
    pub fn on_buffer_drained(&mut self) -> bool {
        let Some(current) = self.hardware_owned else {
            return false;
        };
        let next = current.other();

        let Self {
            transfer, buffers, ..
        } = self;
        let mut rearmed = false;
        let accepted = transfer.on_complete(|rearm| {
            rearmed = rearm.transmit(&buffers[next.index()]).is_ok();
        });
        if !accepted {
            return false;
        }

        if rearmed {
            if self.refill_requested {
                self.overruns = self.overruns.wrapping_add(1);
            }
            self.hardware_owned = Some(next);
            self.refill_requested = true;
        } else {
            self.hardware_owned = None;
            self.refill_requested = false;
        }
        true
    }

    /// Hardware error callback; interrupt context
    pub fn on_transfer_error(&mut self) -> bool {
        if !self.transfer.on_error() {
            return false;
        }
        self.hardware_owned = None;
        self.refill_requested = false;
        true
    }

    /// The buffer the producer may write, `None` when not streaming
    pub fn fillable_buffer(&mut self) -> Option<&mut [u16; N]> {
        let owned = self.hardware_owned?;
        Some(&mut self.buffers[owned.other().index()])
    }

    /// Producer has finished writing the fillable buffer
    pub fn confirm_filled(&mut self) {
        self.refill_requested = false;
    }

    /// Stop output and release both buffers
    pub fn stop(&mut self) {
        self.transfer.stop();
        self.hardware_owned = None;
        self.refill_requested = false;
        debug!("stream stopped");
    }

    /// Acknowledge a settled transfer outcome
    ///
    /// `Some(Err(Transfer))` after a failed re-arm or a hardware error.
    pub fn poll(&mut self) -> Option<Result<(), AmpError>> {
        let outcome = self.transfer.take_outcome();
        if let Some(Err(_)) = outcome {
            warn!("stream halted after transfer error");
        }
        outcome
    }

    /// Whether a buffer is owned by the hardware
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.hardware_owned.is_some()
    }

    /// Whether the producer owes a refill
    #[must_use]
    pub const fn is_refill_requested(&self) -> bool {
        self.refill_requested
    }

    /// Buffer currently being drained
    #[must_use]
    pub const fn hardware_owned(&self) -> Option<BufferId> {
        self.hardware_owned
    }

    /// Source the stream was started with
    #[must_use]
    pub const fn source(&self) -> SourceMode {
        self.source
    }

    /// Drains that found the previous refill unconfirmed
    #[must_use]
    pub const fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Read one buffer
    #[must_use]
    pub const fn buffer(&self, id: BufferId) -> &[u16; N] {
        &self.buffers[id.index()]
    }

    /// Completion state of the underlying transfer
    pub fn transfer_state(&self) -> TransferState {
        self.transfer.state()
    }

    /// Borrow the transport
    pub const fn transport(&self) -> &T {
        self.transfer.transport()
    }

    /// Borrow the transport mutably
    pub fn transport_mut(&mut self) -> &mut T {
        self.transfer.transport_mut()
    }
}

impl<T: Transport<Word = u16>, const N: usize> Startable for DoubleBufferStreamer<T, N> {
    type Params = SourceMode;

    fn start(&mut self, params: SourceMode) -> Result<(), AmpError> {
        DoubleBufferStreamer::start(self, params)
    }

    fn stop(&mut self) {
        DoubleBufferStreamer::stop(self);
    }
}

impl<T: Transport<Word = u16>, const N: usize> Pollable for DoubleBufferStreamer<T, N> {
    type Event = Result<(), AmpError>;

    fn poll(&mut self) -> Option<Self::Event> {
        DoubleBufferStreamer::poll(self)
    }
}

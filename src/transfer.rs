//! Asynchronous transfers
//!
//! Completion state shared by all DMA/interrupt-driven peripherals, the
//! double-buffered audio stream built on it, and the vector binding that
//! routes interrupts to a driver instance.

pub mod binding;
pub mod state;
pub mod stream;
pub mod waveform;

pub use binding::VectorBinding;
pub use state::{AsyncTransfer, Rearm, TransferCell, Transport, TransportError};
pub use stream::{BufferId, DoubleBufferStreamer};
pub use waveform::SourceMode;

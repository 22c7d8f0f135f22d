//! Hardware Abstraction Layer
//!
//! Meaningful wrappers over GPIO and timers. `gpio` and `timer` are generic
//! over `embedded-hal` and run on the host; `counter` and `rcc` bind to the
//! STM32F405 through embassy.

#[cfg(feature = "embedded")]
pub mod counter;
pub mod gpio;
#[cfg(feature = "embedded")]
pub mod rcc;
pub mod timer;

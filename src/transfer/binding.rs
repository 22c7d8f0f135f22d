//! Interrupt Vector Binding
//!
//! Routes a hardware vector to the one driver instance bound at startup. The
//! instance lives in a `critical_section::Mutex`, so the vector and the main
//! loop never hold it at the same time.
//!
//! ```ignore
//! static I2S_DMA: VectorBinding<AudioStream> = VectorBinding::new();
//!
//! #[interrupt]
//! fn DMA1_STREAM4() {
//!     I2S_DMA.with(|stream| stream.on_buffer_drained());
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

/// Slot holding the handler for one interrupt vector
pub struct VectorBinding<H> {
    slot: Mutex<RefCell<Option<H>>>,
}

impl<H> VectorBinding<H> {
    /// Empty slot; usable in a `static`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Bind `handler`; hands it back if the slot is taken
    ///
    /// # Errors
    /// Returns `handler` unchanged when another instance is already bound.
    pub fn bind(&self, handler: H) -> Result<(), H> {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow_ref_mut(cs);
            if slot.is_some() {
                return Err(handler);
            }
            *slot = Some(handler);
            Ok(())
        })
    }

    /// Remove and return the bound handler
    pub fn unbind(&self) -> Option<H> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take())
    }

    /// Whether a handler is bound
    pub fn is_bound(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow_ref(cs).is_some())
    }

    /// Run `f` on the bound handler; `None` if nothing is bound
    pub fn with<R>(&self, f: impl FnOnce(&mut H) -> R) -> Option<R> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<H> Default for VectorBinding<H> {
    fn default() -> Self {
        Self::new()
    }
}

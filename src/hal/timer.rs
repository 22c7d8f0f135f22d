//! Timer Abstractions
//!
//! A millisecond clock trait for the loop-context logic, a wrap-safe
//! periodic ticker, and the embassy-backed clock used on target.

/// Free-running millisecond clock
///
/// Wraps after about 49 days; consumers compare with `wrapping_sub`.
pub trait MonotonicClock {
    /// Milliseconds since an arbitrary epoch
    fn now_ms(&self) -> u32;
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Fires once per period when polled
#[derive(Clone, Copy, Debug)]
pub struct Ticker {
    period_ms: u32,
    last_ms: Option<u32>,
}

impl Ticker {
    /// Ticker with the given period; the first period starts at the first check
    #[must_use]
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// Check if a period has elapsed (and restart it if so)
    pub fn check(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            None => {
                self.last_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms.wrapping_sub(last) >= self.period_ms => {
                self.last_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }

    /// Forget the running period
    pub fn reset(&mut self) {
        self.last_ms = None;
    }

    /// Configured period
    #[must_use]
    pub const fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embedded")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[cfg(feature = "embedded")]
impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the intended wrap
        #[allow(clippy::cast_possible_truncation)]
        let ms = embassy_time::Instant::now().as_millis() as u32;
        ms
    }
}

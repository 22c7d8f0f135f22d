//! Front-panel keys
//!
//! Active-low push buttons with pull-ups. A level change is accepted once the
//! raw level has held for [`KEY_DEBOUNCE_MS`], however often the keys are
//! sampled. A press reports which other keys were held at that moment
//! so two-key chords can be told apart from single presses.

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::config::KEY_DEBOUNCE_MS;

/// Debounced button state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ButtonState {
    /// Button is released
    #[default]
    Released,
    /// Button is pressed
    Pressed,
}

/// Debounced active-low button
pub struct Button<P> {
    pin: P,
    state: ButtonState,
    last_raw: bool,
    stable_since_ms: u32,
}

impl<P: InputPin> Button<P> {
    /// Wrap a pin; starts released
    pub const fn new(pin: P) -> Self {
        Self {
            pin,
            state: ButtonState::Released,
            last_raw: false,
            stable_since_ms: 0,
        }
    }

    /// Sample the pin at `now_ms`; `true` if the debounced state changed
    ///
    /// A failed read counts as released.
    pub fn update(&mut self, now_ms: u32) -> bool {
        let current = self.pin.is_low().unwrap_or(false);

        if current != self.last_raw {
            self.last_raw = current;
            self.stable_since_ms = now_ms;
            return false;
        }

        if now_ms.wrapping_sub(self.stable_since_ms) >= KEY_DEBOUNCE_MS {
            let new_state = if current {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            };
            if new_state != self.state {
                self.state = new_state;
                return true;
            }
        }
        false
    }

    /// Debounced state
    #[must_use]
    pub const fn state(&self) -> ButtonState {
        self.state
    }

    /// Whether the button is down
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        matches!(self.state, ButtonState::Pressed)
    }
}

/// Set of held keys, bit `k - 1` for key `k`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct KeyMask(u8);

impl KeyMask {
    /// Mask with the given 1-based keys set
    #[must_use]
    pub fn of(keys: &[u8]) -> Self {
        keys.iter()
            .filter(|&&k| (1..=8).contains(&k))
            .fold(Self(0), |mask, &k| Self(mask.0 | 1 << (k - 1)))
    }

    /// Whether key `k` (1-based) is held
    #[must_use]
    pub const fn contains(self, key: u8) -> bool {
        key >= 1 && key <= 8 && self.0 & (1 << (key - 1)) != 0
    }

    /// Number of held keys
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// A key went down
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    /// Key that was pressed (1-based)
    pub key: u8,
    /// All keys held after this press, including `key`
    pub held: KeyMask,
}

#[cfg(feature = "embedded")]
impl defmt::Format for KeyPress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "key {} (held {=u8:b})", self.key, self.held.bits());
    }
}

/// `N` debounced keys scanned together
pub struct Keypad<P, const N: usize> {
    buttons: [Button<P>; N],
}

impl<P: InputPin, const N: usize> Keypad<P, N> {
    /// Keys numbered 1..=N in pin order
    pub fn new(pins: [P; N]) -> Self {
        Self {
            buttons: pins.map(Button::new),
        }
    }

    /// Sample every key at `now_ms`; one event per new press, in key order
    pub fn poll(&mut self, now_ms: u32) -> Vec<KeyPress, N> {
        let mut pressed = [false; N];
        for (button, down) in self.buttons.iter_mut().zip(pressed.iter_mut()) {
            *down = button.update(now_ms) && button.is_pressed();
        }

        let held = self.held();
        let mut events = Vec::new();
        for (key, _) in (1u8..).zip(pressed).filter(|(_, down)| *down) {
            let press = KeyPress { key, held };
            debug!("{}", press);
            // Capacity N matches the number of keys
            let _ = events.push(press);
        }
        events
    }

    /// Keys currently held
    pub fn held(&self) -> KeyMask {
        let mut bits = 0u8;
        for (i, button) in self.buttons.iter().enumerate().take(8) {
            if button.is_pressed() {
                bits |= 1 << i;
            }
        }
        KeyMask(bits)
    }
}

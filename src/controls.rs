//! Front-panel inputs
//!
//! Rotary encoders read through hardware quadrature counters and debounced
//! input-select keys.

pub mod encoder;
pub mod keypad;

pub use encoder::{CounterReader, Direction, EncoderConfig, EncoderDecoder, Polarity};
pub use keypad::{Button, ButtonState, KeyMask, KeyPress, Keypad};

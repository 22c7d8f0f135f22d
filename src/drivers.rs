//! Peripheral Drivers
//!
//! Drivers for the external chips on the amplifier board. Each is generic
//! over the `embedded-hal` bus traits so it runs against mocks on the host.

pub mod audio_dac;
pub mod eeprom;
pub mod tda7439;

pub use audio_dac::AudioDac;
pub use eeprom::Eeprom25aa040a;
pub use tda7439::{Tda7439, ToneBand};

//! Quadrature counters
//!
//! Timers in encoder mode feed the [`EncoderDecoder`](crate::controls::EncoderDecoder).

use embassy_stm32::timer::qei::Qei;
use embassy_stm32::timer::GeneralInstance4Channel;

use crate::controls::encoder::CounterReader;

impl<T: GeneralInstance4Channel> CounterReader for Qei<'_, T> {
    fn read_counter(&mut self) -> u32 {
        u32::from(self.count())
    }
}

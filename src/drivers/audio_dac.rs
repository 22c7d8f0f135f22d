//! UDA1334 I2S Audio DAC
//!
//! The DAC has no control bus; three GPIOs set power, mute and the sample
//! rate range, and the audio itself arrives over I2S DMA through a
//! [`DoubleBufferStreamer`].

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{DAC_HIGH_RATE_THRESHOLD_HZ, DAC_POWER_UP_MS};
use crate::hal::gpio::drive;
use crate::transfer::{DoubleBufferStreamer, SourceMode, Transport};
use crate::types::AmpError;

/// UDA1334 with its control pins and I2S stream
pub struct AudioDac<T: Transport<Word = u16>, P, const N: usize> {
    stream: DoubleBufferStreamer<T, N>,
    power: P,
    mute: P,
    rate_select: P,
    powered: bool,
}

impl<T, P, const N: usize> AudioDac<T, P, N>
where
    T: Transport<Word = u16>,
    P: OutputPin<Error = Infallible>,
{
    /// Take the I2S transport and control pins; the DAC stays unpowered
    pub fn new(transport: T, mut power: P, mut mute: P, mut rate_select: P) -> Self {
        drive(&mut power, false);
        drive(&mut mute, false);
        drive(&mut rate_select, false);
        Self {
            stream: DoubleBufferStreamer::new(transport),
            power,
            mute,
            rate_select,
            powered: false,
        }
    }

    /// Power the DAC with its output muted and wait for it to settle
    pub fn power_on<D: DelayNs>(&mut self, delay: &mut D) {
        drive(&mut self.mute, true);
        drive(&mut self.rate_select, false);
        drive(&mut self.power, true);
        delay.delay_ms(DAC_POWER_UP_MS);
        self.powered = true;
    }

    /// Select the rate range, unmute and start streaming `source`
    ///
    /// # Errors
    /// `DeviceInit` if the DAC is unpowered; otherwise the stream's error.
    pub fn start(&mut self, source: SourceMode, sample_rate_hz: u32) -> Result<(), AmpError> {
        if !self.powered {
            return Err(AmpError::DeviceInit);
        }
        drive(&mut self.rate_select, sample_rate_hz > DAC_HIGH_RATE_THRESHOLD_HZ);
        self.stream.start(source)?;
        drive(&mut self.mute, false);
        info!("DAC streaming at {} Hz", sample_rate_hz);
        Ok(())
    }

    /// Stop streaming and cut power
    pub fn stop(&mut self) {
        self.stream.stop();
        drive(&mut self.mute, false);
        drive(&mut self.rate_select, false);
        drive(&mut self.power, false);
        self.powered = false;
    }

    /// Whether the DAC is powered
    #[must_use]
    pub const fn is_powered(&self) -> bool {
        self.powered
    }

    /// The I2S stream, for the producer and the DMA vector
    pub fn stream(&mut self) -> &mut DoubleBufferStreamer<T, N> {
        &mut self.stream
    }
}

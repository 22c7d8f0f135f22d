//! Buffer contents for the audio stream
//!
//! Samples are unsigned 16-bit words with the sign bit flipped (offset
//! binary), stereo interleaved `L, R, L, R, ...`. Additions wrap modulo 2^16.

use core::f64::consts::PI;

/// Full-scale amplitude of one sample
pub const FULL_SCALE: f64 = 65_535.0;

/// Offset that maps a signed midpoint onto the unsigned word
pub const MSB_OFFSET: u16 = 0x8000;

/// What to load into the buffers when a stream starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum SourceMode {
    /// Silence; the producer refills the buffers afterwards
    #[default]
    Stream,
    /// Rising ramp in A, falling ramp in B
    TestLinear,
    /// Sine on the left channel, double-rate cosine on the right
    TestSine,
}

/// Fill both stream buffers for `mode`
pub fn fill(mode: SourceMode, a: &mut [u16], b: &mut [u16]) {
    match mode {
        SourceMode::Stream => {
            fill_silence(a);
            fill_silence(b);
        }
        SourceMode::TestLinear => fill_linear(a, b),
        SourceMode::TestSine => {
            fill_sine(a);
            fill_sine(b);
        }
    }
}

/// Every word at the midpoint
pub fn fill_silence(buffer: &mut [u16]) {
    buffer.fill(MSB_OFFSET);
}

/// Rising ramp into `rising`, falling ramp into `falling`
///
/// Both buffers are indexed against the length of `rising`.
pub fn fill_linear(rising: &mut [u16], falling: &mut [u16]) {
    let len = rising.len() as f64;
    for (k, (up, down)) in rising
        .chunks_exact_mut(2)
        .zip(falling.chunks_exact_mut(2))
        .enumerate()
    {
        let x = (2 * k) as f64 / len;
        up.fill(to_word(x * FULL_SCALE));
        down.fill(to_word((1.0 - x) * FULL_SCALE));
    }
}

/// `sin(2πi/N)` left, `cos(4πi/N)` right
pub fn fill_sine(buffer: &mut [u16]) {
    let len = buffer.len() as f64;
    for (k, pair) in buffer.chunks_exact_mut(2).enumerate() {
        let i = (2 * k) as f64;
        pair[0] = to_word((libm::sin(2.0 * PI * i / len) + 1.0) * FULL_SCALE / 2.0);
        pair[1] = to_word((libm::cos(4.0 * PI * i / len) + 1.0) * FULL_SCALE / 2.0);
    }
}

fn to_word(value: f64) -> u16 {
    // Float-to-int `as` saturates; inputs stay within 0..=FULL_SCALE
    (libm::round(value) as u16).wrapping_add(MSB_OFFSET)
}

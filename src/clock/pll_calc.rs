//! STM32F4 Main PLL Calculation
//!
//! Exhaustive search for the main PLL dividers that put the system clock as
//! close as possible to a requested frequency. This module is testable on
//! the host.
//!
//! # Theory of Operation
//!
//! ```text
//!  HSE ──► /M ──► ×N ──┬──► /P ──► SYSCLK ──┬──► /APB1 ──► PCLK1 (≤ 42 MHz)
//!                      │                     └──► /APB2 ──► PCLK2 (≤ 84 MHz)
//!                      └──► /Q ──► 48 MHz domain (must be exact)
//! ```
//!
//! Every candidate is checked against the reference-manual limits. All
//! comparisons cross-multiply in integers, so equal distances compare equal
//! and the tie-break (larger `M` wins) is deterministic.

use core::cmp::Ordering;
use core::ops::RangeInclusive;

use crate::types::AmpError;

/// Allowed input pre-divider
pub const M_RANGE: RangeInclusive<u32> = 2..=63;

/// Allowed VCO multiplier
pub const N_RANGE: RangeInclusive<u32> = 50..=432;

/// Allowed 48 MHz divider
pub const Q_RANGE: RangeInclusive<u32> = 2..=15;

/// Allowed system clock dividers
pub const P_VALUES: [u32; 4] = [2, 4, 6, 8];

/// PLL input window after `/M`
pub const PLL_INPUT_MIN_HZ: u64 = 950_000;
/// PLL input window after `/M`
pub const PLL_INPUT_MAX_HZ: u64 = 2_100_000;

/// VCO output window
pub const VCO_MIN_HZ: u64 = 100_000_000;
/// VCO output window
pub const VCO_MAX_HZ: u64 = 432_000_000;

/// Required frequency of the `/Q` output
pub const CLOCK48_HZ: u64 = 48_000_000;

/// System clock window
pub const SYSCLK_MIN_HZ: u64 = 24_000_000;
/// System clock window
pub const SYSCLK_MAX_HZ: u64 = 168_000_000;

/// Fastest APB1 clock
pub const APB1_MAX_HZ: u64 = 42_000_000;
/// Fastest APB2 clock
pub const APB2_MAX_HZ: u64 = 84_000_000;

/// Largest APB prescaler
pub const APB_PRESCALER_MAX: u32 = 16;

/// Selected PLL configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockSolution {
    /// Input pre-divider
    pub m: u32,
    /// VCO multiplier
    pub n: u32,
    /// System clock divider
    pub p: u32,
    /// 48 MHz divider
    pub q: u32,
    /// APB1 prescaler
    pub apb1: u32,
    /// APB2 prescaler
    pub apb2: u32,
    /// PLL input after `/M`
    pub pllm_out_mhz: f32,
    /// VCO output after `×N`
    pub plln_out_mhz: f32,
    /// `/Q` output
    pub clock48_mhz: f32,
    /// System clock after `/P`
    pub sysclk_mhz: f32,
    hse_hz: u32,
}

impl ClockSolution {
    fn new(hse_hz: u32, m: u32, n: u32, q: u32, p: u32) -> Self {
        let hse_mhz = hse_hz as f32 / 1_000_000.0;
        let pllm_out_mhz = hse_mhz / m as f32;
        let plln_out_mhz = pllm_out_mhz * n as f32;
        Self {
            m,
            n,
            p,
            q,
            apb1: bus_prescaler(hse_hz, m, n, p, APB1_MAX_HZ),
            apb2: bus_prescaler(hse_hz, m, n, p, APB2_MAX_HZ),
            pllm_out_mhz,
            plln_out_mhz,
            clock48_mhz: plln_out_mhz / q as f32,
            sysclk_mhz: plln_out_mhz / p as f32,
            hse_hz,
        }
    }

    /// Reference frequency the solution was computed for
    #[must_use]
    pub const fn hse_hz(&self) -> u32 {
        self.hse_hz
    }

    /// VCO output in Hz (truncated)
    #[must_use]
    pub fn vco_hz(&self) -> u32 {
        narrow(u64::from(self.hse_hz) * u64::from(self.n) / u64::from(self.m))
    }

    /// System clock in Hz (truncated)
    #[must_use]
    pub fn sysclk_hz(&self) -> u32 {
        narrow(u64::from(self.hse_hz) * u64::from(self.n) / (u64::from(self.m) * u64::from(self.p)))
    }

    /// APB1 peripheral clock in Hz
    #[must_use]
    pub fn pclk1_hz(&self) -> u32 {
        self.sysclk_hz() / self.apb1
    }

    /// APB2 peripheral clock in Hz
    #[must_use]
    pub fn pclk2_hz(&self) -> u32 {
        self.sysclk_hz() / self.apb2
    }

    /// Multiply both bus prescalers, capped at [`APB_PRESCALER_MAX`]
    ///
    /// Boards with slow peripherals on a bus divide further than the limits
    /// alone require.
    #[must_use]
    pub fn with_extra_prescalers(self, apb1_factor: u32, apb2_factor: u32) -> Self {
        Self {
            apb1: self.apb1.saturating_mul(apb1_factor).min(APB_PRESCALER_MAX),
            apb2: self.apb2.saturating_mul(apb2_factor).min(APB_PRESCALER_MAX),
            ..self
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClockSolution {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "M={} N={} P={} Q={} SYSCLK={} MHz APB1=/{} APB2=/{}",
            self.m,
            self.n,
            self.p,
            self.q,
            self.sysclk_mhz,
            self.apb1,
            self.apb2
        );
    }
}

/// Check one `(M, N, Q, P)` tuple against every PLL limit
#[must_use]
pub fn is_admissible(hse_hz: u32, m: u32, n: u32, q: u32, p: u32) -> bool {
    if m == 0 || q == 0 || p == 0 {
        return false;
    }
    let hse = u64::from(hse_hz);
    let (m, n, q, p) = (u64::from(m), u64::from(n), u64::from(q), u64::from(p));

    // Every bound is scaled by the divisors so no division is needed:
    // HSE·N is the VCO output times M.
    let vco_times_m = hse * n;
    (PLL_INPUT_MIN_HZ * m..=PLL_INPUT_MAX_HZ * m).contains(&hse)
        && (VCO_MIN_HZ * m..=VCO_MAX_HZ * m).contains(&vco_times_m)
        && vco_times_m == CLOCK48_HZ * m * q
        && (SYSCLK_MIN_HZ * m * p..=SYSCLK_MAX_HZ * m * p).contains(&vco_times_m)
}

/// Search the divider space for the system clock closest to `target_hz`
///
/// Loop order is M, N, Q, P ascending. Among equally close candidates the
/// larger `M` wins; for equal `M` the first one found is kept.
///
/// # Errors
/// `AmpError::Configuration` when no tuple satisfies the PLL limits.
pub fn solve(hse_hz: u32, target_hz: u32) -> Result<ClockSolution, AmpError> {
    let hse = u64::from(hse_hz);
    let mut best: Option<(Distance, u32, u32, u32, u32)> = None;

    for m in M_RANGE {
        let m64 = u64::from(m);
        if hse < PLL_INPUT_MIN_HZ * m64 || hse > PLL_INPUT_MAX_HZ * m64 {
            continue;
        }
        for n in N_RANGE {
            let vco_times_m = hse * u64::from(n);
            if vco_times_m < VCO_MIN_HZ * m64 || vco_times_m > VCO_MAX_HZ * m64 {
                continue;
            }
            for q in Q_RANGE {
                if vco_times_m != CLOCK48_HZ * m64 * u64::from(q) {
                    continue;
                }
                for p in P_VALUES {
                    if !is_admissible(hse_hz, m, n, q, p) {
                        continue;
                    }
                    let distance = Distance::new(hse, m, n, p, u64::from(target_hz));
                    let replace = match &best {
                        None => true,
                        Some((best_distance, best_m, ..)) => match distance.cmp(best_distance) {
                            Ordering::Less => true,
                            Ordering::Equal => m > *best_m,
                            Ordering::Greater => false,
                        },
                    };
                    if replace {
                        best = Some((distance, m, n, q, p));
                    }
                }
            }
        }
    }

    let (_, m, n, q, p) = best.ok_or(AmpError::Configuration)?;
    let solution = ClockSolution::new(hse_hz, m, n, q, p);
    debug!(
        "PLL: M={} N={} P={} Q={} -> {} Hz",
        m,
        n,
        p,
        q,
        solution.sysclk_hz()
    );
    Ok(solution)
}

/// Halve the bus clock until it is within `max_hz` or the prescaler tops out
fn bus_prescaler(hse_hz: u32, m: u32, n: u32, p: u32, max_hz: u64) -> u32 {
    let vco_times_m = u64::from(hse_hz) * u64::from(n);
    let mut div = 1;
    // SYSCLK / div > max  <=>  HSE·N > max·M·P·div
    while div < APB_PRESCALER_MAX
        && vco_times_m > max_hz * u64::from(m) * u64::from(p) * u64::from(div)
    {
        div *= 2;
    }
    div
}

fn narrow(hz: u64) -> u32 {
    u32::try_from(hz).unwrap_or(u32::MAX)
}

/// `|SYSCLK - target|` kept as the exact fraction `num / den`
#[derive(Clone, Copy, Debug)]
struct Distance {
    num: u64,
    den: u64,
}

impl Distance {
    fn new(hse: u64, m: u32, n: u32, p: u32, target: u64) -> Self {
        let den = u64::from(m) * u64::from(p);
        Self {
            num: (hse * u64::from(n)).abs_diff(target * den),
            den,
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.num) * u128::from(other.den);
        let rhs = u128::from(other.num) * u128::from(self.den);
        lhs.cmp(&rhs)
    }
}

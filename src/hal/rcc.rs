//! Clock tree setup
//!
//! Turns a [`ClockSolution`] into the embassy RCC configuration: HSE crystal
//! into the main PLL, system clock from the `/P` output, bus prescalers as
//! computed.

use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllMul, PllPDiv, PllPreDiv, PllQDiv,
    PllSource, Sysclk,
};
use embassy_stm32::time::Hertz;

use crate::clock::ClockSolution;
use crate::types::AmpError;

/// Embassy init config running the core from `solution`
///
/// # Errors
/// `Configuration` if a divider cannot be encoded in the RCC registers.
pub fn config_for(solution: &ClockSolution) -> Result<embassy_stm32::Config, AmpError> {
    let mut config = embassy_stm32::Config::default();
    let rcc = &mut config.rcc;

    rcc.hse = Some(Hse {
        freq: Hertz(solution.hse_hz()),
        mode: HseMode::Oscillator,
    });
    rcc.pll_src = PllSource::HSE;
    rcc.pll = Some(Pll {
        prediv: PllPreDiv::from_bits(narrow_u8(solution.m)?),
        mul: PllMul::from_bits(u16::try_from(solution.n).map_err(|_| AmpError::Configuration)?),
        divp: Some(p_divider(solution.p)?),
        divq: Some(PllQDiv::from_bits(narrow_u8(solution.q)?)),
        divr: None,
    });
    rcc.sys = Sysclk::PLL1_P;
    rcc.ahb_pre = AHBPrescaler::DIV1;
    rcc.apb1_pre = apb_prescaler(solution.apb1)?;
    rcc.apb2_pre = apb_prescaler(solution.apb2)?;

    Ok(config)
}

fn narrow_u8(value: u32) -> Result<u8, AmpError> {
    u8::try_from(value).map_err(|_| AmpError::Configuration)
}

fn p_divider(p: u32) -> Result<PllPDiv, AmpError> {
    match p {
        2 => Ok(PllPDiv::DIV2),
        4 => Ok(PllPDiv::DIV4),
        6 => Ok(PllPDiv::DIV6),
        8 => Ok(PllPDiv::DIV8),
        _ => Err(AmpError::Configuration),
    }
}

fn apb_prescaler(div: u32) -> Result<APBPrescaler, AmpError> {
    match div {
        1 => Ok(APBPrescaler::DIV1),
        2 => Ok(APBPrescaler::DIV2),
        4 => Ok(APBPrescaler::DIV4),
        8 => Ok(APBPrescaler::DIV8),
        16 => Ok(APBPrescaler::DIV16),
        _ => Err(AmpError::Configuration),
    }
}

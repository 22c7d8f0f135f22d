//! Clock tree configuration
//!
//! The divider search is pure and host-testable; applying the result to the
//! RCC lives in [`crate::hal::rcc`].

pub mod pll_calc;

pub use pll_calc::{solve, ClockSolution};

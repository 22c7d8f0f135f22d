//! Logging macros
//!
//! Forward to `defmt` on the target. On the host they expand to nothing so
//! the drivers and state machines build and test without an RTT transport.

#![macro_use]
#![allow(unused_macros)]

#[cfg(feature = "embedded")]
macro_rules! trace {
    ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
}

#[cfg(not(feature = "embedded"))]
macro_rules! trace {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "embedded")]
macro_rules! debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}

#[cfg(not(feature = "embedded"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "embedded")]
macro_rules! info {
    ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
}

#[cfg(not(feature = "embedded"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "embedded")]
macro_rules! warn {
    ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "embedded"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "embedded")]
macro_rules! error {
    ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
}

#[cfg(not(feature = "embedded"))]
macro_rules! error {
    ($($arg:tt)*) => {{}};
}


//! Amplifier Front-Panel Firmware Library
//!
//! Core functionality for an STM32F405-based digital audio amplifier: three
//! rotary encoders (volume, bass, treble), four input keys with LEDs, a
//! TDA7439 audio processor on I2C, a 25AA040A EEPROM on SPI holding the
//! settings, and the amplifier's mute/enable/gain switches.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  AmpController (modes, keys, encoders)  │  Settings          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      CORE MECHANISMS                         │
//! │  Transfer state │ Double buffer │ Encoder │ Delayed persist  │
//! │  PLL search                                                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  TDA7439  │  25AA040A  │  UDA1334  │  GPIO  │  QEI  │  RCC   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RUNTIME                                   │
//! │     embassy-rs executor running one cooperative loop         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: the mechanisms are generic over
//!   `embedded-hal` traits and tested on the host
//! - **Interrupts only set state**: completion callbacks flip an atomic
//!   state cell; decisions happen in the main loop
//! - **Type-driven design**: newtypes for inputs, gain steps, buffer ids
//! - **No unsafe in application code**
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

mod fmt;

/// Application Logic
///
/// Front-panel controller and persisted settings.
pub mod amp;

/// Clock Configuration
///
/// PLL divider search for the STM32F4 clock tree.
pub mod clock;

/// Front-Panel Inputs
///
/// Quadrature encoders and debounced keys.
pub mod controls;

/// Device Capabilities
///
/// `Startable`, `Transferable` and `Pollable` traits.
pub mod device;

/// Peripheral Drivers
///
/// Drivers for the external ICs (TDA7439, 25AA040A, UDA1334).
pub mod drivers;

/// Hardware Abstraction Layer
///
/// GPIO roles, timers, and the embassy bindings for QEI and RCC.
pub mod hal;

/// Delayed Persistence
///
/// Write coalescing in front of the EEPROM.
pub mod persist;

/// Asynchronous Transfers
///
/// Completion state machine, double-buffered streaming, vector binding.
pub mod transfer;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

//! Amplifier application
//!
//! The front-panel controller and the settings it persists.

pub mod controller;
pub mod settings;

pub use controller::{AmpController, Mode};
pub use settings::{Setting, Settings};

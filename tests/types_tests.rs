//! Types Module Tests
//!
//! Tests for domain types (InputChannel, OutputGain, BoundedValue, etc.)
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test types_tests

use amp_firmware::types::{AmpError, BoundedValue, InputChannel, OutputGain, TransferState};

// =============================================================================
// InputChannel Tests
// =============================================================================

#[test]
fn test_input_channel_range() {
    assert!(InputChannel::new(0).is_none());
    assert!(InputChannel::new(1).is_some());
    assert!(InputChannel::new(4).is_some());
    assert!(InputChannel::new(5).is_none());
    assert!(InputChannel::new(0xFF).is_none()); // Erased EEPROM cell
}

#[test]
fn test_input_channel_index() {
    assert_eq!(InputChannel::new(1).unwrap().index(), 0);
    assert_eq!(InputChannel::new(4).unwrap().index(), 3);
}

#[test]
fn test_input_channel_steps_saturate() {
    let first = InputChannel::default();
    assert_eq!(first.number(), 1);
    assert_eq!(first.down(), first);
    let last = InputChannel::new(4).unwrap();
    assert_eq!(last.up(), last);
    assert_eq!(first.up().up().number(), 3);
}

#[test]
fn test_input_channel_debug() {
    assert_eq!(format!("{:?}", InputChannel::new(2).unwrap()), "Input(2)");
}

// =============================================================================
// OutputGain Tests
// =============================================================================

#[test]
fn test_output_gain_range() {
    assert!(OutputGain::new(3).is_some());
    assert!(OutputGain::new(4).is_none());
    assert_eq!(OutputGain::default().step(), 0);
}

#[test]
fn test_output_gain_pin_levels() {
    // Select lines are active low
    let levels: Vec<(bool, bool)> = (0..=3)
        .map(|s| OutputGain::new(s).unwrap().pin_levels())
        .collect();
    assert_eq!(
        levels,
        vec![(true, true), (false, true), (true, false), (false, false)]
    );
}

#[test]
fn test_output_gain_steps_saturate() {
    let top = OutputGain::new(3).unwrap();
    assert_eq!(top.up(), top);
    assert_eq!(OutputGain::default().down().step(), 0);
    assert_eq!(OutputGain::default().up().step(), 1);
}

// =============================================================================
// BoundedValue Tests
// =============================================================================

#[test]
fn test_bounded_value_clamps_on_create() {
    let v = BoundedValue::new(50u8, 0, 40);
    assert_eq!(v.get(), 40);
    assert!(v.at_max());
}

#[test]
fn test_bounded_value_steps() {
    let mut v = BoundedValue::new(1u8, 0, 2);
    v.decrement();
    v.decrement();
    assert_eq!(v.get(), 0);
    assert!(v.at_min());
    v.increment();
    v.increment();
    v.increment();
    assert_eq!(v.get(), 2);
}

#[test]
fn test_bounded_value_set_clamps() {
    let mut v = BoundedValue::new(7u8, 0, 14);
    v.set(200);
    assert_eq!(v.get(), 14);
    assert_eq!((v.min(), v.max()), (0, 14));
}

// =============================================================================
// TransferState / AmpError Tests
// =============================================================================

#[test]
fn test_transfer_state_default_idle() {
    assert_eq!(TransferState::default(), TransferState::Idle);
}

#[test]
fn test_transfer_state_unknown_byte_is_error() {
    assert_eq!(TransferState::from_u8(0x7F), TransferState::Error);
}

#[test]
fn test_transfer_state_settled() {
    assert!(!TransferState::Idle.is_settled());
    assert!(!TransferState::Busy.is_settled());
    assert!(TransferState::CompletedOk.is_settled());
    assert!(TransferState::Error.is_settled());
}

#[test]
fn test_error_display() {
    assert_eq!(AmpError::Busy.to_string(), "device busy");
    assert_eq!(AmpError::Configuration.to_string(), "no valid clock configuration");
}

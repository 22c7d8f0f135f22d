//! Encoder Tests
//!
//! Tests for quadrature counter decoding, wraparound and key debouncing.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test encoder_tests

mod common;

use amp_firmware::config::{ENCODER_COUNTER_MAX, ENCODER_STEP_DIVISOR, KEY_DEBOUNCE_MS};
use amp_firmware::controls::encoder::counter_delta;
use amp_firmware::controls::{
    Direction, EncoderConfig, EncoderDecoder, KeyMask, KeyPress, Keypad, Polarity,
};
use common::{Pin, ScriptedCounter};
use proptest::prelude::*;

const MAX: u32 = 0xFFFF;

fn decoder(values: &[u32]) -> EncoderDecoder<ScriptedCounter> {
    EncoderDecoder::new(ScriptedCounter::new(values), EncoderConfig::new(MAX, 1))
}

fn drain(decoder: &mut EncoderDecoder<ScriptedCounter>, polls: usize) -> Vec<Direction> {
    (0..polls).filter_map(|_| decoder.poll()).collect()
}

// =============================================================================
// Step Decoding
// =============================================================================

#[test]
fn test_counting_up_gives_one_event_per_step() {
    let mut enc = decoder(&[0, 1, 2]);
    enc.start();
    let events = drain(&mut enc, 2);
    assert_eq!(
        events,
        vec![Direction::CounterClockwise, Direction::CounterClockwise],
        "counter counts down for clockwise travel"
    );
}

#[test]
fn test_repeated_value_is_silent() {
    let mut enc = decoder(&[5, 5, 5, 6, 6]);
    enc.start();
    assert_eq!(drain(&mut enc, 4), vec![Direction::CounterClockwise]);
}

#[test]
fn test_large_jump_is_single_step() {
    let mut enc = decoder(&[100, 40]);
    enc.start();
    assert_eq!(enc.poll(), Some(Direction::Clockwise));
    assert_eq!(enc.poll(), None);
    assert_eq!(enc.previous(), 40);
}

#[test]
fn test_baseline_zero_before_start() {
    let mut enc = decoder(&[3]);
    assert_eq!(enc.poll(), Some(Direction::CounterClockwise));
}

// =============================================================================
// Wraparound
// =============================================================================

#[test]
fn test_wrap_backward_is_opposite_to_count_up() {
    let mut up = decoder(&[0, 1]);
    up.start();
    let step = up.poll().unwrap();

    let mut wrap = decoder(&[0, MAX]);
    wrap.start();
    let wrapped = wrap.poll().unwrap();

    assert_eq!(wrapped, Direction::Clockwise);
    assert_eq!(wrapped, step.reversed());
    assert_eq!(wrap.poll(), None, "exactly one event for the wrap");
}

#[test]
fn test_wrap_forward_is_opposite_to_count_down() {
    let mut down = decoder(&[1, 0]);
    down.start();
    let step = down.poll().unwrap();

    let mut wrap = decoder(&[MAX, 0]);
    wrap.start();
    let wrapped = wrap.poll().unwrap();

    assert_eq!(wrapped, Direction::CounterClockwise);
    assert_eq!(wrapped, step.reversed());
}

#[test]
fn test_delta_edges() {
    assert_eq!(counter_delta(MAX, 0, MAX), -1);
    assert_eq!(counter_delta(0, MAX, MAX), 1);
    assert_eq!(counter_delta(10, 7, MAX), 3);
    assert_eq!(counter_delta(7, 10, MAX), -3);
}

#[test]
fn test_wrap_with_divisor() {
    let config = EncoderConfig::new(ENCODER_COUNTER_MAX, ENCODER_STEP_DIVISOR);
    let mut enc = EncoderDecoder::new(ScriptedCounter::new(&[0, ENCODER_COUNTER_MAX]), config);
    enc.start();
    assert_eq!(enc.previous(), 0);
    assert_eq!(enc.poll(), Some(Direction::Clockwise));
    assert_eq!(enc.previous(), config.scaled_max());
}

#[test]
fn test_divisor_hides_sub_detent_counts() {
    let config = EncoderConfig::new(MAX, 4);
    let mut enc = EncoderDecoder::new(ScriptedCounter::new(&[8, 9, 10, 11, 12]), config);
    enc.start();
    assert_eq!(drain(&mut enc, 4), vec![Direction::CounterClockwise]);
}

// =============================================================================
// Polarity and Handler
// =============================================================================

#[test]
fn test_inverted_polarity() {
    let config = EncoderConfig::new(MAX, 1).with_polarity(Polarity::Inverted);
    let mut enc = EncoderDecoder::new(ScriptedCounter::new(&[0, 1, 0]), config);
    enc.start();
    assert_eq!(enc.poll(), Some(Direction::Clockwise));
    assert_eq!(enc.poll(), Some(Direction::CounterClockwise));
}

#[test]
fn test_periodic_passes_sign() {
    let mut enc = decoder(&[10, 9, 9]);
    enc.start();
    let mut seen = Vec::new();
    enc.periodic(|s| seen.push(s));
    enc.periodic(|s| seen.push(s));
    assert_eq!(seen, vec![1]);
}

proptest! {
    #[test]
    fn prop_one_event_per_changed_sample(values in prop::collection::vec(0u32..=MAX, 1..64)) {
        let mut enc = decoder(&values);
        let mut previous = 0;
        let mut changes = 0;
        let mut events = 0;
        for &current in &values {
            let event = enc.poll();
            if current == previous {
                prop_assert_eq!(event, None);
            } else {
                changes += 1;
                let expected = Direction::from_delta(counter_delta(previous, current, MAX));
                prop_assert!(event.is_some());
                prop_assert_eq!(event, expected);
            }
            if event.is_some() {
                events += 1;
            }
            previous = current;
        }
        prop_assert_eq!(events, changes);
        prop_assert_eq!(enc.previous(), previous);
    }

    #[test]
    fn prop_event_iff_value_changed(prev in 0u32..=MAX, cur in 0u32..=MAX) {
        let mut enc = decoder(&[prev, cur]);
        enc.start();
        prop_assert_eq!(enc.poll().is_some(), prev != cur);
    }
}

// =============================================================================
// Keypad
// =============================================================================

/// Poll once per millisecond for longer than the debounce time
fn settle(keypad: &mut Keypad<Pin, 4>, now: &mut u32) -> Vec<KeyPress> {
    let mut events = Vec::new();
    for _ in 0..=KEY_DEBOUNCE_MS {
        *now += 1;
        events.extend(keypad.poll(*now));
    }
    events
}

fn keypad() -> (Keypad<Pin, 4>, [Pin; 4]) {
    let pins: [Pin; 4] = core::array::from_fn(|_| Pin::new(true));
    let lines = pins.clone();
    (Keypad::new(pins), lines)
}

#[test]
fn test_key_press_after_debounce() {
    let (mut keypad, lines) = keypad();
    let mut now = 0;

    assert!(settle(&mut keypad, &mut now).is_empty(), "all released at rest");

    lines[2].force(false);
    let events = settle(&mut keypad, &mut now);
    assert_eq!(
        events,
        vec![KeyPress {
            key: 3,
            held: KeyMask::of(&[3])
        }]
    );
    assert!(settle(&mut keypad, &mut now).is_empty(), "holding does not repeat");
}

#[test]
fn test_bounce_is_filtered() {
    let (mut keypad, lines) = keypad();
    let mut now = 0;
    settle(&mut keypad, &mut now);

    for _ in 0..10 {
        lines[0].force(false);
        now += 1;
        assert!(keypad.poll(now).is_empty());
        lines[0].force(true);
        now += 1;
        assert!(keypad.poll(now).is_empty());
    }
}

#[test]
fn test_release_bounce_gives_single_press() {
    let (mut keypad, lines) = keypad();
    let mut now = 0;
    settle(&mut keypad, &mut now);

    lines[0].force(false);
    let mut events = settle(&mut keypad, &mut now);

    // Contact chatter on release, each level held for a few milliseconds
    for level in [true, false, true, false, true, false] {
        lines[0].force(level);
        for _ in 0..4 {
            now += 1;
            events.extend(keypad.poll(now));
        }
    }
    lines[0].force(true);
    events.extend(settle(&mut keypad, &mut now));

    assert_eq!(events.len(), 1, "one press for one push: {events:?}");
    assert_eq!(keypad.held().bits(), 0);
}

#[test]
fn test_chord_reports_held_mask() {
    let (mut keypad, lines) = keypad();
    let mut now = 0;
    settle(&mut keypad, &mut now);

    lines[0].force(false);
    let first = settle(&mut keypad, &mut now);
    lines[1].force(false);
    let second = settle(&mut keypad, &mut now);

    assert_eq!(first[0].held.count(), 1);
    assert_eq!(second[0].key, 2);
    assert!(second[0].held.contains(1) && second[0].held.contains(2));
    assert_eq!(keypad.held().bits(), 0b0011);
}

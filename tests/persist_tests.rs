//! Persistence Tests
//!
//! Tests for delayed EEPROM writes and the settings layout.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test persist_tests

mod common;

use amp_firmware::amp::{Setting, Settings};
use amp_firmware::config::eeprom;
use amp_firmware::config::EEPROM_SAVE_DELAY_MS;
use amp_firmware::drivers::Eeprom25aa040a;
use amp_firmware::persist::{or_default, ByteStorage, DelayedByteStore};
use common::{EepromChip, MemStorage, StorageFault};
use proptest::prelude::*;

// =============================================================================
// Delayed Byte Store
// =============================================================================

#[test]
fn test_burst_coalesces_to_one_write() {
    let mut storage = MemStorage::new();
    let mut slot = DelayedByteStore::new(eeprom::VOLUME_ADDR);

    for (t, v) in [(0, 11), (40, 12), (90, 13), (150, 14)] {
        slot.delayed_write(v, 100, t);
        assert!(!slot.tick(&mut storage, t).unwrap());
    }
    assert!(!slot.tick(&mut storage, 249).unwrap(), "deadline moved with the last change");
    assert!(slot.tick(&mut storage, 250).unwrap());

    assert_eq!(storage.writes(), vec![(eeprom::VOLUME_ADDR, 14)]);
}

#[test]
fn test_same_deadline_last_value_wins() {
    let mut storage = MemStorage::new();
    let mut slot = DelayedByteStore::new(3);
    slot.delayed_write(5, 100, 1_000);
    slot.delayed_write(7, 100, 1_000);
    assert_eq!(slot.pending().map(|p| p.deadline_ms()), Some(1_100));
    slot.tick(&mut storage, 1_100).unwrap();
    assert_eq!(storage.writes(), vec![(3, 7)]);
}

#[test]
fn test_zero_delay_writes_on_next_tick() {
    let mut storage = MemStorage::new();
    let mut slot = DelayedByteStore::new(2);
    slot.delayed_write(1, 0, 500);
    assert!(slot.tick(&mut storage, 500).unwrap());
    assert_eq!(storage.get(2), 1);
}

#[test]
fn test_write_through_cancels_pending() {
    let mut storage = MemStorage::new();
    let mut slot = DelayedByteStore::new(4);
    slot.delayed_write(9, 100, 0);
    slot.write(&mut storage, 3).unwrap();
    assert!(!slot.tick(&mut storage, 1_000).unwrap());
    assert_eq!(storage.writes(), vec![(4, 3)]);
}

#[test]
fn test_cancel_drops_pending() {
    let mut storage = MemStorage::new();
    let mut slot = DelayedByteStore::new(4);
    slot.delayed_write(9, 100, 0);
    slot.cancel();
    assert!(!slot.is_pending());
    assert!(!slot.tick(&mut storage, 1_000).unwrap());
    assert!(storage.writes().is_empty());
}

#[test]
fn test_failed_write_is_consumed() {
    let mut storage = MemStorage::new();
    storage.set_failing(true);
    let mut slot = DelayedByteStore::new(1);
    slot.delayed_write(2, 10, 0);
    assert_eq!(slot.tick(&mut storage, 10), Err(StorageFault));
    assert!(!slot.is_pending());
}

#[test]
fn test_erased_cell_maps_to_default() {
    assert_eq!(or_default(eeprom::ERASED, eeprom::DEFAULT_VOLUME), eeprom::DEFAULT_VOLUME);
    assert_eq!(or_default(0, eeprom::DEFAULT_VOLUME), 0);
}

proptest! {
    #[test]
    fn prop_at_most_one_write_per_burst(
        start in any::<u32>(),
        gaps in prop::collection::vec(0u32..100, 1..20),
        values in prop::collection::vec(0u8..0xFF, 20),
    ) {
        let delay = 100;
        let mut storage = MemStorage::new();
        let mut slot = DelayedByteStore::new(0);
        let mut now = start;
        let mut last = 0;
        for (gap, value) in gaps.iter().zip(&values) {
            now = now.wrapping_add(*gap);
            slot.delayed_write(*value, delay, now);
            last = *value;
            // Ticks inside the quiet period never write
            prop_assert!(!slot.tick(&mut storage, now.wrapping_add(delay - 1)).unwrap());
        }
        prop_assert!(slot.tick(&mut storage, now.wrapping_add(delay)).unwrap());
        prop_assert_eq!(storage.writes(), vec![(0, last)]);
    }
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_layout() {
    let addresses: Vec<u16> = Setting::ALL.iter().map(|s| s.address()).collect();
    assert_eq!(addresses, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(Setting::Volume.default_value(), 10);
    assert_eq!(Setting::Bass.default_value(), 7);
    assert_eq!(Setting::Treble.default_value(), 7);
    assert_eq!(Setting::InputChannel.default_value(), 1);
}

#[test]
fn test_erased_storage_loads_defaults() {
    let mut settings = Settings::new(MemStorage::new(), EEPROM_SAVE_DELAY_MS);
    for setting in Setting::ALL {
        assert_eq!(settings.load(setting).unwrap(), setting.default_value());
    }
}

#[test]
fn test_saved_values_load_back() {
    let storage = MemStorage::with(&[(eeprom::VOLUME_ADDR, 0), (eeprom::BASS_ADDR, 3)]);
    let mut settings = Settings::new(storage, EEPROM_SAVE_DELAY_MS);
    assert_eq!(settings.load(Setting::Volume).unwrap(), 0, "zero is a real value");
    assert_eq!(settings.load(Setting::Bass).unwrap(), 3);
}

#[test]
fn test_schedule_waits_for_quiet_period() {
    let storage = MemStorage::new();
    let mut settings = Settings::new(storage.clone(), EEPROM_SAVE_DELAY_MS);

    settings.schedule(Setting::Treble, 9, 10_000);
    settings.schedule(Setting::Bass, 4, 10_500);
    assert!(settings.any_pending());

    assert_eq!(settings.tick(10_000 + EEPROM_SAVE_DELAY_MS - 1).unwrap(), 0);
    assert_eq!(settings.tick(10_000 + EEPROM_SAVE_DELAY_MS).unwrap(), 1);
    assert!(settings.is_pending(Setting::Bass));
    assert_eq!(settings.tick(10_500 + EEPROM_SAVE_DELAY_MS).unwrap(), 1);
    assert!(!settings.any_pending());

    assert_eq!(storage.get(eeprom::TREBLE_ADDR), 9);
    assert_eq!(storage.get(eeprom::BASS_ADDR), 4);
}

#[test]
fn test_store_is_immediate() {
    let storage = MemStorage::new();
    let mut settings = Settings::new(storage.clone(), EEPROM_SAVE_DELAY_MS);
    settings.schedule(Setting::InputChannel, 2, 0);
    settings.store(Setting::InputChannel, 3).unwrap();
    assert!(!settings.is_pending(Setting::InputChannel));
    assert_eq!(storage.writes(), vec![(eeprom::INPUT_CHANNEL_ADDR, 3)]);
}

#[test]
fn test_settings_over_emulated_eeprom() {
    let chip = EepromChip::new();
    let device = Eeprom25aa040a::new(chip.bus(), chip.chip_select());
    let mut settings = Settings::new(device, EEPROM_SAVE_DELAY_MS);

    assert_eq!(settings.load(Setting::Volume).unwrap(), eeprom::DEFAULT_VOLUME);
    settings.schedule(Setting::Volume, 22, 0);
    settings.tick(EEPROM_SAVE_DELAY_MS).unwrap();

    assert_eq!(chip.peek(eeprom::VOLUME_ADDR), 22);
    assert_eq!(chip.commits(), 1);
    assert_eq!(settings.load(Setting::Volume).unwrap(), 22);
    assert_eq!(settings.storage_mut().read_byte(eeprom::VOLUME_ADDR).unwrap(), 22);
}

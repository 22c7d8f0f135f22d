//! Shared host mocks for the integration tests
//!
//! Hand-written `embedded-hal` implementations: output pins with observable
//! levels, an I2C bus that records writes, a 25AA040A emulator behind an SPI
//! bus plus chip-select pin, byte storage in RAM, delays and counters.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use amp_firmware::controls::encoder::CounterReader;
use amp_firmware::persist::ByteStorage;
use amp_firmware::transfer::{Transport, TransportError};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};
use embedded_hal::spi::{self, SpiBus};

// =============================================================================
// GPIO
// =============================================================================

/// Output pin whose level can be read back through a clone
#[derive(Clone, Default)]
pub struct Pin(Rc<Cell<bool>>);

impl Pin {
    pub fn new(high: bool) -> Self {
        Self(Rc::new(Cell::new(high)))
    }

    pub fn is_set_high(&self) -> bool {
        self.0.get()
    }

    /// Drive the line from outside (for inputs)
    pub fn force(&self, high: bool) {
        self.0.set(high);
    }
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

// =============================================================================
// Delay
// =============================================================================

/// Delay that only adds up what was requested
#[derive(Clone, Default)]
pub struct Delay(Rc<Cell<u64>>);

impl Delay {
    pub fn total_ns(&self) -> u64 {
        self.0.get()
    }

    pub fn total_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns));
    }
}

// =============================================================================
// I2C
// =============================================================================

/// I2C bus recording every write as `(address, bytes)`
#[derive(Clone, Default)]
pub struct I2cLog {
    writes: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
    fail: Rc<Cell<bool>>,
}

impl I2cLog {
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.writes.borrow().clone()
    }

    /// Last value written to `register`
    pub fn last_value(&self, register: u8) -> Option<u8> {
        self.writes
            .borrow()
            .iter()
            .rev()
            .find(|(_, bytes)| bytes.first() == Some(&register))
            .and_then(|(_, bytes)| bytes.get(1).copied())
    }

    pub fn clear(&self) {
        self.writes.borrow_mut().clear();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl i2c::ErrorType for I2cLog {
    type Error = i2c::ErrorKind;
}

impl I2c for I2cLog {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.borrow_mut().push((address, bytes.to_vec())),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

// =============================================================================
// 25AA040A emulator
// =============================================================================

const READ: u8 = 0b0000_0011;
const WRITE: u8 = 0b0000_0010;
const WRDI: u8 = 0b0000_0100;
const WREN: u8 = 0b0000_0110;
const RDSR: u8 = 0b0000_0101;

struct Chip {
    memory: [u8; 512],
    selected: bool,
    position: usize,
    instruction: u8,
    address: u16,
    write_latch: bool,
    page: Vec<(u16, u8)>,
    commits: usize,
    instructions: Vec<u8>,
}

impl Chip {
    fn exchange(&mut self, byte: u8) -> u8 {
        if !self.selected {
            return 0xFF;
        }
        let position = self.position;
        self.position += 1;
        if position == 0 {
            self.instruction = byte;
            self.instructions.push(byte);
            match byte {
                WREN => self.write_latch = true,
                WRDI => self.write_latch = false,
                _ => {}
            }
            return 0xFF;
        }

        let a8 = u16::from(self.instruction >> 3 & 1) << 8;
        match self.instruction & !0b0000_1000 {
            READ if position == 1 => {
                self.address = a8 | u16::from(byte);
                0xFF
            }
            READ => {
                let value = self.memory[usize::from(self.address)];
                self.address = (self.address + 1) % 512;
                value
            }
            WRITE if position == 1 => {
                self.address = a8 | u16::from(byte);
                0xFF
            }
            WRITE => {
                self.page.push((self.address, byte));
                let base = self.address & !0x0F;
                self.address = base | ((self.address + 1) & 0x0F);
                0xFF
            }
            RDSR => u8::from(self.write_latch) << 1,
            _ => 0xFF,
        }
    }

    fn deselect(&mut self) {
        if self.selected
            && self.instruction & !0b0000_1000 == WRITE
            && self.write_latch
            && !self.page.is_empty()
        {
            for (address, value) in self.page.drain(..) {
                self.memory[usize::from(address)] = value;
            }
            self.write_latch = false;
            self.commits += 1;
        }
        self.page.clear();
        self.selected = false;
    }
}

/// Handle on an emulated EEPROM shared by its SPI bus and chip select
#[derive(Clone)]
pub struct EepromChip(Rc<RefCell<Chip>>);

impl EepromChip {
    /// Erased device
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Chip {
            memory: [0xFF; 512],
            selected: false,
            position: 0,
            instruction: 0,
            address: 0,
            write_latch: false,
            page: Vec::new(),
            commits: 0,
            instructions: Vec::new(),
        })))
    }

    pub fn bus(&self) -> EepromBus {
        EepromBus(self.clone())
    }

    pub fn chip_select(&self) -> EepromCs {
        EepromCs(self.clone())
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.0.borrow().memory[usize::from(address)]
    }

    pub fn poke(&self, address: u16, value: u8) {
        self.0.borrow_mut().memory[usize::from(address)] = value;
    }

    /// Completed write cycles
    pub fn commits(&self) -> usize {
        self.0.borrow().commits
    }

    /// Instruction bytes seen, in order
    pub fn instructions(&self) -> Vec<u8> {
        self.0.borrow().instructions.clone()
    }

    pub fn is_selected(&self) -> bool {
        self.0.borrow().selected
    }
}

pub struct EepromBus(EepromChip);

impl spi::ErrorType for EepromBus {
    type Error = spi::ErrorKind;
}

impl SpiBus for EepromBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.0 .0.borrow_mut();
        for word in words {
            *word = chip.exchange(0);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.0 .0.borrow_mut();
        for &word in words {
            chip.exchange(word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.0 .0.borrow_mut();
        for i in 0..read.len().max(write.len()) {
            let out = chip.exchange(write.get(i).copied().unwrap_or(0));
            if let Some(slot) = read.get_mut(i) {
                *slot = out;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.0 .0.borrow_mut();
        for word in words {
            *word = chip.exchange(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct EepromCs(EepromChip);

impl ErrorType for EepromCs {
    type Error = Infallible;
}

impl OutputPin for EepromCs {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut chip = self.0 .0.borrow_mut();
        chip.selected = true;
        chip.position = 0;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().deselect();
        Ok(())
    }
}

// =============================================================================
// Byte storage
// =============================================================================

/// RAM-backed storage that starts erased and logs every write
#[derive(Clone)]
pub struct MemStorage {
    bytes: Rc<RefCell<[u8; 16]>>,
    log: Rc<RefCell<Vec<(u16, u8)>>>,
    fail: Rc<Cell<bool>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            bytes: Rc::new(RefCell::new([0xFF; 16])),
            log: Rc::default(),
            fail: Rc::default(),
        }
    }

    pub fn with(values: &[(u16, u8)]) -> Self {
        let storage = Self::new();
        for &(address, value) in values {
            storage.bytes.borrow_mut()[usize::from(address)] = value;
        }
        storage
    }

    pub fn get(&self, address: u16) -> u8 {
        self.bytes.borrow()[usize::from(address)]
    }

    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.log.borrow().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StorageFault;

impl ByteStorage for MemStorage {
    type Error = StorageFault;

    fn read_byte(&mut self, address: u16) -> Result<u8, StorageFault> {
        if self.fail.get() {
            return Err(StorageFault);
        }
        self.bytes
            .borrow()
            .get(usize::from(address))
            .copied()
            .ok_or(StorageFault)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), StorageFault> {
        if self.fail.get() {
            return Err(StorageFault);
        }
        let mut bytes = self.bytes.borrow_mut();
        let cell = bytes.get_mut(usize::from(address)).ok_or(StorageFault)?;
        *cell = value;
        self.log.borrow_mut().push((address, value));
        Ok(())
    }
}

// =============================================================================
// Counters and transports
// =============================================================================

/// Counter replaying a script; repeats the last value when exhausted
pub struct ScriptedCounter {
    values: VecDeque<u32>,
    last: u32,
}

impl ScriptedCounter {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            last: 0,
        }
    }
}

impl CounterReader for ScriptedCounter {
    fn read_counter(&mut self) -> u32 {
        if let Some(v) = self.values.pop_front() {
            self.last = v;
        }
        self.last
    }
}

/// DMA stand-in recording what it was asked to send
#[derive(Default)]
pub struct FakeDma {
    pub arms: usize,
    pub cancels: usize,
    pub armed_first_word: Option<u16>,
    pub refuse: bool,
}

impl Transport for FakeDma {
    type Word = u16;

    fn arm(&mut self, data: &[u16]) -> Result<(), TransportError> {
        self.arms += 1;
        if self.refuse {
            return Err(TransportError::Hardware);
        }
        self.armed_first_word = data.first().copied();
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels += 1;
    }
}

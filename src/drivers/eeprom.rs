//! 25AA040A SPI EEPROM Driver
//!
//! 512 bytes in 16-byte pages. The ninth address bit travels in bit 3 of the
//! instruction byte. Chip select is driven by hand so one select window can
//! cover instruction, address and data.
//!
//! A write is `WREN`, then `WRITE` with up to one page of data, then polling
//! `RDSR` until the write-in-progress bit clears.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use heapless::Vec;

use crate::persist::ByteStorage;

/// Instruction set
mod cmd {
    pub const READ: u8 = 0b0000_0011;
    pub const WRITE: u8 = 0b0000_0010;
    pub const WRDI: u8 = 0b0000_0100;
    pub const WREN: u8 = 0b0000_0110;
    pub const RDSR: u8 = 0b0000_0101;
}

/// Status register bits
pub mod status {
    /// Write in progress
    pub const WIP: u8 = 0b0000_0001;
    /// Write enable latch
    pub const WEL: u8 = 0b0000_0010;
    /// Block protect bits
    pub const BP_MASK: u8 = 0b0000_1100;
}

/// Bytes of storage
pub const CAPACITY: u16 = 512;

/// Bytes per write page
pub const PAGE_SIZE: usize = 16;

/// Where address bit 8 goes in the instruction byte
const A8_SHIFT: u32 = 3;

/// Status polls before a write is declared stuck
pub const DEFAULT_WRITE_POLLS: u32 = 10_000;

/// EEPROM driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// SPI transfer failed
    Spi(E),
    /// Chip select could not be driven
    ChipSelect,
    /// Address or length outside the device or across a page boundary
    Address(u16),
    /// Write-in-progress never cleared
    WriteTimeout,
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Spi(_) => defmt::write!(f, "SPI"),
            Self::ChipSelect => defmt::write!(f, "ChipSelect"),
            Self::Address(a) => defmt::write!(f, "Address({})", a),
            Self::WriteTimeout => defmt::write!(f, "WriteTimeout"),
        }
    }
}

/// 25AA040A on an SPI bus with a dedicated chip-select pin
pub struct Eeprom25aa040a<SPI, CS> {
    spi: SPI,
    cs: CS,
    write_polls: u32,
}

impl<SPI: SpiBus, CS: OutputPin> Eeprom25aa040a<SPI, CS> {
    /// Take the bus and chip select
    pub const fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            write_polls: DEFAULT_WRITE_POLLS,
        }
    }

    /// Override how many status polls a write may take
    #[must_use]
    pub fn with_write_polls(self, polls: u32) -> Self {
        Self {
            write_polls: polls,
            ..self
        }
    }

    /// Deselect the chip and check it answers
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn start(&mut self) -> Result<u8, Error<SPI::Error>> {
        self.cs.set_high().map_err(|_| Error::ChipSelect)?;
        let sr = self.read_status()?;
        debug!("25AA040A status {=u8:#x}", sr);
        Ok(sr)
    }

    /// Read the status register
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn read_status(&mut self) -> Result<u8, Error<SPI::Error>> {
        let mut frame = [cmd::RDSR, 0];
        self.select(|spi| spi.transfer_in_place(&mut frame))?;
        Ok(frame[1])
    }

    /// Read `buf.len()` bytes starting at `address`
    ///
    /// Reads may cross page boundaries.
    ///
    /// # Errors
    /// `Address` when the range runs past the device.
    pub fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Error<SPI::Error>> {
        check_range(address, buf.len())?;
        let header = [instruction(cmd::READ, address), address_low(address)];
        self.select(|spi| {
            spi.write(&header)?;
            spi.read(buf)
        })
    }

    /// Write up to one page starting at `address`
    ///
    /// # Errors
    /// `Address` when the data crosses a page boundary or runs past the
    /// device; `WriteTimeout` when the chip never finishes.
    pub fn write_page(&mut self, address: u16, data: &[u8]) -> Result<(), Error<SPI::Error>> {
        check_range(address, data.len())?;
        if usize::from(address) % PAGE_SIZE + data.len() > PAGE_SIZE {
            return Err(Error::Address(address));
        }

        let mut frame: Vec<u8, { PAGE_SIZE + 2 }> = Vec::new();
        frame
            .extend_from_slice(&[instruction(cmd::WRITE, address), address_low(address)])
            .map_err(|()| Error::Address(address))?;
        frame
            .extend_from_slice(data)
            .map_err(|()| Error::Address(address))?;

        self.enable_write()?;
        self.select(|spi| spi.write(&frame))?;
        self.wait_ready()?;
        self.disable_write()?;
        trace!("25AA040A wrote {} bytes at {}", data.len(), address);
        Ok(())
    }

    /// Set the write enable latch
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn enable_write(&mut self) -> Result<(), Error<SPI::Error>> {
        self.select(|spi| spi.write(&[cmd::WREN]))
    }

    /// Clear the write enable latch
    ///
    /// # Errors
    /// Returns the bus error.
    pub fn disable_write(&mut self) -> Result<(), Error<SPI::Error>> {
        self.select(|spi| spi.write(&[cmd::WRDI]))
    }

    /// Poll until the write cycle is over
    ///
    /// # Errors
    /// `WriteTimeout` after the configured number of polls.
    pub fn wait_ready(&mut self) -> Result<(), Error<SPI::Error>> {
        for _ in 0..self.write_polls {
            if self.read_status()? & status::WIP == 0 {
                return Ok(());
            }
        }
        Err(Error::WriteTimeout)
    }

    /// Give back the bus and chip select
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// Run `f` with the chip selected; always deselects afterwards
    fn select<R>(
        &mut self,
        f: impl FnOnce(&mut SPI) -> Result<R, SPI::Error>,
    ) -> Result<R, Error<SPI::Error>> {
        self.cs.set_low().map_err(|_| Error::ChipSelect)?;
        let result = f(&mut self.spi);
        let flushed = self.spi.flush();
        let deselected = self.cs.set_high();
        let value = result.map_err(Error::Spi)?;
        flushed.map_err(Error::Spi)?;
        deselected.map_err(|_| Error::ChipSelect)?;
        Ok(value)
    }
}

impl<SPI: SpiBus, CS: OutputPin> ByteStorage for Eeprom25aa040a<SPI, CS> {
    type Error = Error<SPI::Error>;

    fn read_byte(&mut self, address: u16) -> Result<u8, Self::Error> {
        let mut byte = [0];
        self.read(address, &mut byte)?;
        Ok(byte[0])
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
        self.write_page(address, &[value])
    }
}

/// Instruction byte with address bit 8 folded in
#[must_use]
pub const fn instruction(command: u8, address: u16) -> u8 {
    command | (((address >> 8) as u8 & 1) << A8_SHIFT)
}

const fn address_low(address: u16) -> u8 {
    (address & 0xFF) as u8
}

fn check_range<E>(address: u16, len: usize) -> Result<(), Error<E>> {
    if usize::from(address) + len > usize::from(CAPACITY) {
        Err(Error::Address(address))
    } else {
        Ok(())
    }
}

//! Erase/program primitives and slot-level access to the one reserved flash page.
//!
//! The page is erased as a whole and programmed in double-words. Slots are fixed-size records at
//! `index * size` inside the page. Changing any slot rewrites the entire page.

use crate::error::{Error, FlashOp};
use crate::platform::{Platform, Unlocked};
use core::ops::Range;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

/// Minimum programmable unit of the flash controller.
pub const DOUBLEWORD_SIZE: usize = 8;

/// Offset of the reserved page from the start of flash (absolute address `0x0803_F800` on a
/// 256 KiB STM32F303).
pub const CONFIG_PAGE_OFFSET: u32 = 0x0003_F800;

/// One erase page.
pub const CONFIG_PAGE_SIZE: usize = 0x800;

/// The store for the reserved configuration page of the reference hardware.
pub type ConfigStore<T> = PageStore<T, CONFIG_PAGE_SIZE>;

/// A slot whose byte range has been checked to lie inside a page of `PAGE_SIZE` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot<const PAGE_SIZE: usize> {
    offset: usize,
    size: usize,
}

impl<const PAGE_SIZE: usize> Slot<PAGE_SIZE> {
    pub fn new(index: usize, size: usize) -> Result<Self, Error> {
        let offset = index.checked_mul(size).ok_or(Error::SlotOutOfRange)?;
        match offset.checked_add(size) {
            Some(end) if end <= PAGE_SIZE => Ok(Self { offset, size }),
            _ => Err(Error::SlotOutOfRange),
        }
    }

    /// Byte offset relative to the page start.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }
}

/// A copy of the whole reserved page, taken with a single read.
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage<const PAGE_SIZE: usize>([u8; PAGE_SIZE]);

impl<const PAGE_SIZE: usize> PageImage<PAGE_SIZE> {
    /// The image of a freshly erased page.
    pub const fn erased() -> Self {
        Self([0xFF; PAGE_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.0
    }

    pub fn slot(&self, slot: &Slot<PAGE_SIZE>) -> &[u8] {
        &self.0[slot.range()]
    }

    pub fn slot_mut(&mut self, slot: &Slot<PAGE_SIZE>) -> &mut [u8] {
        &mut self.0[slot.range()]
    }

    /// Page-relative offset and little-endian value of every double-word.
    pub fn doublewords(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.0
            .chunks_exact(DOUBLEWORD_SIZE)
            .enumerate()
            .map(|(i, chunk)| {
                let mut raw = [0u8; DOUBLEWORD_SIZE];
                raw.copy_from_slice(chunk);
                (i * DOUBLEWORD_SIZE, u64::from_le_bytes(raw))
            })
    }
}

impl<const PAGE_SIZE: usize> core::fmt::Debug for PageImage<PAGE_SIZE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let programmed = self.0.iter().filter(|&&b| b != 0xFF).count();
        write!(f, "PageImage({PAGE_SIZE} bytes, {programmed} programmed)")
    }
}

/// Owns one erase page of the flash controller `T`, starting at `base_address` (an offset from
/// the start of flash, as used by [`embedded_storage::nor_flash::NorFlash`]).
///
/// No other code may write to that page or make assumptions about its contents.
pub struct PageStore<T: Platform, const PAGE_SIZE: usize> {
    hal: T,
    base_address: u32,
}

impl<T: Platform, const PAGE_SIZE: usize> PageStore<T, PAGE_SIZE> {
    /// Checks the page geometry against the flash controller. Does not touch the flash.
    pub fn new(base_address: u32, hal: T) -> Result<Self, Error> {
        if PAGE_SIZE == 0
            || !PAGE_SIZE.is_multiple_of(T::ERASE_SIZE)
            || !PAGE_SIZE.is_multiple_of(DOUBLEWORD_SIZE)
        {
            return Err(Error::InvalidPageSize);
        }

        if !(base_address as usize).is_multiple_of(T::ERASE_SIZE) {
            return Err(Error::InvalidPageOffset);
        }

        match (base_address as usize).checked_add(PAGE_SIZE) {
            Some(end) if end <= hal.capacity() => {}
            _ => return Err(Error::InvalidPageOffset),
        }

        if !DOUBLEWORD_SIZE.is_multiple_of(T::WRITE_SIZE) {
            return Err(Error::UnsupportedWriteSize);
        }

        Ok(Self { hal, base_address })
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    fn end_address(&self) -> u32 {
        self.base_address + PAGE_SIZE as u32
    }

    /// Erases the entire page, every byte reads as `0xFF` afterwards.
    pub fn erase_page(&mut self) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("erase_page: @{:#08x}", self.base_address);

        #[cfg(feature = "debug-logs")]
        println!("  store: erase_page {:#08x}", self.base_address);

        let (from, to) = (self.base_address, self.end_address());
        let mut hal = Unlocked::new(&mut self.hal);
        hal.erase(from, to)
            .map_err(|e| Error::flash(FlashOp::Erase, e))
    }

    /// Programs one double-word. The target has to be erased, this is not verified.
    pub fn program_doubleword(&mut self, address: u32, data: u64) -> Result<(), Error> {
        if address < self.base_address
            || address as usize + DOUBLEWORD_SIZE > self.end_address() as usize
        {
            return Err(Error::AddressOutOfRange);
        }

        let mut hal = Unlocked::new(&mut self.hal);
        hal.write(address, &data.to_le_bytes())
            .map_err(|e| Error::flash(FlashOp::Program, e))
    }

    /// Reads the whole page in one go.
    pub fn read_page(&mut self) -> Result<PageImage<PAGE_SIZE>, Error> {
        let mut image = PageImage::erased();
        self.hal
            .read(self.base_address, &mut image.0)
            .map_err(|e| Error::flash(FlashOp::Read, e))?;
        Ok(image)
    }

    /// Stores `payload` in slot `index` of `size` bytes.
    ///
    /// Does nothing when the slot already holds `payload`. Otherwise the page is read, patched,
    /// erased and reprogrammed double-word by double-word. A failure after the erase leaves the
    /// page partially programmed until the next successful write; there is no rollback.
    pub fn write_slot(&mut self, payload: &[u8], index: usize, size: usize) -> Result<(), Error> {
        if !size.is_multiple_of(DOUBLEWORD_SIZE) {
            return Err(Error::SlotSizeNotAligned);
        }
        let slot = Slot::<PAGE_SIZE>::new(index, size)?;
        if payload.len() != size {
            return Err(Error::SlotLengthMismatch);
        }

        let mut image = self.read_page()?;
        if image.slot(&slot) == payload {
            #[cfg(feature = "defmt")]
            trace!("write_slot: slot {} unchanged", index);

            #[cfg(feature = "debug-logs")]
            println!("  store: write_slot {index}: unchanged");

            return Ok(());
        }

        image.slot_mut(&slot).copy_from_slice(payload);

        #[cfg(feature = "debug-logs")]
        println!("  store: write_slot {index}: rewriting page");

        self.erase_page()?;

        for (offset, value) in image.doublewords() {
            let result = self.program_doubleword(self.base_address + offset as u32, value);
            if let Err(e) = result {
                #[cfg(feature = "defmt")]
                warn!("write_slot: page left partially programmed at +{:#x}", offset);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Copies slot `index` of `size` bytes into `buffer`, reading only the slot's bytes. Out of
    /// range slots are rejected and leave `buffer` untouched.
    pub fn read_slot(&mut self, buffer: &mut [u8], index: usize, size: usize) -> Result<(), Error> {
        let slot = Slot::<PAGE_SIZE>::new(index, size)?;
        if buffer.len() != size {
            return Err(Error::SlotLengthMismatch);
        }

        self.hal
            .read(self.base_address + slot.offset() as u32, buffer)
            .map_err(|e| Error::flash(FlashOp::Read, e))
    }

    /// Address of the first double-word whose two 32-bit words are both erased.
    pub fn find_first_erased_doubleword(&mut self) -> Result<Option<u32>, Error> {
        let image = self.read_page()?;
        let found = image
            .doublewords()
            .find(|&(_, value)| value == u64::MAX)
            .map(|(offset, _)| self.base_address + offset as u32);
        Ok(found)
    }
}

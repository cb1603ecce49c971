use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use panel_hub::platform::FlashLock;
use panel_hub::store::{CONFIG_PAGE_SIZE, DOUBLEWORD_SIZE};

/// One config page of NOR flash held in memory.
///
/// Programming can only clear bits, like the real cells, so a missing erase shows up as corrupt
/// data instead of being papered over.
pub(crate) struct MemFlash {
    buf: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct MemFlashError(NorFlashErrorKind);

impl NorFlashError for MemFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        self.0
    }
}

impl MemFlash {
    pub(crate) fn erased() -> Self {
        Self {
            buf: vec![0xFF; CONFIG_PAGE_SIZE],
        }
    }

    /// The caller checks that `image` is exactly one page.
    pub(crate) fn from_image(image: &[u8]) -> Self {
        Self {
            buf: image.to_vec(),
        }
    }

    pub(crate) fn into_image(self) -> Vec<u8> {
        self.buf
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<usize, MemFlashError> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(start),
            _ => Err(MemFlashError(NorFlashErrorKind::OutOfBounds)),
        }
    }
}

impl ErrorType for MemFlash {
    type Error = MemFlashError;
}

impl ReadNorFlash for MemFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = self.check_range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.buf[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl NorFlash for MemFlash {
    const WRITE_SIZE: usize = DOUBLEWORD_SIZE;

    const ERASE_SIZE: usize = CONFIG_PAGE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if from > to || from as usize % Self::ERASE_SIZE != 0 || to as usize % Self::ERASE_SIZE != 0
        {
            return Err(MemFlashError(NorFlashErrorKind::NotAligned));
        }
        let start = self.check_range(from, (to - from) as usize)?;
        self.buf[start..to as usize].fill(0xFF);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if offset as usize % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(MemFlashError(NorFlashErrorKind::NotAligned));
        }
        let start = self.check_range(offset, bytes.len())?;
        for (cell, byte) in self.buf[start..start + bytes.len()].iter_mut().zip(bytes) {
            *cell &= byte;
        }
        Ok(())
    }
}

impl FlashLock for MemFlash {
    fn unlock(&mut self) {}

    fn lock(&mut self) {}
}

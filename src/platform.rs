use core::ops::{Deref, DerefMut};
use embedded_storage::nor_flash::NorFlash;

/// A flash controller that can erase and program the reserved configuration page.
///
/// See README.md for an example implementation.
pub trait Platform: NorFlash + FlashLock {}

impl<T: NorFlash + FlashLock> Platform for T {}

/// Write-protection bracket of the flash controller.
///
/// Controllers that latch a lock bit between operations (STM32 `FLASH_CR.LOCK`) unlock with the
/// key sequence and set the bit again afterwards. Drivers that bracket every operation internally
/// implement both as no-ops.
pub trait FlashLock {
    fn unlock(&mut self);
    fn lock(&mut self);
}

impl<T: FlashLock> FlashLock for &mut T {
    fn unlock(&mut self) {
        T::unlock(self)
    }

    fn lock(&mut self) {
        T::lock(self)
    }
}

/// Flash controller with the write protection lifted. Locks again when dropped, including on an
/// early `?` return.
pub(crate) struct Unlocked<'a, T: FlashLock> {
    hal: &'a mut T,
}

impl<'a, T: FlashLock> Unlocked<'a, T> {
    pub(crate) fn new(hal: &'a mut T) -> Self {
        hal.unlock();
        Self { hal }
    }
}

impl<T: FlashLock> Deref for Unlocked<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.hal
    }
}

impl<T: FlashLock> DerefMut for Unlocked<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.hal
    }
}

impl<T: FlashLock> Drop for Unlocked<'_, T> {
    fn drop(&mut self) {
        self.hal.lock();
    }
}

#[cfg(feature = "stm32f303cc")]
mod chip {
    use crate::platform::FlashLock;
    use embassy_stm32::flash::{Blocking, Error, Flash};
    use embedded_storage::nor_flash::{ErrorType, NorFlash, ReadNorFlash};

    pub struct Stm32Flash<'d> {
        inner: Flash<'d, Blocking>,
    }

    impl<'d> Stm32Flash<'d> {
        pub fn new(inner: Flash<'d, Blocking>) -> Self {
            Self { inner }
        }
    }

    impl ErrorType for Stm32Flash<'_> {
        type Error = Error;
    }

    impl NorFlash for Stm32Flash<'_> {
        const WRITE_SIZE: usize = <Flash<'static, Blocking> as NorFlash>::WRITE_SIZE;
        const ERASE_SIZE: usize = <Flash<'static, Blocking> as NorFlash>::ERASE_SIZE;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            self.inner.erase(from, to)
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            self.inner.write(offset, bytes)
        }
    }

    impl ReadNorFlash for Stm32Flash<'_> {
        const READ_SIZE: usize = <Flash<'static, Blocking> as ReadNorFlash>::READ_SIZE;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            self.inner.read(offset, bytes)
        }

        fn capacity(&self) -> usize {
            self.inner.capacity()
        }
    }

    // embassy unlocks and relocks the controller around every erase and program call.
    impl FlashLock for Stm32Flash<'_> {
        fn unlock(&mut self) {}

        fn lock(&mut self) {}
    }
}

#[cfg(feature = "stm32f303cc")]
pub use chip::*;

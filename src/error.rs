use embedded_storage::nor_flash::NorFlashErrorKind;
use thiserror::Error;

/// Errors that can occur while operating the profile store or routing packets. Marked as
/// non-exhaustive to allow for future additions without breaking the API. A caller would usually
/// only need to handle `Flash` as the other errors are static misconfigurations.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The flash controller rejected an operation. No retry has been attempted.
    #[error("flash {op} failed: {kind}")]
    Flash { op: FlashOp, kind: FlashErrorKind },

    /// `index * size + size` exceeds the reserved page.
    #[error("slot out of range")]
    SlotOutOfRange,

    /// Slots are programmed as whole double-words, so the size has to be a multiple of 8.
    #[error("slot size is not a multiple of the double-word size")]
    SlotSizeNotAligned,

    /// The buffer handed to a slot operation does not have the slot's size.
    #[error("buffer length does not match the slot size")]
    SlotLengthMismatch,

    /// The page offset has to be aligned to the erase size of the flash controller.
    #[error("invalid page offset")]
    InvalidPageOffset,

    /// The page size has to be a multiple of the erase size of the flash controller.
    #[error("invalid page size")]
    InvalidPageSize,

    /// The controller's write size has to divide the double-word size.
    #[error("unsupported flash write size")]
    UnsupportedWriteSize,

    /// A double-word address outside of the reserved page was passed.
    #[error("address out of range")]
    AddressOutOfRange,

    /// Mode-transition magic patterns are empty, longer than a packet or ambiguous.
    #[error("invalid magic pattern")]
    InvalidMagic,
}

/// The flash controller operation that failed.
#[derive(strum::Display, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "lowercase")]
pub enum FlashOp {
    Read,
    Erase,
    Program,
}

/// Local mirror of [`NorFlashErrorKind`] so the error stays `Copy` and `defmt::Format`.
#[derive(strum::Display, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashErrorKind {
    #[strum(serialize = "not aligned")]
    NotAligned,
    #[strum(serialize = "out of bounds")]
    OutOfBounds,
    #[strum(serialize = "other")]
    Other,
}

impl From<NorFlashErrorKind> for FlashErrorKind {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => FlashErrorKind::NotAligned,
            NorFlashErrorKind::OutOfBounds => FlashErrorKind::OutOfBounds,
            _ => FlashErrorKind::Other,
        }
    }
}

impl Error {
    pub(crate) fn flash<E: embedded_storage::nor_flash::NorFlashError>(op: FlashOp, e: E) -> Self {
        Error::Flash {
            op,
            kind: e.kind().into(),
        }
    }
}

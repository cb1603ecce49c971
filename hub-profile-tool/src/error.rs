use thiserror::Error;

/// Errors that can occur while building or inspecting page images and
/// packets.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("flash error: {0}")]
    FlashError(#[from] panel_hub::Error),

    #[error("payload of {0} bytes is longer than the 63 byte profile")]
    PayloadTooLong(usize),

    #[error("image size {0} does not match the 2048 byte config page")]
    InvalidImageSize(usize),
}

//! Host side helpers for the panel hub profile: builds and inspects images of the reserved config
//! page and the HID packets that push or request a profile.
//!
//! Images are produced by running the firmware's own [`ProfileStore`] against an in-memory flash,
//! so the layout always matches what the device writes.

pub mod error;

mod flash;

use std::fs;
use std::io::Write;
use std::path::Path;

pub use error::Error;
pub use panel_hub::packet::{ConfigPacket, Packet, PACKET_SIZE};
pub use panel_hub::profile::{Profile, PROFILE_PAYLOAD_SIZE};
pub use panel_hub::store::CONFIG_PAGE_SIZE;

use flash::MemFlash;
use panel_hub::profile::ProfileStore;
use panel_hub::store::PageStore;

/// Parse a profile payload from hex.
///
/// Payloads shorter than [`PROFILE_PAYLOAD_SIZE`] are zero-padded, longer ones are rejected.
pub fn parse_payload(hex: &str) -> Result<Profile, Error> {
    let bytes = hex::decode(hex.trim())?;
    if bytes.len() > PROFILE_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLong(bytes.len()));
    }

    let mut payload = [0u8; PROFILE_PAYLOAD_SIZE];
    payload[..bytes.len()].copy_from_slice(&bytes);
    Ok(Profile::from_bytes(payload))
}

/// Generate the config page image holding `profile` in slot 0. Everything else is erased.
pub fn build_image(profile: &Profile) -> Result<Vec<u8>, Error> {
    let mut flash = MemFlash::erased();
    let store = PageStore::<_, CONFIG_PAGE_SIZE>::new(0, &mut flash)?;
    ProfileStore::new(store).save(profile)?;
    Ok(flash.into_image())
}

/// Generate the config page image and write it to `path`.
pub fn build_image_file<P: AsRef<Path>>(profile: &Profile, path: P) -> Result<(), Error> {
    let data = build_image(profile)?;
    fs::File::create(path)?.write_all(&data)?;
    Ok(())
}

/// Decode the profile record of a config page image.
///
/// Returns `None` when the record fails its checksum, i.e. the device would fall back to the
/// default profile.
pub fn inspect_image(data: &[u8]) -> Result<Option<Profile>, Error> {
    if data.len() != CONFIG_PAGE_SIZE {
        return Err(Error::InvalidImageSize(data.len()));
    }

    let mut flash = MemFlash::from_image(data);
    let store = PageStore::<_, CONFIG_PAGE_SIZE>::new(0, &mut flash)?;
    Ok(ProfileStore::new(store).load())
}

/// Decode the profile record of the config page image at `path`.
pub fn inspect_image_file<P: AsRef<Path>>(path: P) -> Result<Option<Profile>, Error> {
    let data = fs::read(path)?;
    inspect_image(&data)
}

/// The packet that stores `profile` on a hub in config mode.
pub fn push_packet(profile: &Profile) -> Packet {
    Packet::with_profile(ConfigPacket::PushProfile, profile)
}

/// The packet that asks a hub in config mode for its stored profile.
pub fn read_packet() -> Packet {
    let mut bytes = [0u8; PACKET_SIZE];
    bytes[0] = ConfigPacket::ReadProfile as u8;
    Packet::new(bytes)
}

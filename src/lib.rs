#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod bus;
pub mod error;
pub mod frame;
pub mod hub;
pub mod mode;
pub mod packet;
pub mod platform;
pub mod profile;
pub mod router;
pub mod store;

pub use bus::{Panel, PanelBus, SensorResponse};
pub use error::Error;
pub use frame::{LedFrameAssembler, LedHeader};
pub use hub::{Hub, SensorReport};
pub use mode::{ConfigModeGate, MagicPatterns, Mode, ModeFlag, Transition};
pub use packet::{ConfigPacket, PACKET_SIZE, Packet, PacketSource, ReportSink};
pub use platform::{FlashLock, Platform};
pub use profile::{Profile, ProfileStore};
pub use router::{Dispatch, PacketRouter};
pub use store::{CONFIG_PAGE_OFFSET, CONFIG_PAGE_SIZE, ConfigStore, PageImage, PageStore, Slot};

/// Builds the hub for the reference hardware: the profile lives in the page at
/// [`CONFIG_PAGE_OFFSET`] and the default magic patterns switch modes.
pub fn config_hub<T: Platform>(hal: T) -> Result<Hub<T, CONFIG_PAGE_SIZE>, Error> {
    let store = ConfigStore::new(CONFIG_PAGE_OFFSET, hal)?;
    let router = PacketRouter::new(ConfigModeGate::default(), ProfileStore::new(store));
    Ok(Hub::new(router))
}

//! The user profile record: 63 payload bytes followed by an 8-bit additive checksum, kept in slot 0
//! of the reserved page.

use crate::error::Error;
use crate::platform::Platform;
use crate::store::PageStore;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

pub const PROFILE_PAYLOAD_SIZE: usize = 63;
pub const PROFILE_RECORD_SIZE: usize = PROFILE_PAYLOAD_SIZE + 1;
pub const PROFILE_SLOT_INDEX: usize = 0;

const SENSOR_SETTINGS_SIZE: usize = 32;
const PANEL_KEYS_SIZE: usize = 4;

const _: () = assert!(
    PROFILE_RECORD_SIZE % crate::store::DOUBLEWORD_SIZE == 0,
    "Profile record must be programmable in whole double-words"
);

/// The 63-byte profile as pushed by the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile([u8; PROFILE_PAYLOAD_SIZE]);

impl Profile {
    /// Used whenever slot 0 does not hold a record with a matching checksum.
    pub const DEFAULT: Profile = Profile([0; PROFILE_PAYLOAD_SIZE]);

    pub const fn from_bytes(bytes: [u8; PROFILE_PAYLOAD_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; PROFILE_PAYLOAD_SIZE] {
        &self.0
    }

    /// Sensor thresholds and hysteresis values.
    pub fn sensor_settings(&self) -> &[u8] {
        &self.0[..SENSOR_SETTINGS_SIZE]
    }

    /// Key mapping of the four panels.
    pub fn panel_keys(&self) -> &[u8] {
        &self.0[SENSOR_SETTINGS_SIZE..SENSOR_SETTINGS_SIZE + PANEL_KEYS_SIZE]
    }

    /// 8-bit wrapping sum of the payload.
    pub fn checksum(&self) -> u8 {
        checksum(&self.0)
    }

    fn to_record(self) -> [u8; PROFILE_RECORD_SIZE] {
        let mut record = [0u8; PROFILE_RECORD_SIZE];
        record[..PROFILE_PAYLOAD_SIZE].copy_from_slice(&self.0);
        record[PROFILE_PAYLOAD_SIZE] = self.checksum();
        record
    }

    /// `None` when the trailing checksum does not match the payload.
    fn from_record(record: &[u8; PROFILE_RECORD_SIZE]) -> Option<Self> {
        let mut payload = [0u8; PROFILE_PAYLOAD_SIZE];
        payload.copy_from_slice(&record[..PROFILE_PAYLOAD_SIZE]);
        let profile = Profile(payload);
        (profile.checksum() == record[PROFILE_PAYLOAD_SIZE]).then_some(profile)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl AsRef<[u8]> for Profile {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Persists a single [`Profile`] in the reserved page.
///
/// The checksum only detects damage: a torn write, a corrupted page and a page that was never
/// written all read back as [`Profile::DEFAULT`].
pub struct ProfileStore<T: Platform, const PAGE_SIZE: usize> {
    store: PageStore<T, PAGE_SIZE>,
}

impl<T: Platform, const PAGE_SIZE: usize> ProfileStore<T, PAGE_SIZE> {
    pub fn new(store: PageStore<T, PAGE_SIZE>) -> Self {
        Self { store }
    }

    /// Appends the checksum and writes the record to slot 0. Unchanged records do not touch the
    /// flash.
    pub fn save(&mut self, profile: &Profile) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("profile: save, checksum {:#04x}", profile.checksum());

        let record = profile.to_record();
        self.store
            .write_slot(&record, PROFILE_SLOT_INDEX, PROFILE_RECORD_SIZE)
    }

    /// Never fails: unreadable or invalid records resolve to [`Profile::DEFAULT`].
    pub fn read(&mut self) -> Profile {
        self.load().unwrap_or_default()
    }

    /// The stored profile, or `None` if slot 0 holds no valid record or could not be read.
    pub fn load(&mut self) -> Option<Profile> {
        let mut record = [0u8; PROFILE_RECORD_SIZE];
        if let Err(_e) = self
            .store
            .read_slot(&mut record, PROFILE_SLOT_INDEX, PROFILE_RECORD_SIZE)
        {
            #[cfg(feature = "defmt")]
            warn!("profile: read failed: {}", _e);
            return None;
        }

        let profile = Profile::from_record(&record);

        #[cfg(feature = "debug-logs")]
        println!("  profile: load, valid: {}", profile.is_some());

        profile
    }
}

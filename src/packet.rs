//! The 64-byte HID packet exchanged with the host, and the transport seams around it.

use crate::profile::{PROFILE_PAYLOAD_SIZE, Profile};

pub const PACKET_SIZE: usize = 64;

/// HID report id used for every report sent to the host. Zero means the interface has no report
/// ids.
pub const USB_SEND_REPORT_ID: u8 = 0;

/// Header byte of a config-mode packet.
#[derive(strum::FromRepr, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConfigPacket {
    /// Bytes 1..64 are the new profile.
    PushProfile = 0xF0,
    /// Host asks for the stored profile; answered with the same header.
    ReadProfile = 0xF1,
}

/// A single inbound or outbound HID packet.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet([u8; PACKET_SIZE]);

impl Packet {
    pub const fn new(bytes: [u8; PACKET_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn header(&self) -> u8 {
        self.0[0]
    }

    pub const fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }

    /// Bytes 1..64.
    pub fn payload(&self) -> [u8; PROFILE_PAYLOAD_SIZE] {
        let mut payload = [0u8; PROFILE_PAYLOAD_SIZE];
        payload.copy_from_slice(&self.0[1..]);
        payload
    }

    /// A config-mode packet carrying `profile`, e.g. a push request or a read reply.
    pub fn with_profile(kind: ConfigPacket, profile: &Profile) -> Self {
        let mut bytes = [0u8; PACKET_SIZE];
        bytes[0] = kind as u8;
        bytes[1..].copy_from_slice(profile.as_bytes());
        Self(bytes)
    }

    pub fn config_kind(&self) -> Option<ConfigPacket> {
        ConfigPacket::from_repr(self.header())
    }
}

impl From<[u8; PACKET_SIZE]> for Packet {
    fn from(bytes: [u8; PACKET_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Inbound side of the HID transport. Buffers at most one packet.
pub trait PacketSource {
    /// The next received packet, if one is pending.
    fn next_packet(&mut self) -> Option<Packet>;
}

impl<T: PacketSource> PacketSource for &mut T {
    fn next_packet(&mut self) -> Option<Packet> {
        (*self).next_packet()
    }
}

/// Outbound side of the HID transport.
pub trait ReportSink {
    fn send_report(&mut self, report_id: u8, data: &[u8]);
}

impl<T: ReportSink> ReportSink for &mut T {
    fn send_report(&mut self, report_id: u8, data: &[u8]) {
        (*self).send_report(report_id, data)
    }
}

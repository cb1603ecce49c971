use crate::bus::PanelBus;
use crate::error::Error;
use crate::frame::{Assembled, LedFrameAssembler};
use crate::mode::{ConfigModeGate, Mode, ModeFlag};
use crate::packet::{ConfigPacket, Packet, ReportSink, USB_SEND_REPORT_ID};
use crate::platform::Platform;
use crate::profile::{Profile, ProfileStore};
#[cfg(feature = "defmt")]
use defmt::trace;

/// What happened to a routed packet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// A magic packet switched the mode; the packet was consumed.
    ModeChanged(Mode),
    /// Normal mode: the packet was an LED segment.
    LedSegment(Assembled),
    /// Config mode: the pushed profile was saved.
    ProfileSaved,
    /// Config mode: the stored profile was sent to the host.
    ProfileSent,
    /// Config mode: unknown header byte, nothing was done.
    Ignored(u8),
}

/// Sends each inbound packet to the consumer for the current mode.
pub struct PacketRouter<T: Platform, const PAGE_SIZE: usize> {
    gate: ConfigModeGate,
    assembler: LedFrameAssembler,
    profiles: ProfileStore<T, PAGE_SIZE>,
}

impl<T: Platform, const PAGE_SIZE: usize> PacketRouter<T, PAGE_SIZE> {
    pub fn new(gate: ConfigModeGate, profiles: ProfileStore<T, PAGE_SIZE>) -> Self {
        Self {
            gate,
            assembler: LedFrameAssembler::new(),
            profiles,
        }
    }

    /// Mode transitions are checked first and consume the packet. Otherwise normal mode feeds the
    /// LED assembler and config mode runs the profile command in the header byte.
    ///
    /// Only a failed profile save returns an error.
    pub fn route<B: PanelBus, U: ReportSink>(
        &mut self,
        mode: &mut ModeFlag,
        packet: &Packet,
        bus: &mut B,
        usb: &mut U,
    ) -> Result<Dispatch, Error> {
        if self.gate.apply(mode, packet) {
            return Ok(Dispatch::ModeChanged(mode.get()));
        }

        if !mode.is_config() {
            let assembled = self.assembler.push(packet, bus);
            return Ok(Dispatch::LedSegment(assembled));
        }

        #[cfg(feature = "defmt")]
        trace!("router: config packet {:#04x}", packet.header());

        match packet.config_kind() {
            Some(ConfigPacket::PushProfile) => {
                let profile = Profile::from_bytes(packet.payload());
                self.profiles.save(&profile)?;
                Ok(Dispatch::ProfileSaved)
            }
            Some(ConfigPacket::ReadProfile) => {
                let profile = self.profiles.read();
                let reply = Packet::with_profile(ConfigPacket::ReadProfile, &profile);
                usb.send_report(USB_SEND_REPORT_ID, reply.as_bytes());
                Ok(Dispatch::ProfileSent)
            }
            None => Ok(Dispatch::Ignored(packet.header())),
        }
    }

    pub fn assembler(&self) -> &LedFrameAssembler {
        &self.assembler
    }

    pub fn profiles(&mut self) -> &mut ProfileStore<T, PAGE_SIZE> {
        &mut self.profiles
    }
}

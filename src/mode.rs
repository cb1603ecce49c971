//! Normal/config operating mode and the magic packets that switch between them.

use crate::error::Error;
use crate::packet::{PACKET_SIZE, Packet};
#[cfg(feature = "defmt")]
use defmt::trace;

/// How inbound packets are interpreted.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Packets carry LED segments and sensor reports flow to the host.
    #[default]
    Normal,
    /// Packets are profile store commands.
    Config,
}

/// The current [`Mode`]. Lives in RAM only and starts out as [`Mode::Normal`].
///
/// Anyone may read it, only [`ConfigModeGate`] changes it.
#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeFlag(Mode);

impl ModeFlag {
    pub const fn new() -> Self {
        Self(Mode::Normal)
    }

    pub const fn get(&self) -> Mode {
        self.0
    }

    pub const fn is_config(&self) -> bool {
        matches!(self.0, Mode::Config)
    }
}

/// Outcome of inspecting a packet for a mode change.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    NoTransition,
    EnterConfig,
    ExitConfig,
}

/// Prefixes identifying the enter and exit packets.
///
/// A packet matches when it starts with the pattern. Neither pattern may be a prefix of the other,
/// so a packet matches at most one of them. The default patterns end in non-zero bytes, so a
/// truncated and zero-padded packet never switches the mode.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MagicPatterns {
    enter: &'static [u8],
    exit: &'static [u8],
}

impl MagicPatterns {
    pub const DEFAULT: MagicPatterns = MagicPatterns {
        enter: &[0xF5, b'P', b'H', b'U', b'B', b'C', b'F', b'G', 0x01],
        exit: &[0xF5, b'P', b'H', b'U', b'B', b'C', b'F', b'G', 0x02],
    };

    pub fn new(enter: &'static [u8], exit: &'static [u8]) -> Result<Self, Error> {
        let valid_len = |p: &[u8]| !p.is_empty() && p.len() <= PACKET_SIZE;
        if !valid_len(enter) || !valid_len(exit) {
            return Err(Error::InvalidMagic);
        }
        if enter.starts_with(exit) || exit.starts_with(enter) {
            return Err(Error::InvalidMagic);
        }
        Ok(Self { enter, exit })
    }

    pub fn enter(&self) -> &'static [u8] {
        self.enter
    }

    pub fn exit(&self) -> &'static [u8] {
        self.exit
    }
}

impl Default for MagicPatterns {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Recognises the enter/exit packets and is the only writer of the [`ModeFlag`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigModeGate {
    patterns: MagicPatterns,
}

impl ConfigModeGate {
    pub fn new(patterns: MagicPatterns) -> Self {
        Self { patterns }
    }

    /// Pure function of the packet contents, independent of the current mode.
    pub fn classify(&self, packet: &Packet) -> Transition {
        let bytes = packet.as_bytes();
        if bytes.starts_with(self.patterns.enter) {
            Transition::EnterConfig
        } else if bytes.starts_with(self.patterns.exit) {
            Transition::ExitConfig
        } else {
            Transition::NoTransition
        }
    }

    /// Classifies `packet` and applies the transition. Returns `true` if the packet was a
    /// transition packet and must not be routed any further.
    pub fn apply(&self, flag: &mut ModeFlag, packet: &Packet) -> bool {
        let mode = match self.classify(packet) {
            Transition::NoTransition => return false,
            Transition::EnterConfig => Mode::Config,
            Transition::ExitConfig => Mode::Normal,
        };

        #[cfg(feature = "defmt")]
        trace!("mode: {} -> {}", flag.0, mode);

        #[cfg(feature = "debug-logs")]
        println!("  mode: {:?} -> {:?}", flag.0, mode);

        flag.0 = mode;
        true
    }
}

//! Reassembly of LED frames from per-segment packets.
//!
//! Each frame is split into `PANELS_PER_PLATFORM * SEGMENTS_PER_PANEL` segments of one packet
//! each. Segments are forwarded to their panel as soon as they arrive; once every segment of a
//! frame has been seen, all panels are told to commit at the start of the next packet.

use crate::bus::{Panel, PanelBus};
use crate::packet::{PACKET_SIZE, Packet};
#[cfg(feature = "defmt")]
use defmt::trace;

pub const BYTES_PER_SEGMENT: usize = PACKET_SIZE;
pub const SEGMENTS_PER_PANEL: usize = 4;
pub const BYTES_PER_PANEL: usize = BYTES_PER_SEGMENT * SEGMENTS_PER_PANEL;
pub const PANELS_PER_PLATFORM: usize = 4;
pub const LED_ARRAY_SIZE: usize = BYTES_PER_PANEL * PANELS_PER_PLATFORM;

const SEGMENTS_PER_FRAME: usize = PANELS_PER_PLATFORM * SEGMENTS_PER_PANEL;

const _: () = assert!(
    SEGMENTS_PER_FRAME <= u16::BITS as usize,
    "Segment bitmask must fit into u16"
);
const _: () = assert!(PANELS_PER_PLATFORM == Panel::ALL.len());

/// Bitmask value once every segment of every panel has arrived.
pub const COMPLETE_FRAME: u16 = u16::MAX >> (u16::BITS - SEGMENTS_PER_FRAME as u32);

/// Header byte of an LED packet: `panel = bits 7:6`, `segment = bits 5:4`, `frame = bits 3:0`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedHeader {
    pub panel: Panel,
    pub segment: u8,
    /// 4-bit rolling frame counter.
    pub frame: u8,
}

impl LedHeader {
    pub const fn decode(header: u8) -> Self {
        Self {
            panel: Panel::from_bits(header >> 6),
            segment: (header >> 4) & 0x03,
            frame: header & 0x0F,
        }
    }

    pub const fn encode(&self) -> u8 {
        ((self.panel as u8) << 6) | ((self.segment & 0x03) << 4) | (self.frame & 0x0F)
    }

    fn buffer_offset(&self) -> usize {
        self.panel.index() * BYTES_PER_PANEL + self.segment as usize * BYTES_PER_SEGMENT
    }

    fn bit(&self) -> u16 {
        1 << (self.panel.index() * SEGMENTS_PER_PANEL + self.segment as usize)
    }
}

/// Result of feeding one packet to the assembler.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Assembled {
    pub header: LedHeader,
    /// The previous frame was complete and has been committed before this packet was handled.
    pub committed: bool,
}

/// Reassembly state shared by all panels.
pub struct LedFrameAssembler {
    segments_received: u16,
    previous_frame: Option<u8>,
    buffer: [u8; LED_ARRAY_SIZE],
}

impl LedFrameAssembler {
    pub const fn new() -> Self {
        Self {
            segments_received: 0,
            previous_frame: None,
            buffer: [0; LED_ARRAY_SIZE],
        }
    }

    /// Handles one LED packet.
    ///
    /// A frame completed by an earlier packet is committed first, so it is flushed exactly once.
    /// A change of the frame counter discards the partial progress of the old frame.
    pub fn push<B: PanelBus>(&mut self, packet: &Packet, bus: &mut B) -> Assembled {
        let committed = self.segments_received == COMPLETE_FRAME;
        if committed {
            self.segments_received = 0;
            for panel in Panel::ALL {
                bus.commit_leds(panel);
            }
        }

        let header = LedHeader::decode(packet.header());
        let offset = header.buffer_offset();
        let segment = &mut self.buffer[offset..offset + BYTES_PER_SEGMENT];
        segment.copy_from_slice(packet.as_bytes());

        if self.previous_frame != Some(header.frame) {
            self.segments_received = 0;
        }
        self.segments_received |= header.bit();

        #[cfg(feature = "defmt")]
        trace!(
            "frame {}: panel {} segment {}, mask {:#06x}",
            header.frame, header.panel, header.segment, self.segments_received
        );

        bus.send_segment(header.panel, &self.buffer[offset..offset + BYTES_PER_SEGMENT]);
        self.previous_frame = Some(header.frame);

        Assembled { header, committed }
    }

    /// Bitmask of the segments seen for the frame in progress.
    pub fn segments_received(&self) -> u16 {
        self.segments_received
    }

    /// Every segment of the current frame has arrived; the commit goes out with the next packet.
    pub fn is_complete(&self) -> bool {
        self.segments_received == COMPLETE_FRAME
    }

    pub fn previous_frame(&self) -> Option<u8> {
        self.previous_frame
    }

    /// The most recently received bytes of every segment, panel-major.
    pub fn frame_data(&self) -> &[u8; LED_ARRAY_SIZE] {
        &self.buffer
    }
}

impl Default for LedFrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

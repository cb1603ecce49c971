#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use panel_hub::bus::{Panel, PanelBus, SensorResponse};
use panel_hub::frame::LedHeader;
use panel_hub::packet::{PACKET_SIZE, Packet, PacketSource, ReportSink};
use panel_hub::platform::FlashLock;
use panel_hub::store::{CONFIG_PAGE_SIZE, PageStore};
use std::collections::VecDeque;

pub const FLASH_PAGE_SIZE: usize = CONFIG_PAGE_SIZE;
pub const READ_SIZE: usize = 4;
pub const DOUBLEWORD_SIZE: usize = 8;
/// The tests keep the reserved page in the second page of the mock flash.
pub const PAGE_OFFSET: u32 = FLASH_PAGE_SIZE as u32;
pub const DOUBLEWORDS_PER_PAGE: usize = FLASH_PAGE_SIZE / DOUBLEWORD_SIZE;

pub struct Flash {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
    pub locked: bool,
    pub unlocks: usize,
    pub locks: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
    Erase { offset: u32, len: usize },
}

impl Flash {
    pub fn new(pages: usize) -> Self {
        Self {
            buf: vec![0xffu8; FLASH_PAGE_SIZE * pages],
            fail_after_operation: usize::MAX,
            operations: Vec::new(),
            locked: true,
            unlocks: 0,
            locks: 0,
        }
    }

    pub fn new_with_fault(pages: usize, fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new(pages)
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    /// The reserved page as the tests see it.
    pub fn page(&self) -> &[u8] {
        &self.buf[PAGE_OFFSET as usize..PAGE_OFFSET as usize + FLASH_PAGE_SIZE]
    }

    pub fn page_mut(&mut self) -> &mut [u8] {
        &mut self.buf[PAGE_OFFSET as usize..PAGE_OFFSET as usize + FLASH_PAGE_SIZE]
    }

    pub fn erases(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Erase { .. }))
            .count()
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }

    fn check_fault(&self) -> Result<(), FlashError> {
        if self.operations.len() >= self.fail_after_operation {
            println!("    flash: FAULT");
            return Err(FlashError(NorFlashErrorKind::Other));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FlashError(pub NorFlashErrorKind);

impl NorFlashError for FlashError {
    fn kind(&self) -> NorFlashErrorKind {
        self.0
    }
}

impl ErrorType for Flash {
    type Error = FlashError;
}

impl ReadNorFlash for Flash {
    const READ_SIZE: usize = READ_SIZE;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::READ_SIZE as _));

        println!(
            "    flash: read:  0x{offset:04X}[0x{:04X}] #{:>3}",
            bytes.len(),
            self.operations.len()
        );
        self.check_fault()?;
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl NorFlash for Flash {
    const WRITE_SIZE: usize = DOUBLEWORD_SIZE;

    const ERASE_SIZE: usize = FLASH_PAGE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        assert!(from.is_multiple_of(Self::ERASE_SIZE as _));
        assert!(to.is_multiple_of(Self::ERASE_SIZE as _));
        assert!(!self.locked, "erase while the controller is locked");

        println!(
            "    flash: erase: {from:04X} - {to:04X} #{:>3}",
            self.operations.len()
        );
        self.check_fault()?;

        self.operations.push(Operation::Erase {
            offset: from,
            len: (to - from) as usize,
        });

        for addr in from..to {
            self.buf[addr as usize] = 0xff;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        assert!(!self.locked, "write while the controller is locked");

        if !offset.is_multiple_of(Self::WRITE_SIZE as _)
            || !bytes.len().is_multiple_of(Self::WRITE_SIZE)
        {
            return Err(FlashError(NorFlashErrorKind::NotAligned));
        }

        self.check_fault()?;

        let start = offset as usize;
        let target = &mut self.buf[start..start + bytes.len()];
        // programming is only possible from the erased state
        if target.iter().any(|&b| b != 0xff) {
            println!("    flash: write to programmed cell 0x{offset:04X}");
            return Err(FlashError(NorFlashErrorKind::Other));
        }

        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });
        target.copy_from_slice(bytes);
        Ok(())
    }
}

impl FlashLock for Flash {
    fn unlock(&mut self) {
        assert!(self.locked, "controller unlocked twice");
        self.locked = false;
        self.unlocks += 1;
    }

    fn lock(&mut self) {
        self.locked = true;
        self.locks += 1;
    }
}

pub fn page_store(flash: &mut Flash) -> PageStore<&mut Flash, FLASH_PAGE_SIZE> {
    PageStore::new(PAGE_OFFSET, flash).unwrap()
}

#[derive(Debug, PartialEq, Clone)]
pub enum BusEvent {
    Segment(Panel, Vec<u8>),
    Commit(Panel),
    RequestSensors(Panel),
}

#[derive(Default)]
pub struct Bus {
    pub events: Vec<BusEvent>,
    pub responses: VecDeque<SensorResponse>,
}

impl Bus {
    pub fn commits(&self) -> usize {
        self.events
            .iter()
            .filter(|ev| matches!(ev, BusEvent::Commit(_)))
            .count()
    }

    pub fn segments(&self) -> usize {
        self.events
            .iter()
            .filter(|ev| matches!(ev, BusEvent::Segment(..)))
            .count()
    }
}

impl PanelBus for Bus {
    fn send_segment(&mut self, panel: Panel, data: &[u8]) {
        self.events.push(BusEvent::Segment(panel, data.to_vec()));
    }

    fn commit_leds(&mut self, panel: Panel) {
        self.events.push(BusEvent::Commit(panel));
    }

    fn request_sensors(&mut self, panel: Panel) {
        self.events.push(BusEvent::RequestSensors(panel));
    }

    fn take_response(&mut self) -> Option<SensorResponse> {
        self.responses.pop_front()
    }
}

#[derive(Default)]
pub struct Usb {
    pub reports: Vec<(u8, Vec<u8>)>,
}

impl ReportSink for Usb {
    fn send_report(&mut self, report_id: u8, data: &[u8]) {
        self.reports.push((report_id, data.to_vec()));
    }
}

#[derive(Default)]
pub struct Inbound(pub VecDeque<Packet>);

impl PacketSource for Inbound {
    fn next_packet(&mut self) -> Option<Packet> {
        self.0.pop_front()
    }
}

/// An LED packet whose data bytes are all `fill`.
pub fn led_packet(panel: Panel, segment: u8, frame: u8, fill: u8) -> Packet {
    let mut bytes = [fill; PACKET_SIZE];
    bytes[0] = LedHeader {
        panel,
        segment,
        frame,
    }
    .encode();
    Packet::new(bytes)
}

/// A packet that starts with `prefix` and is zero-padded.
pub fn packet_with_prefix(prefix: &[u8]) -> Packet {
    let mut bytes = [0u8; PACKET_SIZE];
    bytes[..prefix.len()].copy_from_slice(prefix);
    Packet::new(bytes)
}

pub fn sample_payload(seed: u8) -> [u8; 63] {
    let mut payload = [0u8; 63];
    for (i, b) in payload.iter_mut().enumerate() {
        *b = seed.wrapping_add((i as u8).wrapping_mul(7));
    }
    payload
}

//! One pass of the cooperative main loop.

use crate::bus::{Panel, PanelBus, SENSOR_RESPONSE_LEN, SensorResponse};
use crate::error::Error;
use crate::mode::ModeFlag;
use crate::packet::{PACKET_SIZE, PacketSource, ReportSink, USB_SEND_REPORT_ID};
use crate::platform::Platform;
use crate::router::{Dispatch, PacketRouter};
#[cfg(feature = "defmt")]
use defmt::warn;

const _: () = assert!(Panel::ALL.len() * SENSOR_RESPONSE_LEN <= PACKET_SIZE);

/// Latest sensor readings of all panels, in the layout reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReport([u8; PACKET_SIZE]);

impl SensorReport {
    pub const fn new() -> Self {
        Self([0; PACKET_SIZE])
    }

    /// Copies the response to the panel's 8-byte window.
    pub fn update(&mut self, response: &SensorResponse) {
        let offset = response.panel().index() * SENSOR_RESPONSE_LEN;
        let data = response.data();
        self.0[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }
}

impl Default for SensorReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the mode flag, the packet router and the sensor report.
pub struct Hub<T: Platform, const PAGE_SIZE: usize> {
    mode: ModeFlag,
    router: PacketRouter<T, PAGE_SIZE>,
    sensors: SensorReport,
}

impl<T: Platform, const PAGE_SIZE: usize> Hub<T, PAGE_SIZE> {
    pub fn new(router: PacketRouter<T, PAGE_SIZE>) -> Self {
        Self {
            mode: ModeFlag::new(),
            router,
            sensors: SensorReport::new(),
        }
    }

    /// Asks every panel for sensor data. Call once before the first [`Hub::poll`].
    pub fn start<B: PanelBus>(&mut self, bus: &mut B) {
        request_sensors(bus);
    }

    /// Runs one loop iteration:
    /// 1. store at most one pending sensor response,
    /// 2. route at most one inbound packet,
    /// 3. report sensor data to the host, in normal mode only,
    /// 4. poll all panels again.
    ///
    /// The remaining steps still run when routing fails; the routing error is returned afterwards.
    pub fn poll<B, U, S>(
        &mut self,
        bus: &mut B,
        usb: &mut U,
        source: &mut S,
    ) -> Result<Option<Dispatch>, Error>
    where
        B: PanelBus,
        U: ReportSink,
        S: PacketSource,
    {
        if let Some(response) = bus.take_response() {
            self.sensors.update(&response);
        }

        let routed = match source.next_packet() {
            Some(packet) => self
                .router
                .route(&mut self.mode, &packet, bus, usb)
                .map(Some),
            None => Ok(None),
        };

        if let Err(_e) = &routed {
            #[cfg(feature = "defmt")]
            warn!("hub: routing failed: {}", _e);
        }

        if !self.mode.is_config() {
            usb.send_report(USB_SEND_REPORT_ID, self.sensors.as_bytes());
        }

        request_sensors(bus);

        routed
    }

    pub fn mode(&self) -> &ModeFlag {
        &self.mode
    }

    pub fn sensors(&self) -> &SensorReport {
        &self.sensors
    }

    pub fn router(&mut self) -> &mut PacketRouter<T, PAGE_SIZE> {
        &mut self.router
    }
}

fn request_sensors<B: PanelBus>(bus: &mut B) {
    for panel in Panel::ALL {
        bus.request_sensors(panel);
    }
}

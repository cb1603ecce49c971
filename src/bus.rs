//! Seam towards the internal panel bus. The bus transport, retries and polling live behind
//! [`PanelBus`].

/// Bytes each panel reports per sensor poll.
pub const SENSOR_RESPONSE_LEN: usize = 8;

/// One of the four panels, numbered by the comport it hangs off.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Panel {
    Left = 0,
    Down = 1,
    Up = 2,
    Right = 3,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Left, Panel::Down, Panel::Up, Panel::Right];

    /// Panel from the two low bits of `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Panel::Left,
            1 => Panel::Down,
            2 => Panel::Up,
            _ => Panel::Right,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Sensor data returned by one panel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorResponse {
    panel: Panel,
    data: [u8; SENSOR_RESPONSE_LEN],
    len: usize,
}

impl SensorResponse {
    /// Keeps at most [`SENSOR_RESPONSE_LEN`] bytes of `data`.
    pub fn new(panel: Panel, data: &[u8]) -> Self {
        let len = data.len().min(SENSOR_RESPONSE_LEN);
        let mut buf = [0u8; SENSOR_RESPONSE_LEN];
        buf[..len].copy_from_slice(&data[..len]);
        Self {
            panel,
            data: buf,
            len,
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Requests queued towards the panels. Sending is fire-and-forget from the hub's point of view.
pub trait PanelBus {
    /// Forward one LED segment to `panel`.
    fn send_segment(&mut self, panel: Panel, data: &[u8]);

    /// Latch the segments sent so far on `panel`.
    fn commit_leds(&mut self, panel: Panel);

    /// Ask `panel` for its sensor readings.
    fn request_sensors(&mut self, panel: Panel);

    /// Pump the bus and return a pending sensor response, if any.
    fn take_response(&mut self) -> Option<SensorResponse>;
}

impl<T: PanelBus> PanelBus for &mut T {
    fn send_segment(&mut self, panel: Panel, data: &[u8]) {
        (*self).send_segment(panel, data)
    }

    fn commit_leds(&mut self, panel: Panel) {
        (*self).commit_leds(panel)
    }

    fn request_sensors(&mut self, panel: Panel) {
        (*self).request_sensors(panel)
    }

    fn take_response(&mut self) -> Option<SensorResponse> {
        (*self).take_response()
    }
}

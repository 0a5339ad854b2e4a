use anyhow::Context;
use serialport::{SerialPortInfo, SerialPortType};

/// PJRC (Teensy) USB vendor id.
pub const TEENSY_VID: u16 = 0x16C0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub device: String,
    pub vid: Option<u16>,
    pub description: Option<String>,
}

impl From<SerialPortInfo> for PortCandidate {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, description) = match info.port_type {
            SerialPortType::UsbPort(usb) => (Some(usb.vid), usb.product.or(usb.manufacturer)),
            SerialPortType::BluetoothPort => (None, Some("Bluetooth".to_string())),
            _ => (None, None),
        };
        Self {
            device: info.port_name,
            vid,
            description,
        }
    }
}

impl PortCandidate {
    fn looks_like_flight_controller(&self) -> bool {
        self.vid == Some(TEENSY_VID)
            || self.device.contains("ACM")
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.contains("USB"))
    }
}

pub fn list_ports() -> anyhow::Result<Vec<PortCandidate>> {
    let ports = serialport::available_ports().context("failed to enumerate serial ports")?;
    Ok(ports.into_iter().map(PortCandidate::from).collect())
}

/// Most likely flight controller port. Names are searched in reverse order so
/// the newest CDC device (`ttyACM1` before `ttyACM0`) wins.
pub fn pick_flight_controller(ports: &[PortCandidate]) -> Option<String> {
    let mut sorted: Vec<&PortCandidate> = ports.iter().collect();
    sorted.sort_by(|a, b| b.device.cmp(&a.device));
    sorted
        .into_iter()
        .find(|p| p.looks_like_flight_controller())
        .map(|p| p.device.clone())
}

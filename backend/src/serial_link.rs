use anyhow::Context;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

// ======================================================================
//  Link Device Traits
// ======================================================================

/// Byte pipe to the flight controller.
pub trait LinkDevice: Send {
    /// Non-blocking read of whatever is already waiting; `Ok(0)` when idle.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Acquires a [`LinkDevice`] for a port identifier.
pub trait LinkOpener: Send {
    fn open(&mut self, port: &str, baud: u32) -> anyhow::Result<Box<dyn LinkDevice>>;
}

// ======================================================================
//  Serial Port Implementation
// ======================================================================
pub struct SerialLink {
    inner: Box<dyn SerialPort>,
}

impl SerialLink {
    /// 8N1, no flow control, zero read timeout.
    pub fn open(path: &str, baud: u32) -> anyhow::Result<Self> {
        let inner = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::ZERO)
            .open()
            .with_context(|| format!("failed to open serial port {path}"))?;
        Ok(Self { inner })
    }
}

impl LinkDevice for SerialLink {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // an unplugged CDC device shows up here as an error, not as zero
        let waiting = self.inner.bytes_to_read().map_err(io::Error::from)? as usize;
        if waiting == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = waiting.min(buf.len());
        match self.inner.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.inner.flush()
    }
}

#[derive(Debug, Default)]
pub struct SerialOpener;

impl LinkOpener for SerialOpener {
    fn open(&mut self, port: &str, baud: u32) -> anyhow::Result<Box<dyn LinkDevice>> {
        #[cfg(feature = "testing")]
        if port == crate::sim_fc::SIM_PORT {
            tracing::info!("using simulated flight controller");
            return Ok(Box::new(crate::sim_fc::SimulatedFc::new()));
        }
        Ok(Box::new(SerialLink::open(port, baud)?))
    }
}

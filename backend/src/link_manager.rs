use crate::classifier::Line;
use crate::commands::{encode_command, prepare_manual_command, CommandError};
use crate::config::LinkConfig;
use crate::config_store::{ConfigStore, LimitOutcome};
use crate::events::EventSink;
use crate::frame_buffer::FrameBuffer;
use crate::serial_link::{LinkDevice, LinkOpener};
use crate::telemetry_decode::decode_telemetry;
use racs_groundstation_shared::{ActuatorLimit, ConnectionState, FcCommand, LogCategory};
use std::collections::BTreeMap;
use std::io;

/// Boot banner substring that triggers an automatic config dump.
pub const BOOT_READY_MARKER: &str = "BAYES READY";

/// Owns the serial link to the flight controller and everything derived from
/// its output.
///
/// All methods are synchronous and expected to be driven from one task (see
/// [`crate::link_task`]); the manager itself holds no locks.
pub struct ConnectionManager {
    opener: Box<dyn LinkOpener>,
    device: Option<Box<dyn LinkDevice>>,
    port: Option<String>,
    state: ConnectionState,
    baud_rate: u32,
    read_buf: Vec<u8>,
    frames: FrameBuffer,
    config: ConfigStore,
    events: EventSink,
}

impl ConnectionManager {
    pub fn new(opener: Box<dyn LinkOpener>, cfg: &LinkConfig, events: EventSink) -> Self {
        Self {
            opener,
            device: None,
            port: None,
            state: ConnectionState::Disconnected,
            baud_rate: cfg.baud_rate,
            read_buf: vec![0u8; cfg.read_chunk_size.max(1)],
            frames: FrameBuffer::new(),
            config: ConfigStore::new(),
            events,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    pub fn config_snapshot(&self) -> BTreeMap<String, String> {
        self.config.snapshot()
    }

    pub fn actuator_limit(&mut self) -> ActuatorLimit {
        self.config.actuator_limit()
    }

    /// Connect to `port`. A failure is reported as a fault log event and
    /// leaves the manager disconnected; there is no automatic retry.
    pub fn open(&mut self, port: &str) {
        if self.is_connected() {
            self.close();
        }

        match self.opener.open(port, self.baud_rate) {
            Ok(device) => {
                self.device = Some(device);
                self.port = Some(port.to_string());
                self.state = ConnectionState::Connected;
                self.events
                    .log(format!("--- CONNECTED TO {port} ---"), LogCategory::Link);
                self.events.connection_state(ConnectionState::Connected);
            }
            Err(e) => {
                self.events
                    .log(format!("Failed to connect: {e:#}"), LogCategory::Fault);
            }
        }
    }

    /// Operator-requested disconnect. Safe to call in any state.
    pub fn close(&mut self) {
        if self.device.is_none() {
            return;
        }
        self.release();
    }

    /// Drain everything the device has buffered, reading until it reports
    /// idle, and dispatch every complete line. A read fault tears the link
    /// down after the lines already read have been dispatched.
    pub fn poll(&mut self) {
        loop {
            let Some(device) = self.device.as_mut() else {
                return;
            };

            let n = match device.read_available(&mut self.read_buf) {
                Ok(0) => return,
                Ok(n) => n,
                Err(e) => {
                    self.fault(e);
                    return;
                }
            };

            let lines: Vec<String> = self.frames.push(&self.read_buf[..n]).collect();
            for line in &lines {
                self.dispatch(line);
            }
        }
    }

    /// Fire-and-forget write. Dropped silently while disconnected.
    pub fn send(&mut self, command: &str) {
        let Some(device) = self.device.as_mut() else {
            tracing::debug!("not connected, dropping command {command:?}");
            return;
        };

        match device.write_all(&encode_command(command)) {
            Ok(()) => self.events.log(format!("Sent: {command}"), LogCategory::Sent),
            Err(e) => self
                .events
                .log(format!("Failed to send {command:?}: {e}"), LogCategory::Fault),
        }
    }

    pub fn send_command(&mut self, command: &FcCommand) {
        self.send(&command.wire_text());
    }

    /// Send a command typed by the operator; blank input is refused.
    pub fn send_manual(&mut self, input: &str) -> Result<(), CommandError> {
        let command = prepare_manual_command(input)?;
        self.send(&command);
        Ok(())
    }

    fn fault(&mut self, err: io::Error) {
        self.events
            .log(format!("Serial Error: {err}"), LogCategory::Fault);
        self.release();
    }

    fn release(&mut self) {
        // dropping the device closes the port
        self.device = None;
        self.port = None;
        self.frames.reset();
        self.state = ConnectionState::Disconnected;
        self.events.log("--- DISCONNECTED ---", LogCategory::Link);
        self.events.connection_state(ConnectionState::Disconnected);
        self.events.refresh_ports();
    }

    fn dispatch(&mut self, text: &str) {
        let line = Line::classify(text);
        tracing::debug!(kind = line.kind(), "{}", line.text());
        match line {
            Line::Telemetry(payload) => {
                let limit = self.config.actuator_limit();
                match decode_telemetry(payload, &limit) {
                    Some(snapshot) => self.events.telemetry(snapshot),
                    None => tracing::trace!("dropping malformed telemetry"),
                }
            }
            Line::Config(payload) => self.apply_config(payload),
            Line::SystemMessage(payload) => {
                self.events.log(payload, LogCategory::System);
                if payload.contains(BOOT_READY_MARKER) {
                    self.events.log(
                        "--- BOOT COMPLETE: AUTO-DUMPING CONFIG ---",
                        LogCategory::AutoDump,
                    );
                    self.send_command(&FcCommand::Dump);
                }
            }
            Line::Unformatted(payload) => self.events.log(payload, LogCategory::Unformatted),
        }
    }

    fn apply_config(&mut self, payload: &str) {
        let Some(update) = self.config.apply(payload) else {
            tracing::debug!("ignoring short config line {payload:?}");
            return;
        };

        self.events.log(payload, LogCategory::Config);
        let limit = update.limit;
        self.events
            .config_changed(update.key, update.value, self.config.snapshot());

        match limit {
            Some(LimitOutcome::Recomputed(limit)) => self.events.actuator_limit(limit),
            Some(LimitOutcome::Rejected(e)) => self.events.log(
                format!("Keeping previous servo limit: {e}"),
                LogCategory::Fault,
            ),
            None => {}
        }
    }
}

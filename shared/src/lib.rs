use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed mechanical center of every fin servo, in degrees.
pub const SERVO_CENTER_DEG: f64 = 90.0;

/// Servo travel used when the flight controller has not reported SERVO_LIMIT.
pub const DEFAULT_SERVO_LIMIT_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Kept for consumers that model a fault state. The link core never
    /// reports it: a read fault is a `Fault` log followed by `Disconnected`.
    Error,
}

/// Flight controller state machine, in firmware code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlightState {
    Diag,
    Preflight,
    NavLock,
    Burn,
    Coast,
    Recovery,
    Override,
}

impl FlightState {
    pub const ALL: [FlightState; 7] = [
        FlightState::Diag,
        FlightState::Preflight,
        FlightState::NavLock,
        FlightState::Burn,
        FlightState::Coast,
        FlightState::Recovery,
        FlightState::Override,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Short name the firmware uses for this state in commands and logs.
    pub fn wire_name(self) -> &'static str {
        match self {
            FlightState::Diag => "DIAG",
            FlightState::Preflight => "PREFLT",
            FlightState::NavLock => "NAVLK",
            FlightState::Burn => "BURN",
            FlightState::Coast => "COAST",
            FlightState::Recovery => "RECVY",
            FlightState::Override => "OVRD",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.wire_name() == name)
    }
}

/// The `state` field exactly as the flight controller reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportedState {
    Code(i64),
    Name(String),
}

impl Default for ReportedState {
    fn default() -> Self {
        ReportedState::Code(0)
    }
}

impl ReportedState {
    pub fn flight_state(&self) -> Option<FlightState> {
        match self {
            ReportedState::Code(code) => FlightState::from_code(*code),
            ReportedState::Name(name) => FlightState::from_wire_name(name),
        }
    }
}

impl fmt::Display for ReportedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.flight_state()) {
            (ReportedState::Code(code), Some(state)) => {
                write!(f, "{code} ({})", state.wire_name())
            }
            (ReportedState::Code(code), None) => write!(f, "{code}"),
            (ReportedState::Name(name), _) => f.write_str(name),
        }
    }
}

/// Servo display/validation bound derived from SERVO_LIMIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorLimit {
    pub min: i32,
    pub max: i32,
}

impl ActuatorLimit {
    /// Bound for a servo travel of `limit` degrees either side of center.
    /// Bounds truncate toward zero, matching how the firmware reports them.
    pub fn from_travel(limit: f64) -> Self {
        Self {
            min: (SERVO_CENTER_DEG - limit) as i32,
            max: (SERVO_CENTER_DEG + limit) as i32,
        }
    }

    /// Truncate a raw servo reading to whole degrees, then clamp it.
    pub fn clamp(&self, value: f64) -> i32 {
        (value as i32).clamp(self.min, self.max)
    }
}

impl Default for ActuatorLimit {
    fn default() -> Self {
        Self::from_travel(DEFAULT_SERVO_LIMIT_DEG)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Milliseconds since flight controller boot, as reported.
    pub timestamp: i64,
    pub state: ReportedState,
    pub altitude: f64,
    pub pressure: f64,
    pub quaternion: [f64; 4],
    pub gyro: [f64; 3],
    pub accel: [f64; 3],
    pub euler_angle: [f64; 3],
    pub gyro_bias: [f64; 3],
    /// Already clamped to the actuator limit in force at decode time.
    pub servo: [i32; 4],
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            timestamp: 0,
            state: ReportedState::default(),
            altitude: 0.0,
            pressure: 0.0,
            quaternion: [0.0; 4],
            gyro: [0.0; 3],
            accel: [0.0; 3],
            euler_angle: [0.0; 3],
            gyro_bias: [0.0; 3],
            servo: [SERVO_CENTER_DEG as i32; 4],
        }
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp : {} ms", self.timestamp)?;
        writeln!(f, "State     : {}", self.state)?;
        writeln!(f)?;
        writeln!(f, "Altitude  : {:.2} m", self.altitude)?;
        writeln!(f, "Pressure  : {:.2} hPa", self.pressure)?;
        writeln!(f)?;
        writeln!(f, "Quats     : {:?}", self.quaternion)?;
        writeln!(f, "Gyro (dps): {:?}", self.gyro)?;
        writeln!(f, "Accel (G) : {:?}", self.accel)?;
        write!(f, "Servos    : {:?}", self.servo)
    }
}

/// Category attached to every log line handed to the operator console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    /// Connect / disconnect notices.
    Link,
    /// Transport faults and rejected values.
    Fault,
    /// Echo of every command written to the link.
    Sent,
    /// `CFG:` readout lines.
    Config,
    /// `MSG:` lines from the flight controller.
    System,
    AutoDump,
    Unformatted,
}

/// Commands the ground station knows how to ask for by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FcCommand {
    /// Bare newline, wakes the command parser on the flight controller.
    Wake,
    Preflight,
    Override,
    Arm,
    Dump,
    Save,
    Default,
    MagicReset,
    Set { var: String, value: String },
}

impl FcCommand {
    pub fn wire_text(&self) -> String {
        match self {
            FcCommand::Wake => String::new(),
            FcCommand::Preflight => "PREFLT".to_string(),
            FcCommand::Override => "OVRD".to_string(),
            FcCommand::Arm => "ARM".to_string(),
            FcCommand::Dump => "DUMP".to_string(),
            FcCommand::Save => "SAVE".to_string(),
            FcCommand::Default => "DEFAULT".to_string(),
            FcCommand::MagicReset => "MAGICRESET".to_string(),
            FcCommand::Set { var, value } => format!("SET {var} {value}"),
        }
    }
}

/// Everything the link core reports to the outside world.
///
/// Serialized as `{ "ty": "...", "data": ... }` so a frontend can switch on
/// the tag without knowing every payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ty", content = "data", rename_all = "snake_case")]
pub enum LinkEvent {
    Telemetry(TelemetrySnapshot),
    ConfigChanged {
        key: String,
        value: String,
        snapshot: BTreeMap<String, String>,
    },
    ActuatorLimitChanged(ActuatorLimit),
    Log {
        text: String,
        category: LogCategory,
    },
    ConnectionState(ConnectionState),
    /// The device likely re-enumerated; candidate ports should be rescanned.
    RefreshPorts,
}

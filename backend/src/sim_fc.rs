use crate::serial_link::LinkDevice;
use racs_groundstation_shared::FlightState;
use rand::prelude::*;
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

/// Port name that selects the simulator instead of real hardware.
pub const SIM_PORT: &str = "sim";

const TELEMETRY_PERIOD: Duration = Duration::from_millis(50);

const DEFAULT_TUNABLES: &[(&str, &str)] = &[
    ("PITCH_KP", "1.000"),
    ("PITCH_KI", "0.000"),
    ("PITCH_KD", "0.050"),
    ("ROLL_KP", "1.000"),
    ("ROLL_KI", "0.000"),
    ("ROLL_KD", "0.050"),
    ("YAW_KP", "0.500"),
    ("YAW_KI", "0.000"),
    ("YAW_KD", "0.000"),
    ("PID_I_MAX", "10.000"),
    ("SERVO_CENTER_US", "1500.000"),
    ("SERVO_LIMIT", "30.000"),
    ("SERVO_US_PER_DEG", "10.000"),
    ("MOTOR_BURN_MS", "1600"),
    ("LOG_RATE_MS", "20"),
    ("SERVO_BURN_EN", "0"),
];

/// Bench stand-in for the flight controller, reachable as port `sim`.
///
/// Speaks the same line protocol: boot banner, `CFG:` dump, `MSG:` replies
/// and telemetry JSON while in PREFLT or OVRD.
pub struct SimulatedFc {
    outbox: VecDeque<u8>,
    inbox: Vec<u8>,
    tunables: Vec<(String, String)>,
    state: FlightState,
    booted_at: Instant,
    last_telemetry: Instant,
}

impl SimulatedFc {
    pub fn new() -> Self {
        let now = Instant::now();
        let mut fc = Self {
            outbox: VecDeque::new(),
            inbox: Vec::new(),
            tunables: default_tunables(),
            state: FlightState::Diag,
            booted_at: now,
            last_telemetry: now,
        };
        fc.boot();
        fc
    }

    fn boot(&mut self) {
        self.state = FlightState::Diag;
        self.booted_at = Instant::now();
        self.say("MSG: CONFIG LOADED FROM EEPROM");
        self.say("MSG: BAYES READY");
        self.state = FlightState::Preflight;
    }

    fn say(&mut self, line: &str) {
        self.outbox.extend(line.as_bytes());
        self.outbox.push_back(b'\n');
    }

    fn streams_telemetry(&self) -> bool {
        matches!(self.state, FlightState::Preflight | FlightState::Override)
    }

    fn in_flight_lockout(&self) -> bool {
        matches!(
            self.state,
            FlightState::NavLock | FlightState::Burn | FlightState::Coast | FlightState::Recovery
        )
    }

    fn handle_command(&mut self, line: &str) {
        if self.in_flight_lockout() {
            self.say("MSG: COMMAND IGNORED IN FLIGHT LOCKOUT");
            return;
        }

        let mut tokens = line.split_whitespace();
        let Some(cmd) = tokens.next() else {
            return;
        };

        match cmd {
            "ARM" => {
                self.state = FlightState::NavLock;
                self.say("MSG: GUIDANCE IS INTERNAL");
            }
            "OVRD" => {
                self.state = FlightState::Override;
                self.say("MSG: GROUND OVERRIDE MODE");
            }
            "PREFLT" => {
                self.state = FlightState::Preflight;
                self.say("MSG: REVERTED TO PREFLT");
            }
            "SET" => match (tokens.next(), tokens.next()) {
                (Some(var), Some(value)) => self.set_tunable(var, value),
                _ => self.say("MSG: SYNTAX ERROR. USE: SET <VAR> <VALUE>"),
            },
            "DUMP" => {
                let lines: Vec<String> = self
                    .tunables
                    .iter()
                    .map(|(k, v)| format!("CFG: {k} {v}"))
                    .collect();
                for line in lines {
                    self.say(&line);
                }
            }
            "SAVE" => self.say("MSG: CONFIG SAVED TO EEPROM"),
            "DEFAULT" => {
                self.tunables = default_tunables();
                self.say("MSG: EEPROM RESET TO DEFAULTS");
            }
            "MAGICRESET" => self.boot(),
            _ => self.say("MSG: UNKNOWN COMMAND"),
        }
    }

    fn set_tunable(&mut self, var: &str, value: &str) {
        let Some(slot) = self.tunables.iter_mut().find(|(k, _)| k == var) else {
            self.say("MSG: UNKNOWN TUNEABLE VARIABLE");
            return;
        };
        // atof semantics: garbage reads as zero
        let parsed: f64 = value.parse().unwrap_or(0.0);
        slot.1 = format!("{parsed:.3}");
        let reply = format!("MSG: {var} = {parsed:.3}");
        self.say(&reply);
    }

    fn telemetry_line(&self) -> String {
        let mut rng = rand::rng();
        let timestamp = self.booted_at.elapsed().as_millis();
        let altitude: f64 = rng.random_range(0.0..500.0);
        let pressure = 1013.25 - altitude * 0.12;
        let accel: [f64; 3] = std::array::from_fn(|_| rng.random_range(-0.2..0.2));
        let gyro: [f64; 3] = std::array::from_fn(|_| rng.random_range(-5.0..5.0));
        // deliberately wider than the default limit so clamping is visible
        let servo: [f64; 4] = std::array::from_fn(|_| rng.random_range(50.0..130.0));
        format!(
            concat!(
                "{{\"timestamp\":{},\"state\":{},",
                "\"raw_accel\":[{:.3},{:.3},{:.3}],",
                "\"raw_gyro\":[{:.3},{:.3},{:.3}],",
                "\"pressure\":{:.3},\"altitude\":{:.3},",
                "\"quats\":[1.000,0.000,0.000,0.000],",
                "\"euler_angle\":[0.000,0.000,0.000],",
                "\"servo\":[{:.1},{:.1},{:.1},{:.1}],",
                "\"gyro_bias\":[0.000,0.000,0.000]}}"
            ),
            timestamp,
            self.state as u8,
            accel[0],
            accel[1],
            1.0 + accel[2],
            gyro[0],
            gyro[1],
            gyro[2],
            pressure,
            altitude,
            servo[0],
            servo[1],
            servo[2],
            servo[3],
        )
    }
}

impl Default for SimulatedFc {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tunables() -> Vec<(String, String)> {
    DEFAULT_TUNABLES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl LinkDevice for SimulatedFc {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.streams_telemetry() && self.last_telemetry.elapsed() >= TELEMETRY_PERIOD {
            self.last_telemetry = Instant::now();
            let line = self.telemetry_line();
            self.say(&line);
        }

        let n = buf.len().min(self.outbox.len());
        for (dst, src) in buf.iter_mut().zip(self.outbox.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inbox.extend_from_slice(bytes);
        while let Some(pos) = self.inbox.iter().position(|&b| b == b'\n' || b == b'\r') {
            let raw: Vec<u8> = self.inbox.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..pos]).trim().to_string();
            if !line.is_empty() {
                self.handle_command(&line);
            }
        }
        Ok(())
    }
}

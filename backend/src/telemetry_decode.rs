use racs_groundstation_shared::{ActuatorLimit, ReportedState, SERVO_CENTER_DEG, TelemetrySnapshot};
use serde::Deserialize;
use serde_json::Number;

/// Telemetry object as the flight controller serializes it. Missing keys fall
/// back to the neutral defaults below.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawTelemetry {
    timestamp: Option<Number>,
    state: ReportedState,
    altitude: f64,
    pressure: f64,
    quats: [f64; 4],
    raw_gyro: [f64; 3],
    raw_accel: [f64; 3],
    euler_angle: [f64; 3],
    gyro_bias: [f64; 3],
    servo: Vec<f64>,
}

impl Default for RawTelemetry {
    fn default() -> Self {
        Self {
            timestamp: None,
            state: ReportedState::default(),
            altitude: 0.0,
            pressure: 0.0,
            quats: [0.0; 4],
            raw_gyro: [0.0; 3],
            raw_accel: [0.0; 3],
            euler_angle: [0.0; 3],
            gyro_bias: [0.0; 3],
            servo: vec![SERVO_CENTER_DEG; 4],
        }
    }
}

/// Decode one `{...}` line into a snapshot with servos clamped to `limit`.
///
/// Returns `None` for anything that is not a well-formed telemetry object;
/// corrupted lines are routine on a USB serial link and are dropped quietly.
pub fn decode_telemetry(line: &str, limit: &ActuatorLimit) -> Option<TelemetrySnapshot> {
    let raw: RawTelemetry = serde_json::from_str(line).ok()?;

    if raw.servo.len() < 4 {
        return None;
    }
    let servo: [i32; 4] = std::array::from_fn(|i| limit.clamp(raw.servo[i]));

    Some(TelemetrySnapshot {
        timestamp: raw.timestamp.as_ref().map_or(0, timestamp_ms),
        state: raw.state,
        altitude: raw.altitude,
        pressure: raw.pressure,
        quaternion: raw.quats,
        gyro: raw.raw_gyro,
        accel: raw.raw_accel,
        euler_angle: raw.euler_angle,
        gyro_bias: raw.gyro_bias,
        servo,
    })
}

/// Display-only field: any JSON number is accepted, fractions truncate.
fn timestamp_ms(n: &Number) -> i64 {
    n.as_i64().unwrap_or_else(|| n.as_f64().map_or(0, |ms| ms as i64))
}

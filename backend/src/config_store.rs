use racs_groundstation_shared::{ActuatorLimit, DEFAULT_SERVO_LIMIT_DEG};
use std::collections::BTreeMap;
use thiserror::Error;

pub const SERVO_LIMIT_KEY: &str = "SERVO_LIMIT";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitError {
    #[error("SERVO_LIMIT {0:?} is not a number")]
    NotANumber(String),
    #[error("SERVO_LIMIT {0} is not finite")]
    NotFinite(f64),
    #[error("SERVO_LIMIT {0} is negative")]
    Negative(f64),
}

/// Servo travel in degrees either side of center, as announced by the FC.
pub fn parse_servo_limit(value: &str) -> Result<f64, LimitError> {
    let travel: f64 = value
        .trim()
        .parse()
        .map_err(|_| LimitError::NotANumber(value.to_string()))?;
    if !travel.is_finite() {
        return Err(LimitError::NotFinite(travel));
    }
    if travel < 0.0 {
        return Err(LimitError::Negative(travel));
    }
    Ok(travel)
}

#[derive(Debug, Clone, PartialEq)]
pub enum LimitOutcome {
    Recomputed(ActuatorLimit),
    /// Bad value; the previous limit is still in force.
    Rejected(LimitError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    pub key: String,
    pub value: String,
    /// Set only when the update touched SERVO_LIMIT.
    pub limit: Option<LimitOutcome>,
}

/// Mirror of the flight controller's tunables, built from `CFG:` readout.
///
/// Nothing is ever removed: a DEFAULT or MAGICRESET on the device only shows
/// up here once the next dump overwrites the old values.
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: BTreeMap<String, String>,
    limit: Option<ActuatorLimit>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one `CFG: <KEY> <VALUE>` line. Lines with fewer than three
    /// space-separated tokens are ignored; tokens past the value are dropped.
    pub fn apply(&mut self, line: &str) -> Option<ConfigUpdate> {
        let mut parts = line.split(' ');
        let _prefix = parts.next()?;
        let key = parts.next()?;
        let value = parts.next()?;

        self.entries.insert(key.to_string(), value.to_string());

        let limit = (key == SERVO_LIMIT_KEY).then(|| self.recompute_limit(value));

        Some(ConfigUpdate {
            key: key.to_string(),
            value: value.to_string(),
            limit,
        })
    }

    fn recompute_limit(&mut self, value: &str) -> LimitOutcome {
        match parse_servo_limit(value) {
            Ok(travel) => {
                let limit = ActuatorLimit::from_travel(travel);
                self.limit = Some(limit);
                LimitOutcome::Recomputed(limit)
            }
            Err(e) => LimitOutcome::Rejected(e),
        }
    }

    /// Limit in force for the next telemetry decode. Computed from the store
    /// (or the default travel) the first time it is needed.
    pub fn actuator_limit(&mut self) -> ActuatorLimit {
        if let Some(limit) = self.limit {
            return limit;
        }
        let travel = self
            .entries
            .get(SERVO_LIMIT_KEY)
            .and_then(|v| parse_servo_limit(v).ok())
            .unwrap_or(DEFAULT_SERVO_LIMIT_DEG);
        let limit = ActuatorLimit::from_travel(travel);
        self.limit = Some(limit);
        limit
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_key_and_value_last_write_wins() {
        let mut store = ConfigStore::new();
        store.apply("CFG: PITCH_KP 1.200").unwrap();
        let update = store.apply("CFG: PITCH_KP 0.800").unwrap();
        assert_eq!(update.key, "PITCH_KP");
        assert_eq!(update.value, "0.800");
        assert_eq!(update.limit, None);
        assert_eq!(store.get("PITCH_KP"), Some("0.800"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn short_lines_do_not_touch_the_store() {
        let mut store = ConfigStore::new();
        for line in ["CFG:", "CFG: SERVO_LIMIT", "CFG:SERVO_LIMIT 45"] {
            assert!(store.apply(line).is_none(), "{line}");
        }
        assert!(store.is_empty());
        assert_eq!(store.actuator_limit(), ActuatorLimit { min: 60, max: 120 });
    }

    #[test]
    fn extra_tokens_are_dropped() {
        let mut store = ConfigStore::new();
        store.apply("CFG: LOG_RATE_MS 20 ms extra").unwrap();
        assert_eq!(store.get("LOG_RATE_MS"), Some("20"));
    }

    #[test]
    fn servo_limit_recomputes_bound() {
        let mut store = ConfigStore::new();
        let update = store.apply("CFG: SERVO_LIMIT 45").unwrap();
        let expected = ActuatorLimit { min: 45, max: 135 };
        assert_eq!(update.limit, Some(LimitOutcome::Recomputed(expected)));
        assert_eq!(store.actuator_limit(), expected);
    }

    #[test]
    fn limit_tracks_travel_across_range() {
        for travel in 0..=90 {
            let mut store = ConfigStore::new();
            store.apply(&format!("CFG: SERVO_LIMIT {travel}.000")).unwrap();
            let limit = store.actuator_limit();
            assert_eq!(limit, ActuatorLimit { min: 90 - travel, max: 90 + travel });
            assert!(limit.min <= 90 && 90 <= limit.max);
        }
    }

    #[test]
    fn bad_servo_limit_keeps_previous_bound() {
        let mut store = ConfigStore::new();
        store.apply("CFG: SERVO_LIMIT 45").unwrap();
        for bad in ["abc", "-5", "inf", "NaN"] {
            let update = store.apply(&format!("CFG: SERVO_LIMIT {bad}")).unwrap();
            assert!(matches!(update.limit, Some(LimitOutcome::Rejected(_))), "{bad}");
            assert_eq!(store.actuator_limit(), ActuatorLimit { min: 45, max: 135 });
        }
        // the raw value is still mirrored for display
        assert_eq!(store.get("SERVO_LIMIT"), Some("NaN"));
    }

    #[test]
    fn bad_first_servo_limit_falls_back_to_default() {
        let mut store = ConfigStore::new();
        store.apply("CFG: SERVO_LIMIT wide").unwrap();
        assert_eq!(store.actuator_limit(), ActuatorLimit::default());
    }

    #[test]
    fn snapshot_is_ordered_by_key() {
        let mut store = ConfigStore::new();
        store.apply("CFG: YAW_KP 1").unwrap();
        store.apply("CFG: PITCH_KP 2").unwrap();
        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["PITCH_KP", "YAW_KP"]);
    }
}

use std::time::Duration;

/// Flight controller USB CDC link speed.
pub const LINK_BAUDRATE: u32 = 115_200;
pub const POLL_INTERVAL_MS: u64 = 20;
pub const READ_CHUNK_SIZE: usize = 1024;
pub const EVENT_CHANNEL_CAPACITY: usize = 512;
pub const CONTROL_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub poll_interval: Duration,
    pub read_chunk_size: usize,
    pub event_capacity: usize,
    pub control_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: LINK_BAUDRATE,
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            read_chunk_size: READ_CHUNK_SIZE,
            event_capacity: EVENT_CHANNEL_CAPACITY,
            control_capacity: CONTROL_CHANNEL_CAPACITY,
        }
    }
}

impl LinkConfig {
    /// Defaults with `RACS_BAUD` / `RACS_POLL_MS` overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("RACS_BAUD") {
            match raw.trim().parse::<u32>() {
                Ok(baud) if baud > 0 => cfg.baud_rate = baud,
                _ => tracing::warn!("ignoring invalid RACS_BAUD={raw:?}"),
            }
        }

        if let Some(raw) = lookup("RACS_POLL_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => cfg.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!("ignoring invalid RACS_POLL_MS={raw:?}"),
            }
        }

        cfg
    }
}

/// Port the operator asked for, from argv first and then `RACS_PORT`.
pub fn requested_port() -> Option<String> {
    std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .or_else(|| std::env::var("RACS_PORT").ok())
        .filter(|p| !p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_flight_controller_link() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.poll_interval, Duration::from_millis(20));
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = LinkConfig::from_lookup(lookup(&[("RACS_BAUD", "57600"), ("RACS_POLL_MS", "5")]));
        assert_eq!(cfg.baud_rate, 57_600);
        assert_eq!(cfg.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn bad_env_values_keep_defaults() {
        let cfg = LinkConfig::from_lookup(lookup(&[("RACS_BAUD", "fast"), ("RACS_POLL_MS", "0")]));
        assert_eq!(cfg, LinkConfig::default());
    }
}

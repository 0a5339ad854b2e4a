use racs_groundstation_shared::{
    ActuatorLimit, ConnectionState, LinkEvent, LogCategory, TelemetrySnapshot,
};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// Fan-out of everything the link core reports.
///
/// Sends never block and never fail the caller: with no subscribers the
/// event is simply dropped, and slow subscribers see `Lagged`.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<LinkEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: LinkEvent) {
        let _ = self.tx.send(event);
    }

    pub fn telemetry(&self, snapshot: TelemetrySnapshot) {
        self.send(LinkEvent::Telemetry(snapshot));
    }

    pub fn config_changed(&self, key: String, value: String, snapshot: BTreeMap<String, String>) {
        self.send(LinkEvent::ConfigChanged { key, value, snapshot });
    }

    pub fn actuator_limit(&self, limit: ActuatorLimit) {
        tracing::info!("servo limit now {}..={} deg", limit.min, limit.max);
        self.send(LinkEvent::ActuatorLimitChanged(limit));
    }

    pub fn log<S: Into<String>>(&self, text: S, category: LogCategory) {
        let text = text.into();
        match category {
            LogCategory::Fault => tracing::warn!("{text}"),
            LogCategory::Link | LogCategory::AutoDump => tracing::info!("{text}"),
            _ => tracing::debug!(?category, "{text}"),
        }
        self.send(LinkEvent::Log { text, category });
    }

    pub fn connection_state(&self, state: ConnectionState) {
        self.send(LinkEvent::ConnectionState(state));
    }

    pub fn refresh_ports(&self) {
        self.send(LinkEvent::RefreshPorts);
    }
}

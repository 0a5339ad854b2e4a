use crate::config::LinkConfig;
use crate::events::EventSink;
use crate::link_manager::ConnectionManager;
use racs_groundstation_shared::FcCommand;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Requests from the operator side, applied in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkControl {
    Connect(String),
    Disconnect,
    Send(String),
    SendManual(String),
    Command(FcCommand),
}

/// Cheap, cloneable front door to a running [`link_task`].
#[derive(Debug, Clone)]
pub struct LinkHandle {
    control_tx: mpsc::Sender<LinkControl>,
    events: EventSink,
}

impl LinkHandle {
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    pub async fn control(&self, msg: LinkControl) -> anyhow::Result<()> {
        self.control_tx
            .send(msg)
            .await
            .map_err(|_| anyhow::anyhow!("link task is not running"))
    }

    pub async fn connect<S: Into<String>>(&self, port: S) -> anyhow::Result<()> {
        self.control(LinkControl::Connect(port.into())).await
    }

    pub async fn disconnect(&self) -> anyhow::Result<()> {
        self.control(LinkControl::Disconnect).await
    }

    pub async fn send_manual<S: Into<String>>(&self, input: S) -> anyhow::Result<()> {
        self.control(LinkControl::SendManual(input.into())).await
    }

    pub async fn command(&self, command: FcCommand) -> anyhow::Result<()> {
        self.control(LinkControl::Command(command)).await
    }
}

/// Start the link task on the current runtime.
pub fn spawn_link(
    manager: ConnectionManager,
    cfg: &LinkConfig,
    shutdown_rx: broadcast::Receiver<()>,
) -> (LinkHandle, JoinHandle<()>) {
    let (control_tx, control_rx) = mpsc::channel(cfg.control_capacity);
    let handle = LinkHandle {
        control_tx,
        events: manager.events().clone(),
    };
    let task = tokio::spawn(link_task(manager, cfg.poll_interval, control_rx, shutdown_rx));
    (handle, task)
}

/// Single owner of the connection manager: polls on a fixed cadence and
/// applies control requests between polls, so a close can never overlap a
/// read in progress.
pub async fn link_task(
    mut manager: ConnectionManager,
    poll_every: Duration,
    mut rx: mpsc::Receiver<LinkControl>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut poll_interval = interval(poll_every);
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                if manager.is_connected() {
                    manager.poll();
                }
            }
            msg = rx.recv() => {
                match msg {
                    Some(msg) => apply_control(&mut manager, msg),
                    None => break,
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    manager.close();
    tracing::debug!("link task stopped");
}

fn apply_control(manager: &mut ConnectionManager, msg: LinkControl) {
    match msg {
        LinkControl::Connect(port) => manager.open(&port),
        LinkControl::Disconnect => manager.close(),
        LinkControl::Send(command) => manager.send(&command),
        LinkControl::SendManual(input) => {
            if let Err(e) = manager.send_manual(&input) {
                tracing::debug!("rejected manual command: {e}");
            }
        }
        LinkControl::Command(command) => manager.send_command(&command),
    }
}

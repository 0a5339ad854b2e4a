// main.rs

use anyhow::Context;
use racs_groundstation_shared::{FcCommand, LinkEvent};
use racs_link::config::{requested_port, LinkConfig};
use racs_link::ports::{list_ports, pick_flight_controller};
use racs_link::serial_link::SerialOpener;
use racs_link::{spawn_link, ConnectionManager, EventSink, LinkHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let json = std::env::args().skip(1).any(|a| a == "--json");
    let cfg = LinkConfig::from_env();

    // --- Port selection ---
    let port = match requested_port() {
        Some(port) => port,
        None => pick_flight_controller(&list_ports()?).context("no flight controller port found")?,
    };
    tracing::info!(port = %port, baud = cfg.baud_rate, "starting link");

    // --- Link task ---
    let events = EventSink::new(cfg.event_capacity);
    let printer_rx = events.subscribe();
    let manager = ConnectionManager::new(Box::new(SerialOpener), &cfg, events);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, link) = spawn_link(manager, &cfg, shutdown_rx);

    let printer = tokio::spawn(print_events(printer_rx, json));

    handle.connect(port).await?;

    // --- Operator console ---
    tokio::select! {
        res = operator_console(&handle) => res?,
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    let _ = shutdown_tx.send(());
    link.await.context("link task panicked")?;
    drop(handle);
    printer.await.context("event printer panicked")?;
    Ok(())
}

/// Lines typed on stdin go to the flight controller; a few `/` commands
/// drive the link itself.
async fn operator_console(handle: &LinkHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/wake", _) => handle.command(FcCommand::Wake).await?,
            ("/disconnect", _) => handle.disconnect().await?,
            ("/connect", port) if !port.trim().is_empty() => handle.connect(port.trim()).await?,
            ("/connect", _) => eprintln!("usage: /connect <port>"),
            ("/quit", _) => break,
            _ => handle.send_manual(line).await?,
        }
    }
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<LinkEvent>, json: bool) {
    loop {
        match rx.recv().await {
            Ok(ev) => {
                if json {
                    match serde_json::to_string(&ev) {
                        Ok(text) => println!("{text}"),
                        Err(e) => tracing::warn!("failed to serialize event: {e}"),
                    }
                    continue;
                }
                match ev {
                    LinkEvent::Telemetry(snap) => println!("{snap}\n"),
                    LinkEvent::Log { text, .. } => println!("{text}"),
                    LinkEvent::ActuatorLimitChanged(limit) => {
                        println!("Servo limit: {}..={}", limit.min, limit.max)
                    }
                    LinkEvent::ConnectionState(state) => {
                        tracing::debug!(?state, "connection state")
                    }
                    LinkEvent::ConfigChanged { .. } => {}
                    LinkEvent::RefreshPorts => match list_ports() {
                        Ok(ports) => match pick_flight_controller(&ports) {
                            Some(port) => println!("Flight controller candidate: {port}"),
                            None => println!("No flight controller port found"),
                        },
                        Err(e) => tracing::warn!("{e:#}"),
                    },
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("event printer lagged, skipped {n} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

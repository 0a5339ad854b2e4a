//! Ground-side serial link to the RACS flight controller.
//!
//! Bytes come in through a [`serial_link::LinkDevice`], get split into lines
//! by [`frame_buffer::FrameBuffer`], classified, and turned into
//! [`racs_groundstation_shared::LinkEvent`]s by the
//! [`link_manager::ConnectionManager`].

pub mod classifier;
pub mod commands;
pub mod config;
pub mod config_store;
pub mod events;
pub mod frame_buffer;
pub mod link_manager;
pub mod link_task;
pub mod ports;
pub mod serial_link;
pub mod telemetry_decode;

#[cfg(feature = "testing")]
pub mod sim_fc;

#[cfg(test)]
mod scripted_link;

pub use events::EventSink;
pub use link_manager::ConnectionManager;
pub use link_task::{spawn_link, LinkControl, LinkHandle};

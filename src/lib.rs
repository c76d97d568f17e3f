//! # wiz_pilot
//!
//! Talk to WiZ bulbs over their local UDP "pilot" protocol.
//!
//! The crate covers the device communication core that a smart-home bridge
//! sits on top of:
//!
//! - **Discovery**: probe a list of `{ip, mac}` candidates concurrently and
//!   get back the ones that answered, classified as white, RGB or switch.
//!   See [`discover`]. [`scan_candidates`] can produce the list by
//!   broadcast when none is at hand.
//! - **Per-device traffic**: a [`Light`] coalesces concurrent state queries
//!   into a single `getPilot` exchange and sends every `setPilot` on its own.
//! - **Temperature mapping**: [`kelvin_to_mired`] and [`mired_to_kelvin`]
//!   convert between the bulb's Kelvin and the 140-500 UI scale.
//!
//! ## Quick Start
//!
//! ```ignore
//! use wiz_pilot::{Candidate, Kelvin, PilotConfig, discover};
//!
//! async fn warm_everything(candidates: &[Candidate]) -> Result<(), wiz_pilot::Error> {
//!     let config = PilotConfig::default();
//!     for device in discover(candidates, &config).await? {
//!         let light = device.into_light(config.clone());
//!         light.set_temperature(&Kelvin::create(2700).unwrap()).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Absence
//!
//! Bulbs drop packets, sleep, and sometimes answer with noise. None of that
//! is an error here: an exchange that gets no usable reply inside its
//! timeout resolves to `Ok(None)`. `Err` is reserved for socket failures,
//! and during discovery only a failure to bind a local socket is fatal.
//!
//! ## Communication
//!
//! One JSON request per datagram to port 38899, at most one reply, a fresh
//! ephemeral socket per exchange, and no retries.
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod client;
mod config;
mod device;
mod discovery;
mod errors;
mod history;
mod light;
mod params;
mod protocol;
pub mod runtime;
mod temperature;
mod types;

#[cfg(test)]
mod testing;

pub use client::PilotClient;
pub use config::PilotConfig;
pub use device::{DeviceClass, DeviceDescriptor};
pub use discovery::{Candidate, discover, discover_with_timeout, scan_candidates};
pub use errors::Error;
pub use history::{HistoryEntry, HistorySummary, MessageHistory, Outcome};
pub use light::Light;
pub use params::PilotParams;
pub use protocol::{Ack, PilotMethod, PilotReply, PilotState};
pub use temperature::{
    KELVIN_MAX, KELVIN_MIN, MIRED_MAX, MIRED_MIN, kelvin_to_mired, mired_to_kelvin,
};
pub use types::{Brightness, Kelvin, Mired};

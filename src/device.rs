//! Device identity, classification and state snapshots.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::config::PilotConfig;
use crate::light::Light;
use crate::protocol::PilotState;
use crate::types::{Kelvin, Mired};

/// Device category, inferred from which fields a `getPilot` reply carries.
///
/// The bulb never declares this. A bulb that is off or running a scene may
/// omit fields and land in the wrong class; accessory layers built on top
/// depend on exactly this rule, so it is not second-guessed here.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
pub enum DeviceClass {
    WhiteLight,
    RgbLight,
    Switch,
}

impl DeviceClass {
    /// No `dimming`: switch. `dimming` and `temp`: white. `dimming` only: RGB.
    pub fn classify(state: &PilotState) -> Self {
        match (state.dimming, state.temp) {
            (None, _) => DeviceClass::Switch,
            (Some(_), Some(_)) => DeviceClass::WhiteLight,
            (Some(_), None) => DeviceClass::RgbLight,
        }
    }
}

/// One bulb as seen by a single `getPilot` exchange.
///
/// Snapshots are rebuilt from every reply and never updated in place. Any
/// notion of "current" state belongs to whoever holds them.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub ip: Ipv4Addr,
    /// Stable identity. The IP may change between scans.
    pub mac: String,
    pub device_class: DeviceClass,
    pub is_on: bool,
    /// Device-native dimming; 0 when the reply had none.
    pub brightness: u8,
    pub color_temperature_kelvin: Option<u16>,
    pub rssi: Option<i32>,
    pub scene_id: Option<u16>,
    pub source: Option<String>,
}

impl DeviceDescriptor {
    pub fn from_state(ip: Ipv4Addr, mac: &str, state: &PilotState) -> Self {
        let device_class = DeviceClass::classify(state);
        let color_temperature_kelvin = match device_class {
            DeviceClass::Switch => None,
            DeviceClass::WhiteLight | DeviceClass::RgbLight => state.temp,
        };

        DeviceDescriptor {
            ip,
            mac: mac.to_string(),
            device_class,
            is_on: state.state,
            brightness: state.dimming.unwrap_or(0),
            color_temperature_kelvin,
            rssi: state.rssi,
            scene_id: state.scene_id,
            source: state.src.clone(),
        }
    }

    /// The reported temperature on the UI scale, if it is in range.
    pub fn mired(&self) -> Option<Mired> {
        self.color_temperature_kelvin
            .and_then(Kelvin::create)
            .map(Kelvin::to_mired)
    }

    /// As [`mired`](Self::mired), falling back to the cool end of the scale
    /// when the bulb gave no usable temperature.
    ///
    /// Readings outside 2700-6500K are clamped first rather than dropped.
    pub fn mired_or_default(&self) -> Mired {
        match self.color_temperature_kelvin {
            Some(kelvin) => Kelvin::clamped(kelvin).to_mired(),
            None => Mired { value: Mired::MIN },
        }
    }

    pub fn into_light(self, config: PilotConfig) -> Light {
        Light::new(self.ip, &self.mac, config)
    }
}

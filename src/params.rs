//! `setPilot` parameters.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Brightness, Kelvin};

/// Parameters for one `setPilot` command.
///
/// Power, dimming and temperature are typed. Anything else the bulb
/// understands (RGB channels, scene ids, speed) can be passed through with
/// [`PilotParams::raw`]; this crate does not interpret it.
///
/// ```
/// use wiz_pilot::{Brightness, Kelvin, PilotParams};
///
/// let mut params = PilotParams::new();
/// params
///     .state(true)
///     .brightness(&Brightness::create(80).unwrap())
///     .temp(&Kelvin::create(3000).unwrap());
///
/// let json = serde_json::to_value(&params).unwrap();
/// assert_eq!(json, serde_json::json!({"state": true, "dimming": 80, "temp": 3000}));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PilotParams {
    pub(crate) state: Option<bool>,
    pub(crate) dimming: Option<u8>,
    pub(crate) temp: Option<u16>,
    #[serde(flatten)]
    pub(crate) raw: Map<String, Value>,
}

impl PilotParams {
    const TYPED_KEYS: [&'static str; 3] = ["state", "dimming", "temp"];

    pub fn new() -> Self {
        Self::default()
    }

    /// A command with nothing set is rejected before it hits the network.
    ///
    /// ```
    /// use wiz_pilot::PilotParams;
    ///
    /// assert!(!PilotParams::new().is_valid());
    /// assert!(PilotParams::from(false).is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        self.state.is_some() || self.dimming.is_some() || self.temp.is_some() || !self.raw.is_empty()
    }

    pub fn state(&mut self, on: bool) -> &mut Self {
        self.state = Some(on);
        self
    }

    pub fn brightness(&mut self, brightness: &Brightness) -> &mut Self {
        self.dimming = Some(brightness.value);
        self
    }

    pub fn temp(&mut self, temp: &Kelvin) -> &mut Self {
        self.temp = Some(temp.kelvin);
        self
    }

    /// Pass an untyped parameter through verbatim.
    ///
    /// Keys that have a typed setter are ignored here.
    ///
    /// ```
    /// use wiz_pilot::PilotParams;
    ///
    /// let mut params = PilotParams::new();
    /// params.raw("sceneId", 4).raw("dimming", 5);
    ///
    /// let json = serde_json::to_value(&params).unwrap();
    /// assert_eq!(json, serde_json::json!({"sceneId": 4}));
    /// ```
    pub fn raw(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if Self::TYPED_KEYS.contains(&key) {
            warn!("ignoring raw pilot param {key:?}; use the typed setter");
            return self;
        }
        self.raw.insert(key.to_string(), value.into());
        self
    }

    pub fn get_state(&self) -> Option<bool> {
        self.state
    }

    pub fn get_dimming(&self) -> Option<u8> {
        self.dimming
    }

    pub fn get_temp(&self) -> Option<u16> {
        self.temp
    }
}

impl From<bool> for PilotParams {
    fn from(on: bool) -> Self {
        let mut p = PilotParams::new();
        p.state(on);
        p
    }
}

impl From<&Brightness> for PilotParams {
    fn from(brightness: &Brightness) -> Self {
        let mut p = PilotParams::new();
        p.brightness(brightness);
        p
    }
}

impl From<&Kelvin> for PilotParams {
    fn from(kelvin: &Kelvin) -> Self {
        let mut p = PilotParams::new();
        p.temp(kelvin);
        p
    }
}

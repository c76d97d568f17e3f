//! Network tunables for the pilot protocol.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Ports, timeouts and buffer sizes shared by every exchange.
///
/// Deserializable so that a host application can embed it in its own
/// settings file; missing keys fall back to the defaults.
///
/// ```
/// use wiz_pilot::PilotConfig;
///
/// let config: PilotConfig = serde_json::from_str(r#"{"discovery_timeout_ms": 800}"#).unwrap();
/// assert_eq!(config.port, 38899);
/// assert_eq!(config.discovery_timeout.as_millis(), 800);
/// ```
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// UDP port the bulbs listen on.
    pub port: u16,
    /// Reply window for steady-state getPilot/setPilot traffic.
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(rename = "request_timeout_ms")]
    pub request_timeout: Duration,
    /// Reply window for each candidate during discovery.
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(rename = "discovery_timeout_ms")]
    pub discovery_timeout: Duration,
    /// Receive buffer; replies longer than this are truncated and then
    /// fail to parse.
    pub max_datagram: usize,
}

impl PilotConfig {
    pub const PORT: u16 = 38899;
    const REQUEST_TIMEOUT_MS: u64 = 1000;
    const DISCOVERY_TIMEOUT_MS: u64 = 2000;
    const MAX_DATAGRAM: usize = 4096;

    pub fn validate(&self) -> Result<(), Error> {
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfig("request_timeout_ms must be > 0".into()));
        }
        if self.discovery_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "discovery_timeout_ms must be > 0".into(),
            ));
        }
        if self.max_datagram == 0 {
            return Err(Error::InvalidConfig("max_datagram must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for PilotConfig {
    fn default() -> Self {
        PilotConfig {
            port: Self::PORT,
            request_timeout: Duration::from_millis(Self::REQUEST_TIMEOUT_MS),
            discovery_timeout: Duration::from_millis(Self::DISCOVERY_TIMEOUT_MS),
            max_datagram: Self::MAX_DATAGRAM,
        }
    }
}

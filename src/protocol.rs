//! Wire shapes of the pilot protocol.
//!
//! One JSON object per datagram, no framing and no sequence numbers: a
//! reply is matched to its request only by arriving on the request's
//! socket and echoing the request's `method`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::params::PilotParams;

/// Methods this crate issues.
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
    strum_macros::AsRefStr,
    strum_macros::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PilotMethod {
    GetPilot,
    SetPilot,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
pub(crate) struct PilotRequest<'a> {
    pub method: PilotMethod,
    pub params: Option<&'a PilotParams>,
}

impl<'a> PilotRequest<'a> {
    pub fn new(method: PilotMethod, params: Option<&'a PilotParams>) -> Self {
        PilotRequest { method, params }
    }
}

/// Reply envelope, before the `result` is interpreted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PilotReply {
    pub method: String,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub result: Value,
    /// Set instead of `result` when the bulb refuses a request.
    #[serde(default)]
    pub error: Option<Value>,
}

impl PilotReply {
    /// Parse one datagram and check it answers `method`.
    ///
    /// Garbage and replies to some other method both come back as `None`.
    pub fn parse(bytes: &[u8], method: PilotMethod) -> Option<Self> {
        let reply: PilotReply = serde_json::from_slice(bytes).ok()?;
        (reply.method == method.as_ref()).then_some(reply)
    }

    pub fn state(&self) -> Option<PilotState> {
        serde_json::from_value(self.result.clone()).ok()
    }

    pub fn ack(&self) -> Ack {
        if self.error.is_some() {
            return Ack { success: false };
        }
        serde_json::from_value(self.result.clone()).unwrap_or(Ack { success: false })
    }
}

/// The `result` of a `getPilot` reply.
///
/// Whether `dimming` and `temp` are present is significant: it is how the
/// device class is inferred. A numeric field the bulb sends as something
/// other than an integer (or an integer in a string) reads as absent
/// rather than spoiling the whole reply.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PilotState {
    pub mac: String,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub src: Option<String>,
    pub state: bool,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub scene_id: Option<u16>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub temp: Option<u16>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub dimming: Option<u8>,
    /// Fields this crate does not model (r, g, b, c, w, speed, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `result` of a `setPilot` reply.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
}

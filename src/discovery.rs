//! Finding live bulbs among candidate addresses.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::PilotClient;
use crate::config::PilotConfig;
use crate::device::DeviceDescriptor;
use crate::errors::Error;
use crate::runtime::{self, AsyncUdpSocket, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// An address that might be a bulb, typically from an ARP table or a
/// static list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub ip: Ipv4Addr,
    pub mac: String,
}

impl Candidate {
    pub fn new(ip: Ipv4Addr, mac: &str) -> Self {
        Candidate {
            ip,
            mac: mac.to_string(),
        }
    }
}

/// Probe every candidate with `getPilot` using `config.discovery_timeout`.
///
/// See [`discover_with_timeout`].
pub async fn discover(candidates: &[Candidate], config: &PilotConfig) -> Result<Vec<DeviceDescriptor>> {
    discover_with_timeout(candidates, config.discovery_timeout, config).await
}

/// Probe every candidate with `getPilot` concurrently and keep the ones
/// that answered.
///
/// All probes run at once, so the scan takes about `timeout` however many
/// candidates are silent. Results follow the order of `candidates`. A
/// candidate that times out, answers with garbage or is unreachable is
/// left out and logged. Only a failure to bind a local socket aborts the
/// scan.
///
/// The descriptor keeps the candidate's MAC as identity.
///
/// ```ignore
/// use wiz_pilot::{Candidate, PilotConfig, discover};
///
/// let candidates = vec![Candidate::new("192.168.1.40".parse()?, "a8bb50aabbcc")];
/// for device in discover(&candidates, &PilotConfig::default()).await? {
///     println!("{} {} {}", device.mac, device.ip, device.device_class);
/// }
/// ```
pub async fn discover_with_timeout(
    candidates: &[Candidate],
    timeout: Duration,
    config: &PilotConfig,
) -> Result<Vec<DeviceDescriptor>> {
    let client = PilotClient::new(config.clone());

    let probes = candidates.iter().map(|candidate| {
        let client = &client;
        async move { (candidate, client.get_pilot(candidate.ip, timeout).await) }
    });
    let answers = futures::future::join_all(probes).await;

    let mut found = Vec::new();
    for (candidate, answer) in answers {
        match answer {
            Ok(Some(state)) => {
                if !state.mac.eq_ignore_ascii_case(&candidate.mac) {
                    debug!(
                        "{} answered with mac {} but was listed as {}",
                        candidate.ip, state.mac, candidate.mac
                    );
                }
                found.push(DeviceDescriptor::from_state(candidate.ip, &candidate.mac, &state));
            }
            Ok(None) => debug!("no pilot from {} ({})", candidate.ip, candidate.mac),
            Err(e) if e.is_local() => return Err(e),
            Err(e) => warn!("probing {} ({}) failed: {}", candidate.ip, candidate.mac, e),
        }
    }

    debug!("discovered {} of {} candidate(s)", found.len(), candidates.len());
    Ok(found)
}

/// Broadcast a registration probe and collect who answers within `window`.
///
/// One way to produce candidates for [`discover`] when no address list is
/// at hand. Bulbs are de-duplicated by MAC and returned sorted by IP.
pub async fn scan_candidates(window: Duration, config: &PilotConfig) -> Result<Vec<Candidate>> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .await
        .map_err(|e| Error::socket("bind", e))?;

    socket
        .set_broadcast(true)
        .map_err(|e| Error::socket("set_broadcast", e))?;

    let msg = json!({
        "method": "registration",
        "params": {
            "phoneMac": "AAAAAAAAAAAA",
            "register": false,
            "phoneIp": "1.2.3.4",
            "id": "1"
        }
    });
    let msg_bytes = serde_json::to_vec(&msg).map_err(Error::json_dump)?;

    socket
        .send_to(&msg_bytes, SocketAddr::from((Ipv4Addr::BROADCAST, config.port)))
        .await
        .map_err(|e| Error::socket("send_to", e))?;

    let mut discovered: HashMap<String, Candidate> = HashMap::new();
    let mut buffer = vec![0u8; config.max_datagram];

    let collect = async {
        loop {
            match socket.recv_from(&mut buffer).await {
                Ok((size, addr)) => {
                    if let Some(candidate) = parse_registration_reply(&buffer[..size], addr) {
                        discovered.insert(candidate.mac.clone(), candidate);
                    }
                }
                Err(e) => {
                    warn!("scan receive failed: {e}");
                    break;
                }
            }
        }
    };
    // The window always ends the scan; expiry is the normal exit.
    let _ = runtime::timeout(window, collect).await;

    let mut candidates: Vec<Candidate> = discovered.into_values().collect();
    candidates.sort_by_key(|c| c.ip);
    Ok(candidates)
}

fn parse_registration_reply(bytes: &[u8], from: SocketAddr) -> Option<Candidate> {
    let SocketAddr::V4(v4) = from else {
        return None;
    };
    let json: Value = serde_json::from_slice(bytes).ok()?;
    let mac = json.get("result")?.get("mac")?.as_str()?;
    Some(Candidate::new(*v4.ip(), mac))
}

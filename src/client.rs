//! Single request/reply exchanges with one bulb.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::debug;

use crate::config::PilotConfig;
use crate::errors::Error;
use crate::params::PilotParams;
use crate::protocol::{Ack, PilotMethod, PilotReply, PilotRequest, PilotState};
use crate::runtime::{self, AsyncUdpSocket, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// Issues one datagram and waits for at most one reply.
///
/// Every call binds its own ephemeral socket and drops it before returning,
/// so nothing is shared between calls and nothing is retried.
///
/// Outcomes:
/// - `Ok(Some(_))`: a reply for the same method arrived in time.
/// - `Ok(None)`: timeout, undecodable reply, or a reply to another method.
/// - `Err(_)`: a socket operation failed. See [`Error::is_local`].
#[derive(Debug, Clone, Default)]
pub struct PilotClient {
    config: PilotConfig,
}

impl PilotClient {
    pub fn new(config: PilotConfig) -> Self {
        PilotClient { config }
    }

    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    pub async fn send(
        &self,
        ip: Ipv4Addr,
        method: PilotMethod,
        params: Option<&PilotParams>,
        timeout: Duration,
    ) -> Result<Option<PilotReply>> {
        let msg = serde_json::to_vec(&PilotRequest::new(method, params)).map_err(Error::json_dump)?;

        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .map_err(|e| Error::socket("bind", e))?;

        let mut buffer = vec![0u8; self.config.max_datagram];
        let peer = SocketAddr::from((ip, self.config.port));

        let exchange = async {
            socket
                .connect(peer)
                .await
                .map_err(|e| Error::socket("connect", e))?;
            socket
                .send(&msg)
                .await
                .map_err(|e| Error::socket("send", e))?;
            debug!("{method} -> {peer}");
            socket
                .recv(&mut buffer)
                .await
                .map_err(|e| Error::socket("receive", e))
        };

        let bytes = match runtime::timeout(timeout, exchange).await {
            Ok(received) => received?,
            Err(_) => {
                debug!("{method} to {peer} timed out after {timeout:?}");
                return Ok(None);
            }
        };

        let reply = PilotReply::parse(&buffer[..bytes], method);
        if reply.is_none() {
            debug!(
                "dropping unusable {method} reply from {peer}: {:?}",
                String::from_utf8_lossy(&buffer[..bytes])
            );
        }
        Ok(reply)
    }

    /// `getPilot`, with the result decoded.
    ///
    /// A reply whose `result` is not a pilot state counts as absent.
    pub async fn get_pilot(&self, ip: Ipv4Addr, timeout: Duration) -> Result<Option<PilotState>> {
        let reply = self.send(ip, PilotMethod::GetPilot, None, timeout).await?;
        Ok(reply.and_then(|r| {
            let state = r.state();
            if state.is_none() {
                debug!("getPilot reply from {ip} has no usable result: {:?}", r.result);
            }
            state
        }))
    }

    pub async fn set_pilot(
        &self,
        ip: Ipv4Addr,
        params: &PilotParams,
        timeout: Duration,
    ) -> Result<Option<Ack>> {
        let reply = self
            .send(ip, PilotMethod::SetPilot, Some(params), timeout)
            .await?;
        Ok(reply.map(|r| r.ack()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBulb, Script, pilot_reply};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_pilot_success() {
        let bulb = FakeBulb::start(Script::Reply(pilot_reply(json!({"dimming": 50, "temp": 2700})))).await;
        let client = PilotClient::new(bulb.config());

        let state = client
            .get_pilot(bulb.ip(), Duration::from_millis(500))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.dimming, Some(50));
        assert_eq!(state.temp, Some(2700));
        assert_eq!(bulb.requests(), vec![json!({"method": "getPilot"})]);
    }

    #[tokio::test]
    async fn test_silent_bulb_is_absent() {
        let bulb = FakeBulb::start(Script::Silent).await;
        let client = PilotClient::new(bulb.config());

        let started = std::time::Instant::now();
        let reply = client
            .send(bulb.ip(), PilotMethod::GetPilot, None, Duration::from_millis(150))
            .await
            .unwrap();
        assert!(reply.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_absent() {
        let bulb = FakeBulb::start(Script::Raw(b"\x00\x01 definitely not json".to_vec())).await;
        let client = PilotClient::new(bulb.config());

        let reply = client
            .send(bulb.ip(), PilotMethod::GetPilot, None, Duration::from_millis(500))
            .await
            .unwrap();
        assert!(reply.is_none());
        assert_eq!(bulb.request_count(), 1);
    }

    #[cfg(target_os = "linux")]
    fn open_fds() -> usize {
        std::fs::read_dir("/proc/self/fd").unwrap().count()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_malformed_replies_release_sockets() {
        let bulb = FakeBulb::start(Script::Raw(b"{\"method\": \"getPilot\", \"result\":".to_vec())).await;
        let client = PilotClient::new(bulb.config());

        let before = open_fds();
        for _ in 0..300 {
            let reply = client
                .send(bulb.ip(), PilotMethod::GetPilot, None, Duration::from_millis(500))
                .await
                .unwrap();
            assert!(reply.is_none());
        }
        let after = open_fds();

        assert_eq!(bulb.request_count(), 300);
        // other tests in the process open sockets too; a leak here would be 300
        assert!(after < before + 100, "{before} fds before, {after} after");
    }

    #[tokio::test]
    async fn test_method_mismatch_is_absent() {
        let bulb = FakeBulb::start(Script::Reply(
            json!({"method": "setPilot", "env": "pro", "result": {"success": true}}),
        ))
        .await;
        let client = PilotClient::new(bulb.config());

        let state = client
            .get_pilot(bulb.ip(), Duration::from_millis(500))
            .await
            .unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_set_pilot_sends_params() {
        let bulb = FakeBulb::start(Script::Reply(
            json!({"method": "setPilot", "env": "pro", "result": {"success": true}}),
        ))
        .await;
        let client = PilotClient::new(bulb.config());

        let mut params = PilotParams::from(true);
        params.raw("sceneId", 12);
        let ack = client
            .set_pilot(bulb.ip(), &params, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(ack, Some(Ack { success: true }));
        assert_eq!(
            bulb.requests(),
            vec![json!({"method": "setPilot", "params": {"state": true, "sceneId": 12}})]
        );
    }
}

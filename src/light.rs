//! Per-device handle: coalesced state queries, independent commands.

use std::net::Ipv4Addr;
use std::sync::Arc;

use futures::channel::oneshot;
use log::debug;
use serde_json::{Value, json};

use crate::client::PilotClient;
use crate::config::PilotConfig;
use crate::device::DeviceDescriptor;
use crate::errors::Error;
use crate::history::{MessageHistory, Outcome};
use crate::params::PilotParams;
use crate::protocol::{Ack, PilotMethod, PilotState};
use crate::runtime::{self, Mutex};
use crate::types::{Brightness, Kelvin};

type Result<T> = std::result::Result<T, Error>;
type StateResult = Result<Option<PilotState>>;

/// Callers waiting on the one `getPilot` exchange allowed in flight.
#[derive(Debug, Default)]
struct Pending {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<StateResult>>,
}

/// A single WiZ bulb, identified by MAC and reached at an IP.
///
/// Concurrent [`get_state`](Light::get_state) calls share one network
/// exchange: the first caller starts it, later callers queue behind it, and
/// every queued caller receives the same result in the order it queued.
/// [`set_state`](Light::set_state) is never merged; each call is its own
/// exchange. Two concurrent `set_state` calls race at the bulb and whichever
/// datagram lands last wins.
///
/// Clones share the coalescing queue and history. A clone moved with
/// [`set_ip`](Light::set_ip) gets a queue of its own, so it never joins an
/// exchange addressed to the old IP.
///
/// ```
/// use std::net::Ipv4Addr;
/// use wiz_pilot::{Light, PilotConfig};
///
/// let light = Light::new(Ipv4Addr::new(192, 168, 1, 100), "a8bb50aabbcc", PilotConfig::default());
/// assert_eq!(light.mac(), "a8bb50aabbcc");
/// ```
#[derive(Debug, Clone)]
pub struct Light {
    ip: Ipv4Addr,
    mac: String,
    client: PilotClient,
    pending: Arc<Mutex<Pending>>,
    history: Arc<Mutex<MessageHistory>>,
}

impl Light {
    pub fn new(ip: Ipv4Addr, mac: &str, config: PilotConfig) -> Self {
        Light {
            ip,
            mac: mac.to_string(),
            client: PilotClient::new(config),
            pending: Arc::new(Mutex::new(Pending::default())),
            history: Arc::new(Mutex::new(MessageHistory::new())),
        }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Point this light at a new address. The MAC, and so the identity,
    /// is unchanged.
    ///
    /// The coalescing queue belongs to an address: after a move this handle
    /// stops sharing it with clones that still point at the old IP. History
    /// stays shared.
    pub fn set_ip(&mut self, ip: Ipv4Addr) {
        if ip != self.ip {
            self.ip = ip;
            self.pending = Arc::new(Mutex::new(Pending::default()));
        }
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn config(&self) -> &PilotConfig {
        self.client.config()
    }

    pub async fn history(&self) -> MessageHistory {
        self.history.lock().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    /// Current pilot state, sharing any `getPilot` already in flight.
    ///
    /// `Ok(None)` means the bulb did not answer usefully within
    /// `request_timeout`. Socket failures are returned to every caller
    /// that was waiting on the failed exchange.
    pub async fn get_state(&self) -> StateResult {
        let (tx, rx) = oneshot::channel();

        let lead = {
            let mut pending = self.pending.lock().await;
            pending.waiters.push(tx);
            !std::mem::replace(&mut pending.in_flight, true)
        };

        if lead {
            self.start_exchange();
        } else {
            debug!("getPilot for {} already in flight; queued", self.mac);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::Dropped),
        }
    }

    /// Runs the exchange detached so that a caller giving up cannot leave
    /// the in-flight flag set.
    fn start_exchange(&self) {
        let client = self.client.clone();
        let ip = self.ip;
        let pending = Arc::clone(&self.pending);
        let history = Arc::clone(&self.history);

        runtime::spawn(async move {
            let timeout = client.config().request_timeout;
            let result = client.get_pilot(ip, timeout).await;

            {
                let mut history = history.lock().await;
                match &result {
                    Ok(Some(state)) => history.record(
                        PilotMethod::GetPilot,
                        Outcome::Reply,
                        serde_json::to_value(state).ok(),
                    ),
                    Ok(None) => history.record(PilotMethod::GetPilot, Outcome::Absent, None),
                    Err(e) => history.record_error(PilotMethod::GetPilot, &e.to_string()),
                }
            }

            let waiters = {
                let mut pending = pending.lock().await;
                pending.in_flight = false;
                std::mem::take(&mut pending.waiters)
            };
            debug!("getPilot for {ip} resolved for {} caller(s)", waiters.len());
            for waiter in waiters {
                // The caller may have stopped listening.
                let _ = waiter.send(result.clone());
            }
        });
    }

    /// Send one `setPilot`.
    ///
    /// `Ok(None)` means no usable reply arrived in time; the command may or
    /// may not have been applied.
    pub async fn set_state(&self, params: &PilotParams) -> Result<Option<Ack>> {
        if !params.is_valid() {
            return Err(Error::InvalidParams);
        }

        let timeout = self.client.config().request_timeout;
        let result = self.client.set_pilot(self.ip, params, timeout).await;

        let sent = serde_json::to_value(params).ok();
        let mut history = self.history.lock().await;
        match result {
            Ok(Some(ack)) if ack.success => {
                history.record(PilotMethod::SetPilot, Outcome::Reply, sent);
                Ok(Some(ack))
            }
            Ok(Some(_)) => {
                let err = Error::Rejected { ip: self.ip };
                history.record_error(PilotMethod::SetPilot, &err.to_string());
                Err(err)
            }
            Ok(None) => {
                history.record(PilotMethod::SetPilot, Outcome::Absent, sent);
                Ok(None)
            }
            Err(e) => {
                history.record_error(PilotMethod::SetPilot, &e.to_string());
                Err(e)
            }
        }
    }

    pub async fn set_power(&self, on: bool) -> Result<Option<Ack>> {
        self.set_state(&PilotParams::from(on)).await
    }

    pub async fn set_brightness(&self, brightness: &Brightness) -> Result<Option<Ack>> {
        self.set_state(&PilotParams::from(brightness)).await
    }

    pub async fn set_temperature(&self, kelvin: &Kelvin) -> Result<Option<Ack>> {
        self.set_state(&PilotParams::from(kelvin)).await
    }

    /// A fresh snapshot built from a (coalesced) `getPilot`.
    pub async fn describe(&self) -> Result<Option<DeviceDescriptor>> {
        let state = self.get_state().await?;
        Ok(state.map(|s| DeviceDescriptor::from_state(self.ip, &self.mac, &s)))
    }

    /// Identity, queue depth and history summary. No network traffic.
    pub async fn diagnostics(&self) -> Value {
        let (in_flight, waiting) = {
            let pending = self.pending.lock().await;
            (pending.in_flight, pending.waiters.len())
        };
        let summary = self.history.lock().await.summary();

        json!({
            "ip": self.ip.to_string(),
            "mac": self.mac,
            "in_flight": in_flight,
            "waiting": waiting,
            "history": serde_json::to_value(summary).unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBulb, Script, pilot_reply};
    use std::net::SocketAddr;
    use std::time::Duration;

    fn set_ok() -> Script {
        Script::Reply(json!({"method": "setPilot", "env": "pro", "result": {"success": true}}))
    }

    #[tokio::test]
    async fn test_concurrent_get_state_shares_one_exchange() {
        let bulb = FakeBulb::start_delayed(
            Script::Reply(pilot_reply(json!({"dimming": 30, "temp": 3000}))),
            Duration::from_millis(100),
        )
        .await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        let results = futures::future::join_all((0..5).map(|_| light.get_state())).await;

        assert_eq!(bulb.request_count(), 1);
        let first = results[0].clone().unwrap().unwrap();
        assert_eq!(first.dimming, Some(30));
        for result in results {
            assert_eq!(result.unwrap().unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_clones_share_the_queue() {
        let bulb = FakeBulb::start_delayed(
            Script::Reply(pilot_reply(json!({"dimming": 60}))),
            Duration::from_millis(100),
        )
        .await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let light = light.clone();
                tokio::spawn(async move { light.get_state().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().unwrap().dimming, Some(60));
        }
        assert_eq!(bulb.request_count(), 1);
    }

    #[tokio::test]
    async fn test_moved_clone_does_not_join_old_exchange() {
        let old = FakeBulb::start_delayed(
            Script::Reply(pilot_reply(json!({"dimming": 11}))),
            Duration::from_millis(150),
        )
        .await;
        let new = FakeBulb::start_at(
            SocketAddr::from((Ipv4Addr::new(127, 0, 0, 9), old.port())),
            Script::Reply(pilot_reply(json!({"dimming": 99}))),
            Duration::ZERO,
        )
        .await;
        let light = Light::new(old.ip(), "a8bb50000001", old.config());

        let mut moved = light.clone();
        let first = tokio::spawn(async move { light.get_state().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        moved.set_ip(new.ip());

        let state = moved.get_state().await.unwrap().unwrap();
        assert_eq!(state.dimming, Some(99));
        assert_eq!(first.await.unwrap().unwrap().unwrap().dimming, Some(11));
        assert_eq!(old.request_count(), 1);
        assert_eq!(new.request_count(), 1);
    }

    #[tokio::test]
    async fn test_set_ip_to_same_address_keeps_sharing() {
        let bulb = FakeBulb::start_delayed(
            Script::Reply(pilot_reply(json!({"dimming": 45}))),
            Duration::from_millis(100),
        )
        .await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());
        let mut same = light.clone();
        same.set_ip(bulb.ip());

        let (a, b) = futures::future::join(light.get_state(), same.get_state()).await;
        assert_eq!(a.unwrap().unwrap().dimming, Some(45));
        assert_eq!(b.unwrap().unwrap().dimming, Some(45));
        assert_eq!(bulb.request_count(), 1);
    }

    #[tokio::test]
    async fn test_queue_drains_and_next_call_goes_out() {
        let bulb = FakeBulb::start(Script::Reply(pilot_reply(json!({})))).await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        assert!(light.get_state().await.unwrap().is_some());
        assert!(light.get_state().await.unwrap().is_some());
        assert_eq!(bulb.request_count(), 2);

        let diag = light.diagnostics().await;
        assert_eq!(diag["in_flight"], false);
        assert_eq!(diag["waiting"], 0);
        assert_eq!(diag["history"]["reply_count"], 2);
    }

    #[tokio::test]
    async fn test_timeout_resolves_every_waiter_to_absent() {
        let bulb = FakeBulb::start(Script::Silent).await;
        let mut config = bulb.config();
        config.request_timeout = Duration::from_millis(100);
        let light = Light::new(bulb.ip(), "a8bb50000001", config);

        let results = futures::future::join_all((0..4).map(|_| light.get_state())).await;
        assert!(results.iter().all(|r| matches!(r, Ok(None))));
        assert_eq!(bulb.request_count(), 1);

        // flag was cleared, so the next call issues a new exchange
        assert!(light.get_state().await.unwrap().is_none());
        assert_eq!(bulb.request_count(), 2);
        assert_eq!(light.history().await.summary().absent_count, 2);
    }

    #[tokio::test]
    async fn test_set_state_is_never_coalesced() {
        let bulb = FakeBulb::start_delayed(set_ok(), Duration::from_millis(20)).await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        let on = PilotParams::from(true);
        let dim = PilotParams::from(&Brightness::create(40).unwrap());
        let warm = PilotParams::from(&Kelvin::create(2700).unwrap());
        let results =
            futures::future::join3(light.set_state(&on), light.set_state(&dim), light.set_state(&warm))
                .await;

        assert_eq!(results.0.unwrap(), Some(Ack { success: true }));
        assert_eq!(results.1.unwrap(), Some(Ack { success: true }));
        assert_eq!(results.2.unwrap(), Some(Ack { success: true }));
        assert_eq!(bulb.request_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_params_rejected_locally() {
        let bulb = FakeBulb::start(set_ok()).await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        let err = light.set_state(&PilotParams::new()).await.unwrap_err();
        assert_eq!(err, Error::InvalidParams);
        assert_eq!(bulb.request_count(), 0);
    }

    #[tokio::test]
    async fn test_refused_command_is_an_error() {
        let bulb = FakeBulb::start(Script::Reply(json!({
            "method": "setPilot", "env": "pro",
            "error": {"code": -32602, "message": "Invalid params"}
        })))
        .await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        let err = light.set_power(false).await.unwrap_err();
        assert_eq!(err, Error::Rejected { ip: bulb.ip() });
        assert!(light.history().await.last_error().is_some());
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_to_direct_caller() {
        // Grab a port nobody listens on; loopback answers with port unreachable.
        let port = {
            let probe = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
            probe.local_addr().unwrap().port()
        };
        let config = PilotConfig {
            port,
            ..PilotConfig::default()
        };
        let light = Light::new(Ipv4Addr::LOCALHOST, "a8bb50000001", config);

        let err = light.get_state().await.unwrap_err();
        assert!(matches!(err, Error::Socket { .. }));
        assert!(!err.is_local());
    }

    #[tokio::test]
    async fn test_describe_classifies() {
        let bulb = FakeBulb::start(Script::Reply(pilot_reply(json!({"dimming": 80})))).await;
        let light = Light::new(bulb.ip(), "a8bb50000001", bulb.config());

        let descriptor = light.describe().await.unwrap().unwrap();
        assert_eq!(descriptor.device_class, crate::DeviceClass::RgbLight);
        assert_eq!(descriptor.mac, "a8bb50000001");
        assert_eq!(descriptor.ip, bulb.ip());
    }
}

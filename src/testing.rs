//! Scripted stand-in for a bulb, bound on loopback.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::UdpSocket;

use crate::config::PilotConfig;

#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Answer every datagram with this JSON.
    Reply(Value),
    /// Answer every datagram with these bytes.
    Raw(Vec<u8>),
    /// Never answer.
    Silent,
}

/// A `getPilot` reply whose result carries `fields` on top of the
/// mandatory ones.
pub(crate) fn pilot_reply(fields: Value) -> Value {
    let mut result = json!({"mac": "a8bb50000001", "rssi": -60, "src": "", "state": true});
    if let (Some(result), Some(fields)) = (result.as_object_mut(), fields.as_object()) {
        result.extend(fields.clone());
    }
    json!({"method": "getPilot", "env": "pro", "result": result})
}

pub(crate) struct FakeBulb {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeBulb {
    pub async fn start(script: Script) -> Self {
        Self::start_at(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), script, Duration::ZERO).await
    }

    pub async fn start_delayed(script: Script, delay: Duration) -> Self {
        Self::start_at(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), script, delay).await
    }

    pub async fn start_at(addr: SocketAddr, script: Script, delay: Duration) -> Self {
        let socket = UdpSocket::bind(addr).await.unwrap();
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            let mut buffer = [0u8; 4096];
            while let Ok((size, peer)) = socket.recv_from(&mut buffer).await {
                let request = serde_json::from_slice(&buffer[..size]).unwrap_or(Value::Null);
                seen.lock().unwrap().push(request);

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let answer = match &script {
                    Script::Reply(value) => serde_json::to_vec(value).unwrap(),
                    Script::Raw(bytes) => bytes.clone(),
                    Script::Silent => continue,
                };
                let _ = socket.send_to(&answer, peer).await;
            }
        });

        FakeBulb { addr, requests }
    }

    pub fn ip(&self) -> Ipv4Addr {
        match self.addr {
            SocketAddr::V4(v4) => *v4.ip(),
            SocketAddr::V6(_) => unreachable!("fake bulbs bind IPv4"),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn config(&self) -> PilotConfig {
        PilotConfig {
            port: self.port(),
            request_timeout: Duration::from_millis(500),
            discovery_timeout: Duration::from_millis(300),
            ..PilotConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

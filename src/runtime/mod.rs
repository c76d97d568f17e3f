//! Runtime-agnostic async plumbing.
//!
//! Everything the pilot client, the coalescer and discovery need from an
//! executor lives here: a UDP socket, a timer race, a detached spawn and an
//! async mutex. Exactly one backend is compiled in, picked by feature:
//!
//! - `runtime-tokio` (default)
//! - `runtime-async-std`
//! - `runtime-smol`
//!
//! ```toml
//! [dependencies]
//! wiz-pilot = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! ```

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg(feature = "runtime-tokio")]
mod tokio_impl;

#[cfg(feature = "runtime-async-std")]
mod async_std_impl;

#[cfg(feature = "runtime-smol")]
mod smol_impl;

#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::UdpSocket;

#[cfg(feature = "runtime-async-std")]
pub use async_std_impl::UdpSocket;

#[cfg(feature = "runtime-smol")]
pub use smol_impl::UdpSocket;

#[cfg(feature = "runtime-tokio")]
use tokio_impl as backend;

#[cfg(feature = "runtime-async-std")]
use async_std_impl as backend;

#[cfg(feature = "runtime-smol")]
use smol_impl as backend;

/// The UDP operations the pilot protocol needs.
///
/// A socket is owned by exactly one exchange and closed when dropped, so
/// every exit path of an exchange (reply, timeout, error) releases it.
pub trait AsyncUdpSocket: Send + Sync + Sized {
    fn bind(addr: SocketAddr) -> impl Future<Output = io::Result<Self>> + Send;

    /// Fix the peer so that `send`/`recv` only talk to one bulb.
    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<()>> + Send;

    fn send(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    fn send_to(&self, buf: &[u8], addr: SocketAddr)
    -> impl Future<Output = io::Result<usize>> + Send;

    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    fn set_broadcast(&self, broadcast: bool) -> io::Result<()>;
}

/// Error returned when a timeout expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// Race `future` against a timer.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    backend::timeout(duration, future).await
}

/// Run `future` in the background; its output is discarded.
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    backend::spawn(future)
}

#[cfg(feature = "runtime-tokio")]
pub use tokio::sync::Mutex;

#[cfg(feature = "runtime-async-std")]
pub use async_std::sync::Mutex;

#[cfg(feature = "runtime-smol")]
pub use async_lock::Mutex;

#[cfg(not(any(
    feature = "runtime-tokio",
    feature = "runtime-async-std",
    feature = "runtime-smol"
)))]
compile_error!(
    "One of \"runtime-tokio\", \"runtime-async-std\", or \"runtime-smol\" features must be enabled"
);

#[cfg(all(feature = "runtime-tokio", feature = "runtime-async-std"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-async-std\" are mutually exclusive");

#[cfg(all(feature = "runtime-tokio", feature = "runtime-smol"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-smol\" are mutually exclusive");

#[cfg(all(feature = "runtime-async-std", feature = "runtime-smol"))]
compile_error!("Features \"runtime-async-std\" and \"runtime-smol\" are mutually exclusive");

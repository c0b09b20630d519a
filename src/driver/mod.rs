//! Device session layer.
//!
//! Defines what the orchestrator needs from a session ([`DeviceSession`])
//! and from something that can open one ([`Connect`]), plus the production
//! IOS implementation and the Telnet-then-SSH open policy.

mod connector;
mod session;

pub use connector::IosConnector;
pub use session::IosSession;

use std::future::Future;
use std::net::Ipv4Addr;

use log::debug;

pub use crate::channel::SessionChannel;
use crate::error::Result;
use crate::transport::TransportProfile;

/// An open, ready-to-use device session.
pub trait DeviceSession: SessionChannel {
    /// Enter privileged (enable) mode.
    fn enter_privileged(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Leave privileged mode.
    fn exit_privileged(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run one command and return its complete output, pagination absorbed.
    fn execute(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Release the connection. Called on success and failure paths alike.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions for the crawler.
pub trait Connect: Send + Sync {
    type Session: DeviceSession;

    /// Open a session to `address`.
    fn connect(&self, address: Ipv4Addr) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Try `open` with the primary profile; on a connection-level refusal retry
/// exactly once with the secondary. Any other failure propagates unmodified,
/// so there are never more than two connection attempts.
pub(crate) async fn open_with_fallback<S, F, Fut>(
    primary: TransportProfile,
    secondary: TransportProfile,
    mut open: F,
) -> Result<S>
where
    F: FnMut(TransportProfile) -> Fut,
    Fut: Future<Output = Result<S>>,
{
    match open(primary).await {
        Err(err) if err.is_connection_refused() => {
            debug!("{} refused, retrying over {}", primary, secondary);
            open(secondary).await
        }
        other => other,
    }
}

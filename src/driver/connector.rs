//! Production connector: Telnet first, SSH on refusal.

use std::net::Ipv4Addr;
use std::sync::Arc;

use super::{Connect, IosSession, open_with_fallback};
use crate::config::{Credentials, SessionOptions};
use crate::error::Result;
use crate::transport::TransportProfile;

/// Opens [`IosSession`]s with the shared credentials, trying the Telnet
/// profile and falling back to SSH when the Telnet port refuses.
#[derive(Debug)]
pub struct IosConnector {
    credentials: Arc<Credentials>,
    options: SessionOptions,
}

impl IosConnector {
    /// Create a connector from the run-wide credentials and session tuning.
    pub fn new(credentials: Credentials, options: SessionOptions) -> Self {
        Self {
            credentials: Arc::new(credentials),
            options,
        }
    }
}

impl Connect for IosConnector {
    type Session = IosSession;

    async fn connect(&self, address: Ipv4Addr) -> Result<IosSession> {
        open_with_fallback(TransportProfile::Telnet, TransportProfile::Ssh, |profile| {
            IosSession::open(address, profile, Arc::clone(&self.credentials), &self.options)
        })
        .await
    }
}

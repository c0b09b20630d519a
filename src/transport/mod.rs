//! Byte-stream transports for device sessions.
//!
//! Fleet switches speak one of two legacy management protocols and there is
//! no way to know which without trying: the session adapter attempts Telnet
//! first and falls back to SSH when the Telnet port refuses. The fallback is
//! a fixed two-element policy, so the transports are an enum rather than an
//! open trait.

mod ssh;
mod telnet;

pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use crate::error::Result;

/// Which protocol profile to open a session with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProfile {
    /// Plain Telnet, the primary profile.
    Telnet,

    /// SSH, attempted once when Telnet is refused.
    Ssh,
}

impl std::fmt::Display for TransportProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportProfile::Telnet => write!(f, "telnet"),
            TransportProfile::Ssh => write!(f, "ssh"),
        }
    }
}

/// An open byte-stream connection to a device.
pub enum Transport {
    Telnet(TelnetTransport),
    Ssh(SshTransport),
}

impl Transport {
    /// Read one chunk of raw channel data, blocking until the device sends
    /// something. Telnet option negotiation never surfaces here.
    pub async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        match self {
            Transport::Telnet(t) => t.read_chunk().await,
            Transport::Ssh(t) => t.read_chunk().await,
        }
    }

    /// Write raw bytes to the device.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Transport::Telnet(t) => t.write_all(data).await,
            Transport::Ssh(t) => t.write_all(data).await,
        }
    }

    /// Close the connection. Close failures are reported but sessions are
    /// considered released regardless.
    pub async fn close(&mut self) -> Result<()> {
        match self {
            Transport::Telnet(t) => t.close().await,
            Transport::Ssh(t) => t.close().await,
        }
    }
}

//! Run-wide configuration: device credentials and session tuning.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Credentials shared read-only by every session open in a crawl.
///
/// Passed explicitly into each connect call rather than held as ambient
/// state; the password and enable secret are wrapped so they never end up
/// in debug output or logs.
#[derive(Debug)]
pub struct Credentials {
    /// Login username.
    pub username: String,

    /// Login password.
    password: SecretString,

    /// Secret for entering privileged (enable) mode.
    secret: SecretString,
}

impl Credentials {
    /// Create a new credential set.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            secret: SecretString::from(secret.into()),
        }
    }

    /// The login password, exposed for transmission to the device.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The enable secret, exposed for transmission to the device.
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

/// Tuning knobs for opening and driving a device session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Telnet port for the primary transport profile.
    pub telnet_port: u16,

    /// SSH port for the secondary transport profile.
    pub ssh_port: u16,

    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// Timeout for a single raw channel read. Inside the pagination loop an
    /// elapsed read means end-of-output, not failure.
    pub read_timeout: Duration,

    /// Terminal width requested from the device.
    pub terminal_width: u32,

    /// Terminal height requested from the device.
    pub terminal_height: u32,

    /// Directory for per-device raw session transcripts, written when the
    /// operator asks for them. `None` disables transcripts.
    pub transcript_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            telnet_port: 23,
            ssh_port: 22,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(10),
            terminal_width: 511,
            terminal_height: 24,
            transcript_dir: None,
        }
    }
}

//! Error types for confcrawl.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for confcrawl operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An include entry parsed as neither a single address nor a network.
    /// Fatal: detected while building the address filter, before the crawl.
    #[error("invalid address or network '{text}'")]
    InvalidAddress { text: String },

    /// Transport-level errors (TCP/SSH connection, authentication)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors (login, privilege escalation)
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Backup artifact errors
    #[error("backup error: {0}")]
    Backup(#[from] BackupError),
}

/// Transport layer errors (connection setup, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The device actively refused the connection. This variant alone
    /// triggers the Telnet -> SSH profile fallback.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused { host: String, port: u16 },

    /// Failed to reach the host
    #[error("connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Connection was closed unexpectedly
    #[error("connection disconnected")]
    Disconnected,

    /// Connecting timed out
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (raw reads, pattern matching).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A raw channel read produced no data within the timeout.
    ///
    /// The paginated reader treats this as a normal end-of-output signal;
    /// it only surfaces as an error outside a pagination loop.
    #[error("no channel data within {0:?}")]
    ReadTimeout(Duration),

    /// An expected pattern never appeared in the output
    #[error("pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("channel closed")]
    Closed,

    /// Invalid regex pattern
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session layer errors (in-band login, privilege transitions).
#[derive(Error, Debug)]
pub enum SessionError {
    /// The device never presented a usable prompt after login
    #[error("login failed for user '{user}'")]
    LoginFailed { user: String },

    /// Entering or leaving privileged mode did not land on the expected prompt
    #[error("privilege transition failed, last prompt: '{prompt}'")]
    PrivilegeFailed { prompt: String },
}

/// Backup artifact errors.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The artifact file could not be created or written
    #[error("can't write artifact '{}': {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Whether this error is a connection-level refusal, the one condition
    /// that makes the session adapter retry with the secondary transport
    /// profile.
    pub fn is_connection_refused(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::ConnectionRefused { .. })
        )
    }

    /// Whether this error is the benign end-of-output signal from a raw
    /// channel read.
    pub fn is_read_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::ReadTimeout(_)))
    }
}

/// Result type alias using confcrawl's Error.
pub type Result<T> = std::result::Result<T, Error>;

//! SSH transport wrapping russh.

use std::sync::Arc;

use log::debug;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg, Disconnect};

use crate::config::{Credentials, SessionOptions};
use crate::error::{ChannelError, Result, TransportError};

/// SSH connection to one device: a russh client session with a single
/// PTY-backed shell channel.
pub struct SshTransport {
    session: Handle<SshHandler>,
    channel: Channel<Msg>,
}

impl SshTransport {
    /// Connect, authenticate with the shared credentials, and request an
    /// interactive shell.
    pub async fn connect(
        host: &str,
        port: u16,
        credentials: &Credentials,
        options: &SessionOptions,
    ) -> Result<Self> {
        debug!("ssh: connecting to {}:{}", host, port);

        let config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let mut session = tokio::time::timeout(
            options.connect_timeout,
            client::connect(config, (host, port), SshHandler),
        )
        .await
        .map_err(|_| TransportError::Timeout(options.connect_timeout))?
        .map_err(TransportError::Ssh)?;

        let auth = session
            .authenticate_password(&credentials.username, credentials.password())
            .await
            .map_err(TransportError::Ssh)?;
        if !auth.success() {
            return Err(TransportError::AuthenticationFailed {
                user: credentials.username.clone(),
            }
            .into());
        }

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "vt100",
                options.terminal_width,
                options.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(Self { session, channel })
    }

    /// Read one chunk of channel data.
    pub async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { ref data }) => return Ok(data.to_vec()),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => return Ok(data.to_vec()),
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                // Window adjusts, exit status and the like carry no data
                Some(_) => continue,
            }
        }
    }

    /// Write raw bytes to the shell channel.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.channel.data(data).await.map_err(TransportError::Ssh)?;
        Ok(())
    }

    /// Close the channel and disconnect.
    pub async fn close(&mut self) -> Result<()> {
        // Best-effort EOF; the disconnect below releases the session either way
        let _ = self.channel.eof().await;
        self.session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Client handler accepting any host key.
///
/// Crawled switches are rarely in known_hosts and the operator has no
/// opportunity to confirm keys mid-crawl, so verification is disabled.
struct SshHandler;

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

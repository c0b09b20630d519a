//! Interactive session with one IOS switch.

use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{trace, warn};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::DeviceSession;
use crate::channel::{PagingProfile, PatternBuffer, SessionChannel, read_paged};
use crate::config::{Credentials, SessionOptions};
use crate::error::{ChannelError, Result, SessionError};
use crate::transport::{SshTransport, TelnetTransport, Transport, TransportProfile};

/// Any exec or privileged prompt: hostname-ish text ending in `>` or `#`.
static PROMPT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.\-@()/:+]{1,63}[>#]\s*$").expect("static pattern compiles"));

/// Privileged-mode prompt.
static PRIVILEGED_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*$").expect("static pattern compiles"));

/// Username prompt shown by the Telnet login dialog.
static USERNAME_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(username|login):?\s*$").expect("static pattern compiles"));

/// Password prompt, shown at login and when entering enable mode.
static PASSWORD_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)password:?\s*$").expect("static pattern compiles"));

/// Upper bound on reads while waiting for one expected pattern. Every read
/// is already bounded by the read timeout; the cap stops a device that
/// streams forever without ever matching.
const MAX_PATTERN_READS: usize = 256;

/// A live session with exactly one switch.
///
/// Owned by the crawl orchestrator for the duration of one device visit and
/// released before the next queue pop.
pub struct IosSession {
    transport: Transport,
    buffer: PatternBuffer,
    paging: PagingProfile,
    credentials: Arc<Credentials>,
    options: SessionOptions,
    transcript: Option<std::fs::File>,
}

impl IosSession {
    /// Open a session to `address` with the given transport profile.
    ///
    /// Telnet performs the in-band username/password dialog; SSH arrives
    /// already authenticated and only waits for the banner to finish. Both
    /// end with a best-effort attempt to widen the terminal and disable the
    /// pager — the paginated reader covers devices that deny those commands.
    pub(crate) async fn open(
        address: Ipv4Addr,
        profile: TransportProfile,
        credentials: Arc<Credentials>,
        options: &SessionOptions,
    ) -> Result<Self> {
        let host = address.to_string();
        let transport = match profile {
            TransportProfile::Telnet => Transport::Telnet(
                TelnetTransport::connect(&host, options.telnet_port, options.connect_timeout)
                    .await?,
            ),
            TransportProfile::Ssh => Transport::Ssh(
                SshTransport::connect(&host, options.ssh_port, &credentials, options).await?,
            ),
        };

        let transcript = options.transcript_dir.as_ref().and_then(|dir| {
            let path = dir.join(format!("session_{address}.log"));
            match std::fs::File::create(&path) {
                Ok(file) => Some(file),
                Err(err) => {
                    warn!("can't open session transcript '{}': {}", path.display(), err);
                    None
                }
            }
        });

        let mut session = Self {
            transport,
            buffer: PatternBuffer::default(),
            paging: PagingProfile::default(),
            credentials,
            options: options.clone(),
            transcript,
        };

        match profile {
            TransportProfile::Telnet => session.login().await?,
            TransportProfile::Ssh => session.await_initial_prompt().await?,
        }
        session.prepare_terminal().await?;

        Ok(session)
    }

    /// One transport read bounded by the read timeout, teed to the
    /// transcript when one is open.
    async fn read_raw(&mut self) -> Result<Vec<u8>> {
        let chunk = tokio::time::timeout(self.options.read_timeout, self.transport.read_chunk())
            .await
            .map_err(|_| ChannelError::ReadTimeout(self.options.read_timeout))??;

        if let Some(file) = &mut self.transcript {
            let _ = file.write_all(&chunk);
        }

        Ok(chunk)
    }

    /// Read until `pattern` matches the buffer tail.
    async fn read_until(&mut self, pattern: &Regex) -> Result<()> {
        for _ in 0..MAX_PATTERN_READS {
            let chunk = self.read_raw().await.map_err(|err| {
                if err.is_read_timeout() {
                    ChannelError::PatternTimeout(self.options.read_timeout).into()
                } else {
                    err
                }
            })?;
            self.buffer.extend(&chunk);
            if self.buffer.tail_contains(pattern) {
                return Ok(());
            }
        }
        Err(ChannelError::PatternTimeout(self.options.read_timeout).into())
    }

    /// Drive the Telnet username/password dialog to the first device prompt.
    async fn login(&mut self) -> Result<()> {
        let mut sent_username = false;
        let mut sent_password = false;
        self.buffer.clear();

        for _ in 0..MAX_PATTERN_READS {
            let chunk = self.read_raw().await.map_err(|err| -> crate::Error {
                if err.is_read_timeout() {
                    SessionError::LoginFailed {
                        user: self.credentials.username.clone(),
                    }
                    .into()
                } else {
                    err
                }
            })?;
            self.buffer.extend(&chunk);

            if self.buffer.tail_contains(&PROMPT_PATTERN) {
                trace!("login complete");
                return Ok(());
            }
            if self.buffer.tail_contains(&PASSWORD_PROMPT) && !sent_password {
                let line = format!("{}\n", self.credentials.password());
                self.transport.write_all(line.as_bytes()).await?;
                sent_password = true;
                self.buffer.clear();
            } else if self.buffer.tail_contains(&USERNAME_PROMPT) && !sent_username {
                let line = format!("{}\n", self.credentials.username);
                self.transport.write_all(line.as_bytes()).await?;
                sent_username = true;
                self.buffer.clear();
            }
        }

        Err(SessionError::LoginFailed {
            user: self.credentials.username.clone(),
        }
        .into())
    }

    /// Wait for the banner to finish and a prompt to show (SSH path).
    async fn await_initial_prompt(&mut self) -> Result<()> {
        self.buffer.clear();
        self.read_until(&PROMPT_PATTERN).await?;
        self.buffer.clear();
        Ok(())
    }

    /// Widen the terminal and try to disable the pager. Devices may deny
    /// either command; the error text just flows by as command output.
    async fn prepare_terminal(&mut self) -> Result<()> {
        let width = format!("terminal width {}", self.options.terminal_width);
        for command in [width.as_str(), "terminal length 0"] {
            self.send_expect(command, &PROMPT_PATTERN).await?;
        }
        Ok(())
    }
}

impl SessionChannel for IosSession {
    async fn find_prompt(&mut self) -> Result<String> {
        self.buffer.clear();
        self.write_channel("\n").await?;
        self.read_until(&PROMPT_PATTERN).await?;

        let text = self.buffer.take_string();
        let prompt = text
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string();
        trace!("prompt: '{}'", prompt);
        Ok(prompt)
    }

    async fn send_expect(&mut self, command: &str, expect: &Regex) -> Result<String> {
        self.buffer.clear();
        self.write_channel(&format!("{command}\n")).await?;
        self.read_until(expect).await?;

        let raw = self.buffer.take_string();
        Ok(strip_command_echo(&raw, command).to_string())
    }

    async fn read_channel(&mut self) -> Result<String> {
        let chunk = self.read_raw().await?;
        Ok(String::from_utf8_lossy(&chunk).into_owned())
    }

    async fn write_channel(&mut self, data: &str) -> Result<()> {
        self.transport.write_all(data.as_bytes()).await
    }
}

impl DeviceSession for IosSession {
    async fn enter_privileged(&mut self) -> Result<()> {
        let prompt = self.find_prompt().await?;
        if prompt.ends_with('#') {
            return Ok(());
        }

        self.buffer.clear();
        self.write_channel("enable\n").await?;

        let mut sent_secret = false;
        for _ in 0..MAX_PATTERN_READS {
            let chunk = self.read_raw().await.map_err(|err| -> crate::Error {
                if err.is_read_timeout() {
                    SessionError::PrivilegeFailed {
                        prompt: prompt.clone(),
                    }
                    .into()
                } else {
                    err
                }
            })?;
            self.buffer.extend(&chunk);

            if self.buffer.tail_contains(&PRIVILEGED_PROMPT) {
                self.buffer.clear();
                return Ok(());
            }
            if self.buffer.tail_contains(&PASSWORD_PROMPT) && !sent_secret {
                let line = format!("{}\n", self.credentials.secret());
                self.transport.write_all(line.as_bytes()).await?;
                sent_secret = true;
                self.buffer.clear();
            }
        }

        Err(SessionError::PrivilegeFailed { prompt }.into())
    }

    async fn exit_privileged(&mut self) -> Result<()> {
        self.buffer.clear();
        self.write_channel("disable\n").await?;
        self.read_until(&PROMPT_PATTERN).await?;
        self.buffer.clear();
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        let paging = self.paging.clone();
        read_paged(self, command, &paging).await
    }

    async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}

/// Drop the leading line when it is just the device echoing the command.
fn strip_command_echo<'a>(raw: &'a str, command: &str) -> &'a str {
    if let Some((first, rest)) = raw.split_once('\n') {
        if first.contains(command.trim()) {
            return rest;
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_command_echo() {
        assert_eq!(
            strip_command_echo("sh ver\r\nCisco IOS\nswitch#", "sh ver"),
            "Cisco IOS\nswitch#"
        );
        // Output that does not echo stays untouched
        assert_eq!(strip_command_echo("Cisco IOS\n", "sh ver"), "Cisco IOS\n");
    }

    #[test]
    fn test_prompt_pattern_matches_both_modes() {
        assert!(PROMPT_PATTERN.is_match(b"switch>"));
        assert!(PROMPT_PATTERN.is_match(b"switch# "));
        assert!(PROMPT_PATTERN.is_match(b"core-sw.lab#"));
        assert!(!PROMPT_PATTERN.is_match(b"Password:"));
    }

    #[test]
    fn test_login_prompts() {
        assert!(USERNAME_PROMPT.is_match(b"Username: "));
        assert!(USERNAME_PROMPT.is_match(b"login:"));
        assert!(PASSWORD_PROMPT.is_match(b"Password: "));
        assert!(!PASSWORD_PROMPT.is_match(b"switch#"));
    }
}

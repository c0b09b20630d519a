//! Telnet transport over a plain TCP stream.
//!
//! Switches still default to Telnet for management access on many fleets.
//! The transport refuses every Telnet option the device proposes (WILL is
//! answered with DONT, DO with WONT), which leaves both ends in the base
//! NVT state the IOS CLI expects. Negotiation bytes never reach the caller.

use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{ChannelError, Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

/// Decoder state for option negotiation spanning chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecoderState {
    #[default]
    Data,
    Iac,
    Option(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Streaming decoder separating application data from option negotiation.
#[derive(Debug, Default)]
struct TelnetDecoder {
    state: DecoderState,
}

impl TelnetDecoder {
    /// Split an incoming chunk into application data and the negotiation
    /// replies it demands. State persists across chunks.
    fn decode(&mut self, chunk: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(chunk.len());
        let mut replies = Vec::new();

        for &byte in chunk {
            self.state = match (self.state, byte) {
                (DecoderState::Data, IAC) => DecoderState::Iac,
                (DecoderState::Data, b) => {
                    data.push(b);
                    DecoderState::Data
                }

                // Escaped literal 0xFF
                (DecoderState::Iac, IAC) => {
                    data.push(IAC);
                    DecoderState::Data
                }
                (DecoderState::Iac, cmd @ (WILL | WONT | DO | DONT)) => DecoderState::Option(cmd),
                (DecoderState::Iac, SB) => DecoderState::Subnegotiation,
                // NOP, GA and friends carry no option byte
                (DecoderState::Iac, _) => DecoderState::Data,

                (DecoderState::Option(cmd), option) => {
                    match cmd {
                        // Refuse whatever the device proposes
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        // WONT/DONT acknowledgements need no answer
                        _ => {}
                    }
                    DecoderState::Data
                }

                (DecoderState::Subnegotiation, IAC) => DecoderState::SubnegotiationIac,
                (DecoderState::Subnegotiation, _) => DecoderState::Subnegotiation,
                (DecoderState::SubnegotiationIac, SE) => DecoderState::Data,
                (DecoderState::SubnegotiationIac, _) => DecoderState::Subnegotiation,
            };
        }

        (data, replies)
    }
}

/// Telnet connection to one device.
#[derive(Debug)]
pub struct TelnetTransport {
    stream: TcpStream,
    read_buf: BytesMut,
    decoder: TelnetDecoder,
}

impl TelnetTransport {
    /// Connect to `host:port` within `timeout`.
    ///
    /// An active refusal maps to [`TransportError::ConnectionRefused`], the
    /// signal that makes the session adapter retry over SSH.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        debug!("telnet: connecting to {}:{}", host, port);

        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::ConnectionRefused {
                    TransportError::ConnectionRefused {
                        host: host.to_string(),
                        port,
                    }
                } else {
                    TransportError::ConnectionFailed {
                        host: host.to_string(),
                        port,
                        source,
                    }
                }
            })?;

        Ok(Self {
            stream,
            read_buf: BytesMut::zeroed(4096),
            decoder: TelnetDecoder::default(),
        })
    }

    /// Read one chunk of application data, handling any interleaved option
    /// negotiation. Loops until actual data arrives (a chunk may consist of
    /// negotiation only).
    pub async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        loop {
            let n = self
                .stream
                .read(&mut self.read_buf)
                .await
                .map_err(TransportError::Io)?;
            if n == 0 {
                return Err(ChannelError::Closed.into());
            }

            let chunk = self.read_buf[..n].to_vec();
            let (data, replies) = self.decoder.decode(&chunk);

            if !replies.is_empty() {
                trace!("telnet: answering {} negotiation bytes", replies.len());
                self.stream
                    .write_all(&replies)
                    .await
                    .map_err(TransportError::Io)?;
            }

            if !data.is_empty() {
                return Ok(data);
            }
        }
    }

    /// Write raw bytes, escaping literal IAC octets.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut escaped = Vec::with_capacity(data.len());
        for &byte in data {
            escaped.push(byte);
            if byte == IAC {
                escaped.push(IAC);
            }
        }
        self.stream
            .write_all(&escaped)
            .await
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Shut the stream down.
    pub async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_refuses_options() {
        let mut decoder = TelnetDecoder::default();
        let (data, replies) = decoder.decode(&[IAC, WILL, 1, b'h', b'i', IAC, DO, 3]);
        assert_eq!(data, b"hi");
        assert_eq!(replies, vec![IAC, DONT, 1, IAC, WONT, 3]);
    }

    #[test]
    fn test_decode_negotiation_split_across_chunks() {
        let mut decoder = TelnetDecoder::default();
        let (data, replies) = decoder.decode(&[b'a', IAC]);
        assert_eq!(data, b"a");
        assert!(replies.is_empty());

        let (data, replies) = decoder.decode(&[WILL, 24, b'b']);
        assert_eq!(data, b"b");
        assert_eq!(replies, vec![IAC, DONT, 24]);
    }

    #[test]
    fn test_decode_subnegotiation_swallowed() {
        let mut decoder = TelnetDecoder::default();
        let (data, replies) = decoder.decode(&[IAC, SB, 24, 1, 2, 3, IAC, SE, b'o', b'k']);
        assert_eq!(data, b"ok");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_decode_escaped_iac() {
        let mut decoder = TelnetDecoder::default();
        let (data, _) = decoder.decode(&[b'x', IAC, IAC, b'y']);
        assert_eq!(data, vec![b'x', IAC, b'y']);
    }

    #[test]
    fn test_decode_acknowledgements_unanswered() {
        let mut decoder = TelnetDecoder::default();
        let (data, replies) = decoder.decode(&[IAC, WONT, 1, IAC, DONT, 3]);
        assert!(data.is_empty());
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn test_refused_connect_maps_to_connection_refused() {
        // Bind a listener, take its port, then drop it so nothing answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TelnetTransport::connect("127.0.0.1", port, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_connection_refused(), "got {err:?}");
    }
}

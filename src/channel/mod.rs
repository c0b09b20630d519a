//! Channel layer: output buffering, prompt detection, pagination handling.
//!
//! This module owns the low-level contract a device session must satisfy
//! ([`SessionChannel`]) and the paginated output reader built on top of it.

mod buffer;
mod paging;

pub use buffer::PatternBuffer;
pub use paging::{PagingProfile, read_paged};

use std::future::Future;

use regex::bytes::Regex;

use crate::error::Result;

/// Low-level I/O contract of an open device session.
///
/// The paginated reader and everything above it depend only on this trait,
/// not on a specific protocol implementation.
pub trait SessionChannel: Send {
    /// Probe the device for its current prompt line.
    fn find_prompt(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Send one command and read until `expect` matches the output tail.
    ///
    /// Returns the captured output with the command echo removed and the
    /// matched tail still present.
    fn send_expect(
        &mut self,
        command: &str,
        expect: &Regex,
    ) -> impl Future<Output = Result<String>> + Send;

    /// One raw channel read.
    ///
    /// Blocks until the device sends data; a read that produces nothing
    /// within the session's read timeout fails with
    /// [`ChannelError::ReadTimeout`](crate::error::ChannelError::ReadTimeout).
    fn read_channel(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Write raw data to the channel without waiting for anything.
    fn write_channel(&mut self, data: &str) -> impl Future<Output = Result<()>> + Send;
}

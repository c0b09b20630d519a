//! Paginated output reader.
//!
//! IOS pages long command output behind a `--More--` marker and expects a
//! space keystroke per page. Devices where `terminal length 0` is permitted
//! never paginate; this reader handles the ones where it is not.

use log::{debug, trace};
use regex::Regex as TextRegex;
use regex::bytes::Regex;

use super::SessionChannel;
use crate::error::{ChannelError, Result};

/// Device-specific pagination vocabulary.
///
/// Everything prone to device drift lives here so that callers of
/// [`read_paged`] never change when a device family needs different
/// constants.
#[derive(Debug, Clone)]
pub struct PagingProfile {
    /// Sentinel substring the pager prints when output is held.
    pub more_prompt: String,

    /// Erase sequences the pager injects at line starts when a page is
    /// advanced (backspace runs padded with spaces).
    pub erase_artifacts: TextRegex,

    /// Keystroke that advances the pager by one page.
    pub page_advance: String,
}

impl Default for PagingProfile {
    fn default() -> Self {
        Self {
            more_prompt: "--More--".to_string(),
            erase_artifacts: TextRegex::new(r"\s?\x08{9}\s{8}\x08{9}")
                .expect("static pattern compiles"),
            page_advance: " ".to_string(),
        }
    }
}

/// Issue `command` and return its complete output, absorbing pagination.
///
/// Sends the command expecting either the session prompt or the pagination
/// marker. A marker-free response is a single read, returned as captured.
/// Otherwise pages are pulled one continuation keystroke at a time until the
/// prompt shows up in the accumulated output or a read times out; the
/// timeout is a normal end-of-output condition. Marker text, erase artifacts
/// and the trailing prompt are removed from the result.
pub async fn read_paged<S>(session: &mut S, command: &str, paging: &PagingProfile) -> Result<String>
where
    S: SessionChannel + ?Sized,
{
    let prompt = session.find_prompt().await?;
    let expect = Regex::new(&format!(
        "{}|{}",
        regex::escape(&paging.more_prompt),
        regex::escape(&prompt)
    ))
    .map_err(ChannelError::InvalidPattern)?;

    let mut output = session.send_expect(command, &expect).await?;

    if !ends_with_marker(&output, &paging.more_prompt) {
        // Single read: the prompt arrived in one piece
        strip_prompt_tail(&mut output, &prompt);
        return Ok(output);
    }

    debug!("output of '{}' is paginated", command);
    strip_marker_tail(&mut output, &paging.more_prompt);
    session.write_channel(&paging.page_advance).await?;

    loop {
        let page = match session.read_channel().await {
            Ok(page) => page,
            // A blocked read past the timeout means the device has nothing
            // further to show.
            Err(err) if err.is_read_timeout() => {
                trace!("pager read timed out, treating as end of output");
                break;
            }
            Err(err) => return Err(err),
        };

        output.push_str(&paging.erase_artifacts.replace_all(&page, ""));

        if page.contains(&paging.more_prompt) {
            strip_marker_tail(&mut output, &paging.more_prompt);
            session.write_channel(&paging.page_advance).await?;
        } else if output.contains(&prompt) {
            strip_prompt_tail(&mut output, &prompt);
            break;
        }
    }

    Ok(output)
}

/// Whether the page tail, ignoring trailing padding, ends at the pager marker.
fn ends_with_marker(page: &str, marker: &str) -> bool {
    page.trim_end_matches([' ', '\r', '\n', '\x08'])
        .ends_with(marker)
}

/// Drop the trailing pager marker and any control padding after it.
fn strip_marker_tail(output: &mut String, marker: &str) {
    if let Some(idx) = output.rfind(marker) {
        if output[idx + marker.len()..]
            .trim_matches([' ', '\r', '\n', '\x08'])
            .is_empty()
        {
            output.truncate(idx);
        }
    }
}

/// Drop the trailing prompt line once the device is done paging.
fn strip_prompt_tail(output: &mut String, prompt: &str) {
    if let Some(idx) = output.rfind(prompt) {
        if output[idx + prompt.len()..].trim().is_empty() {
            output.truncate(idx);
        }
    }
}

//! Neighbor discovery from topology advertisements.
//!
//! Switches announce themselves to directly connected peers over CDP; the
//! detailed neighbor report is the only source of crawl candidates.
//! Extraction is best-effort against loosely structured text: a block that
//! doesn't look like a neighbor entry is no neighbor, not an error.

use std::net::Ipv4Addr;

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::driver::DeviceSession;
use crate::error::Result;

/// Topology-advertisement command, fixed IOS vocabulary.
pub const DISCOVERY_COMMAND: &str = "sh cdp nei det";

/// Line separating per-neighbor blocks in the command output.
const BLOCK_SEPARATOR: &str = "-------------------------";

/// A `Device ID:` line followed one line later by an `IP address:` line,
/// the shape of a well-formed neighbor entry.
static NEIGHBOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Device ID: (.*?)\r?\n.*\r?\n.*?IP address: (.*?)\r?\n")
        .expect("static pattern compiles")
});

/// One discovered neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    /// The neighbor's advertised device identity.
    pub device_id: String,

    /// The neighbor's advertised management address.
    pub address: Ipv4Addr,
}

/// Fetch and parse the neighbor table of an open session.
pub async fn neighbors<S>(session: &mut S) -> Result<Vec<Neighbor>>
where
    S: DeviceSession + ?Sized,
{
    let output = session.execute(DISCOVERY_COMMAND).await?;
    Ok(parse_neighbors(&output))
}

/// Extract `(device id, address)` pairs in block order.
///
/// Blocks without the expected shape, and advertisements whose address is
/// not IPv4, are silently skipped — a leaf device with no neighbors and a
/// half-formed entry look the same from here.
pub fn parse_neighbors(output: &str) -> Vec<Neighbor> {
    let mut neighbors = Vec::new();

    for block in output.split(BLOCK_SEPARATOR) {
        let Some(captures) = NEIGHBOR_PATTERN.captures(block) else {
            continue;
        };

        let device_id = captures[1].trim().to_string();
        match captures[2].trim().parse::<Ipv4Addr>() {
            Ok(address) => neighbors.push(Neighbor { device_id, address }),
            Err(_) => trace!("skipping neighbor '{}': unusable address", device_id),
        }
    }

    neighbors
}

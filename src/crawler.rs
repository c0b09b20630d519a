//! Crawl orchestrator.
//!
//! Drives the traversal over devices discovered at runtime: a LIFO work
//! queue seeded with one address, a visited set consulted at pop time, and
//! a per-device fault boundary so one unreachable switch never aborts the
//! run. Traversal is depth-first by construction — neighbors are pushed and
//! the next pop takes a just-discovered neighbor, not a sibling of the seed.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

use crate::driver::{Connect, DeviceSession};
use crate::error::Result;
use crate::filter::AddressFilter;
use crate::{backup, discovery};

/// What a finished (or interrupted) crawl did.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    /// Addresses processed, in visit order.
    pub visited: Vec<Ipv4Addr>,

    /// Artifact files written, one per successful device.
    pub artifacts: Vec<PathBuf>,

    /// Devices that failed, with the rendered cause.
    pub failures: Vec<(Ipv4Addr, String)>,

    /// Whether the operator cut the run short.
    pub interrupted: bool,
}

/// Sequential crawler over a connector.
pub struct Crawler<C> {
    connector: C,
    backups_dir: PathBuf,
    filter: Option<AddressFilter>,
    interrupt: Arc<AtomicBool>,
}

impl<C: Connect> Crawler<C> {
    /// Create a crawler writing artifacts into `backups_dir`.
    pub fn new(connector: C, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            connector,
            backups_dir: backups_dir.into(),
            filter: None,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Supply the admission filter for discovered neighbors.
    ///
    /// Without a filter, neighbor discovery is disabled entirely and the
    /// crawl stops at the seed: following advertisements is opt-in.
    pub fn with_filter(mut self, filter: AddressFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Share an interrupt flag; when set, the crawl stops before the next
    /// device.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// Run the crawl from `seed` until the queue drains.
    pub async fn run(&self, seed: Ipv4Addr) -> CrawlSummary {
        let mut pending = vec![seed];
        let mut visited: HashSet<Ipv4Addr> = HashSet::new();
        let mut summary = CrawlSummary::default();

        while let Some(address) = pending.pop() {
            if self.interrupt.load(Ordering::Relaxed) {
                warn!("interrupted, abandoning {} queued address(es)", pending.len() + 1);
                summary.interrupted = true;
                break;
            }

            // An address enters the visited set exactly here, at pop time.
            // Duplicates may sit in the queue; they fall through this check
            // when their turn comes.
            if !visited.insert(address) {
                continue;
            }

            info!("working with {}", address);
            summary.visited.push(address);

            match self.visit(address, &mut pending).await {
                Ok(artifact) => summary.artifacts.push(artifact),
                Err(err) => {
                    error!("{}: {}", address, err);
                    summary.failures.push((address, err.to_string()));
                }
            }
        }

        summary
    }

    /// One device visit: open, back up, optionally discover, always release
    /// the session before the next queue pop.
    async fn visit(&self, address: Ipv4Addr, pending: &mut Vec<Ipv4Addr>) -> Result<PathBuf> {
        let mut session = self.connector.connect(address).await?;

        let outcome = self.backup_and_discover(&mut session, pending).await;

        if let Err(err) = session.close().await {
            warn!("{}: session close failed: {}", address, err);
        }

        outcome
    }

    async fn backup_and_discover(
        &self,
        session: &mut C::Session,
        pending: &mut Vec<Ipv4Addr>,
    ) -> Result<PathBuf> {
        let artifact = backup::write_backup(session, &self.backups_dir).await?;

        if let Some(filter) = &self.filter {
            for neighbor in discovery::neighbors(session).await? {
                if filter.admits(neighbor.address) {
                    // Pushed regardless of visited status; dedup happens at
                    // pop time.
                    debug!("queueing neighbor {} ({})", neighbor.device_id, neighbor.address);
                    pending.push(neighbor.address);
                } else {
                    debug!(
                        "neighbor {} ({}) rejected by filter",
                        neighbor.device_id, neighbor.address
                    );
                }
            }
        }

        Ok(artifact)
    }
}

//! Command-line entry point.
//!
//! Argument validation happens entirely before the crawl: a bad address,
//! filter entry or backups directory prints one diagnostic and exits
//! non-zero. Once the crawl is running, per-device failures are logged and
//! never terminate the process.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, bail};
use clap::Parser;
use log::{info, warn};

use confcrawl::config::{Credentials, SessionOptions};
use confcrawl::crawler::Crawler;
use confcrawl::driver::IosConnector;
use confcrawl::filter::AddressFilter;

/// Back up Cisco switch configurations over a CDP crawl.
#[derive(Parser, Debug)]
#[command(name = "confcrawl", version, about)]
struct Cli {
    /// Directory for saving device configuration artifacts
    #[arg(short, long)]
    backups_dir: PathBuf,

    /// IP address of the seed switch that needs to be backed up
    #[arg(short, long)]
    address: Ipv4Addr,

    /// Addresses/networks of neighboring switches to also back up,
    /// comma-separated (e.g. 192.168.1.1,192.168.1.0/24). Without this,
    /// neighbor discovery is disabled and only the seed is visited.
    #[arg(short, long, value_delimiter = ',')]
    include: Option<Vec<String>>,

    /// Name of the user to access the switches
    #[arg(short, long)]
    user: String,

    /// The user's password
    #[arg(short, long)]
    password: String,

    /// Password to enter privileged mode
    #[arg(short, long)]
    secret: String,

    /// Record raw per-device session transcripts in the backups directory
    #[arg(short, long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    ensure_writable_dir(&cli.backups_dir)?;

    let filter = match &cli.include {
        Some(entries) => Some(AddressFilter::parse(entries).context("invalid --include")?),
        None => None,
    };

    let mut options = SessionOptions::default();
    if cli.debug {
        options.transcript_dir = Some(cli.backups_dir.clone());
    }

    let credentials = Credentials::new(cli.user, cli.password, cli.secret);
    let connector = IosConnector::new(credentials, options);

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt requested, stopping after the current device");
                flag.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut crawler = Crawler::new(connector, cli.backups_dir).with_interrupt(interrupt);
    if let Some(filter) = filter {
        crawler = crawler.with_filter(filter);
    }

    let summary = crawler.run(cli.address).await;

    info!(
        "crawl finished: {} visited, {} backed up, {} failed",
        summary.visited.len(),
        summary.artifacts.len(),
        summary.failures.len()
    );

    Ok(())
}

/// The backups directory must exist and accept writes before any device is
/// touched.
fn ensure_writable_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        bail!("'{}' is not a valid directory", dir.display());
    }

    let probe = dir.join(".confcrawl-write-probe");
    std::fs::write(&probe, b"")
        .with_context(|| format!("'{}' is not a writable directory", dir.display()))?;
    let _ = std::fs::remove_file(&probe);

    Ok(())
}

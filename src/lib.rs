//! # Confcrawl
//!
//! CDP-walking configuration backup tool for Cisco IOS switches.
//!
//! Starting from one seed address, confcrawl opens an interactive session to
//! each switch (Telnet first, SSH on refusal), saves its running
//! configuration, VLAN table and version info to a timestamped artifact file,
//! then walks the CDP neighbor table to discover further switches. Discovered
//! addresses are admitted through a configurable address filter before they
//! enter the work queue; without a filter the crawl stops at the seed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! use confcrawl::config::{Credentials, SessionOptions};
//! use confcrawl::crawler::Crawler;
//! use confcrawl::driver::IosConnector;
//! use confcrawl::filter::AddressFilter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), confcrawl::Error> {
//!     let credentials = Credentials::new("admin", "secret", "enable-secret");
//!     let connector = IosConnector::new(credentials, SessionOptions::default());
//!     let filter = AddressFilter::parse(["10.0.0.0/24"])?;
//!
//!     let crawler = Crawler::new(connector, PathBuf::from("./backups"))
//!         .with_filter(filter)
//!         .with_interrupt(Arc::new(AtomicBool::new(false)));
//!
//!     let summary = crawler.run("10.0.0.1".parse().unwrap()).await;
//!     println!("{} devices backed up", summary.artifacts.len());
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod channel;
pub mod config;
pub mod crawler;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod filter;
pub mod transport;

// Re-export main types for convenience
pub use channel::PagingProfile;
pub use config::{Credentials, SessionOptions};
pub use crawler::{CrawlSummary, Crawler};
pub use driver::{Connect, DeviceSession, IosConnector, IosSession, SessionChannel};
pub use error::Error;
pub use filter::AddressFilter;

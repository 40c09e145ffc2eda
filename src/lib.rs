//! feodo_pipeline library: C2 blocklist fetch and enrichment
//!
//! Two sequential, run-to-completion stages over the abuse.ch Feodo Tracker
//! aggressive IP blocklist:
//!
//! - [`run_fetch`] downloads the feed, strips its banner lines, and writes a
//!   dated snapshot plus a stable `latest_feodo_aggressive.csv` copy.
//! - [`run_enrich`] reads a normalized blocklist CSV and writes an enriched
//!   copy with geolocation, ASN, port-service, and lifespan columns, using a
//!   persistent JSON cache to avoid re-querying known IPs.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use feodo_pipeline::config::EnrichConfig;
//! use feodo_pipeline::run_enrich;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EnrichConfig::parse_from([
//!     "enrich", "-i", "data/latest_feodo_aggressive.csv", "-o", "data/enriched.csv",
//! ]);
//! let report = run_enrich(&config, chrono::Utc::now().date_naive()).await?;
//! println!("Enriched {} rows ({} skipped)", report.rows_processed, report.rows_skipped);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod enrich;
pub mod geo;
pub mod initialization;

mod error_handling;
mod fetch;
mod models;

// Re-export public API
pub use enrich::{run_enrich, EnrichReport};
pub use error_handling::{EnrichError, FetchError, RowError, SkipStats};
pub use fetch::{run_fetch, FetchReport};
pub use models::{BlocklistRecord, ColumnIndex, EnrichedRecord};

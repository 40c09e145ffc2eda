//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `feodo_pipeline` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use feodo_pipeline::config::{EnrichConfig, FetchConfig};
use feodo_pipeline::initialization::init_logger_with;
use feodo_pipeline::{run_enrich, run_fetch};

#[derive(Debug, Parser)]
#[command(
    name = "feodo_pipeline",
    about = "Fetches and enriches the Feodo Tracker C2 IP blocklist.",
    version
)]
enum Cli {
    /// Download the latest blocklist and write normalized CSV artifacts
    #[command(name = "fetch")]
    Fetch(FetchConfig),

    /// Enrich a blocklist CSV with geolocation, ASN, service, and lifespan
    #[command(name = "enrich")]
    Enrich(EnrichConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse() {
        Cli::Fetch(config) => {
            init_logger_with(config.log_level.clone().into(), config.log_format.clone())
                .context("Failed to initialize logger")?;

            match run_fetch(&config).await {
                Ok(report) => {
                    println!(
                        "✅ Downloaded {} bytes, wrote {} row{} ({} skipped)",
                        report.bytes_downloaded,
                        report.rows_written,
                        if report.rows_written == 1 { "" } else { "s" },
                        report.lines_skipped
                    );
                    println!(
                        "Snapshot: {}\nLatest:   {}",
                        report.snapshot_path.display(),
                        report.latest_path.display()
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("feodo_pipeline error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Cli::Enrich(config) => {
            init_logger_with(config.log_level.clone().into(), config.log_format.clone())
                .context("Failed to initialize logger")?;

            // Injected here, at the outermost boundary, so the library stays clock-free
            let today = chrono::Utc::now().date_naive();

            match run_enrich(&config, today).await {
                Ok(report) => {
                    println!(
                        "✅ Enriched {} row{} ({} skipped); cache: {} hit(s), {} miss(es), {} unresolved IP(s)",
                        report.rows_processed,
                        if report.rows_processed == 1 { "" } else { "s" },
                        report.rows_skipped,
                        report.cache_hits,
                        report.cache_misses,
                        report.unresolved_ips
                    );
                    println!("Results saved in {}", report.output_path.display());
                    Ok(())
                }
                Err(e) => {
                    eprintln!("feodo_pipeline error: {:#}", e);
                    process::exit(1);
                }
            }
        }
    }
}

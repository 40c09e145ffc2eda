//! The enrichment pipeline: blocklist CSV in, enriched CSV out.
//!
//! Sequential and run-to-completion. Row defects are counted and skipped,
//! geo lookup failures degrade to "unknown" fields, and only file-system
//! problems abort the run.

pub mod lifespan;
pub mod service;

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::config::{EnrichConfig, BLOCKLIST_COLUMNS, ENRICHED_COLUMNS};
use crate::error_handling::{EnrichError, SkipStats};
use crate::geo;
use crate::geo::cache::GeoCache;
use crate::geo::types::GeoStatus;
use crate::initialization::init_client;
use crate::models::{BlocklistRecord, ColumnIndex, EnrichedRecord};
use lifespan::lifespan_days;
use service::service_name;

/// Results of an enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichReport {
    /// Rows accepted, enriched, and written to the output.
    pub rows_processed: usize,
    /// Rows rejected for row-level defects (counted per reason in the log).
    pub rows_skipped: usize,
    /// Distinct IPs already present in the cache before this run.
    pub cache_hits: usize,
    /// Distinct IPs that had to be queried this run.
    pub cache_misses: usize,
    /// Distinct IPs still without geo data after the run.
    pub unresolved_ips: usize,
    /// Where the enriched CSV was written.
    pub output_path: PathBuf,
}

/// Runs the enricher: reads `config.input`, writes `config.output`.
///
/// `today` is the reference date for lifespans of still-online servers;
/// callers inject it (the CLI passes the current UTC date) so results are
/// reproducible under test.
///
/// # Errors
///
/// Fails only on file-system or CSV-structure problems: unreadable input,
/// missing required columns, or an unwritable output. Geo lookup failures
/// never propagate.
pub async fn run_enrich(
    config: &EnrichConfig,
    today: NaiveDate,
) -> Result<EnrichReport, EnrichError> {
    info!("Reading blocklist from {}", config.input.display());

    // flexible: rows with the wrong field count are our problem to count,
    // not the reader's to reject
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&config.input)?;

    let columns = ColumnIndex::from_headers(reader.headers()?)
        .map_err(|col| EnrichError::Format(format!("missing required column '{col}'")))?;

    let stats = SkipStats::new();
    let mut rows: Vec<(BlocklistRecord, i64)> = Vec::new();

    for result in reader.records() {
        let record = result?;
        let parsed = match BlocklistRecord::parse(&record, &columns) {
            Ok(parsed) => parsed,
            Err(reason) => {
                debug!("Skipping row ({}): {:?}", reason.as_str(), record);
                stats.increment(reason);
                continue;
            }
        };
        let days = match lifespan_days(&parsed, today) {
            Ok(days) => days,
            Err(reason) => {
                debug!("Skipping row ({}): {:?}", reason.as_str(), record);
                stats.increment(reason);
                continue;
            }
        };
        rows.push((parsed, days));
    }

    // Distinct IPs, sorted so batch composition is stable across runs
    let distinct_ips: BTreeSet<String> = rows.iter().map(|(r, _)| r.ip.to_string()).collect();

    let mut cache = GeoCache::load(&config.cache);
    // Snapshot of pre-run membership; the lookup below mutates the cache
    let known: BTreeSet<String> = distinct_ips
        .iter()
        .filter(|ip| cache.contains(ip))
        .cloned()
        .collect();
    let to_query: Vec<String> = distinct_ips
        .iter()
        .filter(|ip| !known.contains(*ip))
        .cloned()
        .collect();
    let cache_misses = to_query.len();
    let cache_hits = known.len();

    if !to_query.is_empty() {
        info!(
            "Looking up {} new IP(s) ({} cached) via {}",
            cache_misses, cache_hits, config.geo_url
        );
        let client = init_client(config.timeout_seconds)?;
        geo::resolve_missing(
            &client,
            &config.geo_url,
            &to_query,
            config.batch_size,
            config.rpm,
            &mut cache,
        )
        .await;
    } else {
        info!("All {} IP(s) served from cache", distinct_ips.len());
    }

    // Per-IP outcome of this run's lookups
    let mut hits = 0usize;
    let mut resolved = 0usize;
    let mut unresolved_ips = 0usize;
    for ip in &distinct_ips {
        let outcome = match cache.get(ip) {
            Some(g) if g.resolved && known.contains(ip) => GeoStatus::Hit,
            Some(g) if g.resolved => GeoStatus::Resolved,
            _ => GeoStatus::Unresolved,
        };
        match outcome {
            GeoStatus::Hit => hits += 1,
            GeoStatus::Resolved => resolved += 1,
            GeoStatus::Unresolved => unresolved_ips += 1,
        }
    }
    debug!(
        "Geo outcomes: {} hit, {} newly resolved, {} unresolved",
        hits, resolved, unresolved_ips
    );

    let mut writer = csv::Writer::from_path(&config.output)?;
    let header: Vec<&str> = BLOCKLIST_COLUMNS
        .iter()
        .chain(ENRICHED_COLUMNS.iter())
        .copied()
        .collect();
    writer.write_record(&header)?;

    let rows_processed = rows.len();
    for (record, days) in rows {
        let geo_record = cache.get(&record.ip.to_string()).cloned();
        let service = service_name(record.port);
        let enriched = EnrichedRecord::new(record, geo_record.as_ref(), service, days);
        writer.write_record(enriched.csv_fields())?;
    }
    writer.flush()?;

    // The enriched CSV is the product; a stale cache only costs lookups
    if let Err(e) = cache.save(&config.cache) {
        warn!("Could not persist geo cache to {}: {e:#}", config.cache.display());
    }

    stats.log_summary();
    info!(
        "Enriched {} row(s), skipped {}, cache {}/{} hit/miss, {} unresolved IP(s)",
        rows_processed,
        stats.total(),
        cache_hits,
        cache_misses,
        unresolved_ips
    );

    Ok(EnrichReport {
        rows_processed,
        rows_skipped: stats.total(),
        cache_hits,
        cache_misses,
        unresolved_ips,
        output_path: config.output.clone(),
    })
}

//! Blocklist download and normalization.
//!
//! The Feodo Tracker feed is CSV wrapped in `#` banner lines, with the column
//! header itself commented out. This stage downloads the feed, recovers the
//! header, drops the banners, and writes a clean CSV twice: a dated snapshot
//! for audit and a stable `latest_feodo_aggressive.csv` pointer that the
//! enricher (and anything downstream) can always reference.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use tokio_retry::Retry;

use crate::config::{FetchConfig, BLOCKLIST_COLUMNS, LATEST_BLOCKLIST_FILE};
use crate::error_handling::{retry_strategy, FetchError};
use crate::initialization::init_client;
use crate::models::normalize_column;

/// Results of a fetch run.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Size of the downloaded feed in bytes.
    pub bytes_downloaded: usize,
    /// Data rows written to the normalized CSV.
    pub rows_written: usize,
    /// Data lines dropped for having the wrong column count.
    pub lines_skipped: usize,
    /// Dated, immutable snapshot.
    pub snapshot_path: PathBuf,
    /// Stable pointer, overwritten each run.
    pub latest_path: PathBuf,
}

/// The feed reduced to a validated header and its data rows.
#[derive(Debug)]
struct NormalizedBlocklist {
    header: Vec<String>,
    rows: Vec<csv::StringRecord>,
    skipped: usize,
}

/// Dated snapshot filename for a given day.
fn dated_filename(date: NaiveDate) -> String {
    format!("feodo_aggressive_{}.csv", date.format("%Y%m%d"))
}

/// Tries to read a line as the (possibly commented) column header.
fn parse_header(line: &str) -> Option<Vec<String>> {
    let candidate = line.trim_start_matches('#').trim();
    let names: Vec<String> = candidate.split(',').map(|c| normalize_column(c)).collect();
    if names.len() == BLOCKLIST_COLUMNS.len() {
        Some(names)
    } else {
        None
    }
}

/// Strips banners, recovers the header, and validates data rows.
///
/// Fails with a format error when the header is absent or carries unexpected
/// column names; data rows with the wrong column count are dropped and
/// counted, not fatal.
fn normalize_blocklist(text: &str) -> Result<NormalizedBlocklist, FetchError> {
    let mut header: Option<Vec<String>> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            // The real header hides among the banner lines; a banner line
            // only qualifies if it splits into exactly the expected columns
            if header.is_none() {
                if let Some(names) = parse_header(trimmed) {
                    if names.iter().map(String::as_str).eq(BLOCKLIST_COLUMNS.iter().copied()) {
                        header = Some(names);
                    }
                }
            }
            continue;
        }
        if header.is_none() {
            // Some mirrors serve the feed with an uncommented header
            match parse_header(trimmed) {
                Some(names)
                    if names.iter().map(String::as_str).eq(BLOCKLIST_COLUMNS.iter().copied()) =>
                {
                    header = Some(names);
                    continue;
                }
                _ => {
                    return Err(FetchError::Format(
                        "data rows start before any recognizable column header".to_string(),
                    ))
                }
            }
        }
        data_lines.push(line);
    }

    let header = header.ok_or_else(|| {
        FetchError::Format(format!(
            "column header not found; expected columns: {}",
            BLOCKLIST_COLUMNS.join(",")
        ))
    })?;

    let data = data_lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        if record.len() == header.len() {
            rows.push(record);
        } else {
            skipped += 1;
        }
    }

    Ok(NormalizedBlocklist {
        header,
        rows,
        skipped,
    })
}

/// Downloads the feed, retrying transient failures with backoff.
async fn download(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    Retry::spawn(retry_strategy(), || async {
        client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    })
    .await
}

/// Runs the fetcher: downloads `config.url` and writes both artifacts into
/// `config.data_dir`.
///
/// # Errors
///
/// Fails on an unreachable source or non-success status (after retries), a
/// feed without a recognizable header, or an unwritable data directory.
pub async fn run_fetch(config: &FetchConfig) -> Result<FetchReport, FetchError> {
    let client = init_client(config.timeout_seconds)?;

    info!("Downloading blocklist from {}", config.url);
    let text = download(&client, &config.url).await?;
    let bytes_downloaded = text.len();
    info!("Downloaded {} bytes", bytes_downloaded);

    let normalized = normalize_blocklist(&text)?;
    if normalized.skipped > 0 {
        warn!(
            "Dropped {} malformed data line(s) from the feed",
            normalized.skipped
        );
    }

    std::fs::create_dir_all(&config.data_dir)?;
    let snapshot_path = config
        .data_dir
        .join(dated_filename(Utc::now().date_naive()));
    let latest_path = config.data_dir.join(LATEST_BLOCKLIST_FILE);

    let mut writer = csv::Writer::from_path(&snapshot_path)?;
    writer.write_record(&normalized.header)?;
    for row in &normalized.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    std::fs::copy(&snapshot_path, &latest_path)?;
    info!(
        "Wrote {} row(s) to {} and {}",
        normalized.rows.len(),
        snapshot_path.display(),
        latest_path.display()
    );

    Ok(FetchReport {
        bytes_downloaded,
        rows_written: normalized.rows.len(),
        lines_skipped: normalized.skipped,
        snapshot_path,
        latest_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
################################################################
# abuse.ch Feodo Tracker Botnet C2 IP Blocklist (CSV)          #
# Last updated: 2024-05-01 00:00:00 UTC                        #
################################################################
#
# first_seen_utc,dst_ip,dst_port,c2_status,last_online,malware
2024-01-01 00:00:00,1.2.3.4,443,offline,2024-01-10,Dridex
2024-02-15 08:30:00,5.6.7.8,8080,online,,QakBot
";

    #[test]
    fn test_normalize_recovers_commented_header() {
        let normalized = normalize_blocklist(FEED).unwrap();
        assert_eq!(
            normalized.header,
            BLOCKLIST_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
        );
        assert_eq!(normalized.rows.len(), 2);
        assert_eq!(normalized.skipped, 0);
        assert_eq!(normalized.rows[0].get(1), Some("1.2.3.4"));
    }

    #[test]
    fn test_normalize_accepts_uncommented_header() {
        let feed = "first_seen_utc,dst_ip,dst_port,c2_status,last_online,malware\n\
                    2024-01-01 00:00:00,1.2.3.4,443,online,,Dridex\n";
        let normalized = normalize_blocklist(feed).unwrap();
        assert_eq!(normalized.rows.len(), 1);
    }

    #[test]
    fn test_normalize_skips_short_rows() {
        let feed = "# first_seen_utc,dst_ip,dst_port,c2_status,last_online,malware\n\
                    2024-01-01 00:00:00,1.2.3.4,443,online,,Dridex\n\
                    1.2.3.4,443\n";
        let normalized = normalize_blocklist(feed).unwrap();
        assert_eq!(normalized.rows.len(), 1);
        assert_eq!(normalized.skipped, 1);
    }

    #[test]
    fn test_normalize_missing_header_is_format_error() {
        let feed = "# just a banner\n# another banner\n";
        let err = normalize_blocklist(feed).unwrap_err();
        assert!(matches!(err, FetchError::Format(_)));
    }

    #[test]
    fn test_normalize_data_before_header_is_format_error() {
        let feed = "2024-01-01 00:00:00,1.2.3.4,443,online,,Dridex\n";
        let err = normalize_blocklist(feed).unwrap_err();
        assert!(matches!(err, FetchError::Format(_)));
    }

    #[test]
    fn test_dated_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(dated_filename(date), "feodo_aggressive_20240501.csv");
    }
}

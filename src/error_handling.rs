use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::info;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;
use tokio_retry::strategy::ExponentialBackoff;

/// Error types for blocklist download and normalization failures.
///
/// These are fatal to a `fetch` run: without a complete, well-formed feed
/// there is nothing meaningful to write.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Source unreachable or non-success HTTP status.
    #[error("Blocklist download error: {0}")]
    Network(#[from] reqwest::Error),

    /// Feed structure is not what we expect (header missing or malformed).
    #[error("Blocklist format error: {0}")]
    Format(String),

    /// Could not write an output artifact.
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for FetchError {
    fn from(e: csv::Error) -> Self {
        // Writer errors are really I/O; anything else is feed structure
        match e.into_kind() {
            csv::ErrorKind::Io(io) => FetchError::Io(io),
            other => FetchError::Format(format!("{other:?}")),
        }
    }
}

/// Error types for fatal enrichment failures.
///
/// Geo lookup failures are deliberately absent: those degrade per-IP to
/// "unknown" fields and never abort the run.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Could not read the input or write the output file.
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level failure (missing header, unreadable stream).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input file structure is not a blocklist CSV.
    #[error("Input format error: {0}")]
    Format(String),

    /// HTTP client could not be constructed.
    #[error("HTTP client initialization error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Reasons a single input row can be rejected.
///
/// Row-level problems are counted and skipped, never fatal to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RowError {
    ColumnCount,
    InvalidIp,
    InvalidPort,
    InvalidFirstSeen,
    InvalidLastOnline,
    NegativeLifespan,
}

impl RowError {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowError::ColumnCount => "wrong column count",
            RowError::InvalidIp => "unparseable IP address",
            RowError::InvalidPort => "invalid port",
            RowError::InvalidFirstSeen => "unparseable first_seen timestamp",
            RowError::InvalidLastOnline => "unparseable last_online date",
            RowError::NegativeLifespan => "last_online predates first_seen",
        }
    }
}

/// Per-reason counters for skipped rows.
///
/// All reasons are initialized to zero on creation, so lookups never miss.
pub struct SkipStats {
    skips: HashMap<RowError, AtomicUsize>,
}

impl SkipStats {
    pub fn new() -> Self {
        let mut skips = HashMap::new();
        for reason in RowError::iter() {
            skips.insert(reason, AtomicUsize::new(0));
        }
        SkipStats { skips }
    }

    pub fn increment(&self, reason: RowError) {
        // All RowError variants are initialized in new(), so unwrap() is safe
        self.skips
            .get(&reason)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self, reason: RowError) -> usize {
        // All RowError variants are initialized in new(), so unwrap() is safe
        self.skips.get(&reason).unwrap().load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        RowError::iter().map(|r| self.get_count(r)).sum()
    }

    /// Logs non-zero skip counts, one line per reason.
    pub fn log_summary(&self) {
        for reason in RowError::iter() {
            let count = self.get_count(reason);
            if count > 0 {
                info!("Skipped {} row(s): {}", count, reason.as_str());
            }
        }
    }
}

impl Default for SkipStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an exponential backoff retry strategy for the blocklist download.
///
/// Initial delay `RETRY_INITIAL_DELAY_MS`, doubled each attempt, capped at
/// `RETRY_MAX_DELAY_SECS`, at most `RETRY_MAX_ATTEMPTS` attempts total.
pub fn retry_strategy() -> std::iter::Take<ExponentialBackoff> {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(crate::config::RETRY_MAX_ATTEMPTS - 1)
}

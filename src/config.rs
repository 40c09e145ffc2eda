use std::path::PathBuf;

use clap::{Parser, ValueEnum};

// constants (used as defaults)

/// Feodo Tracker aggressive IP blocklist (all known C2 servers, online or not).
pub const BLOCKLIST_URL: &str =
    "https://feodotracker.abuse.ch/downloads/ipblocklist_aggressive.csv";

/// ip-api.com batch endpoint. Free tier: up to 100 IPs per request, ~45 requests/min.
pub const GEO_API_URL: &str = "http://ip-api.com/batch";

/// Response fields requested from ip-api. Keeping the list short keeps the
/// cache file small and avoids fields we never write out.
pub const GEO_API_FIELDS: &str = "status,message,country,as,org,query";

/// Default directory for downloaded and enriched artifacts.
pub const DATA_DIR: &str = "./data";

/// Stable-named copy of the most recent blocklist download.
pub const LATEST_BLOCKLIST_FILE: &str = "latest_feodo_aggressive.csv";

/// Default location of the IP geolocation cache.
pub const GEO_CACHE_PATH: &str = "./data/ip_geo_cache.json";

/// HTTP timeout in seconds (blocklist download and geo lookups).
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Maximum IPs per geo lookup request (ip-api free-tier batch limit).
pub const GEO_BATCH_SIZE: usize = 100;

/// Geo lookup requests per minute. The free tier allows ~45; stay under it.
pub const GEO_REQUESTS_PER_MINUTE: u32 = 40;

// Retry strategy for the blocklist download
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 20;
/// Total download attempts (1 initial + retries)
pub const RETRY_MAX_ATTEMPTS: usize = 3;

/// Expected (normalized) columns of the blocklist feed, in order.
pub const BLOCKLIST_COLUMNS: &[&str] = &[
    "first_seen_utc",
    "dst_ip",
    "dst_port",
    "c2_status",
    "last_online",
    "malware",
];

/// Columns appended to each row by the enricher, in order.
pub const ENRICHED_COLUMNS: &[&str] = &["country", "asn", "asn_org", "service", "lifespan_days"];

/// Value written for geo fields that could not be resolved.
pub const UNKNOWN: &str = "unknown";

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Options for the `fetch` subcommand.
///
/// Downloads the blocklist and writes a dated snapshot plus a stable
/// `latest_feodo_aggressive.csv` pointer into the data directory.
#[derive(Debug, Parser)]
pub struct FetchConfig {
    /// Blocklist source URL
    #[arg(long, default_value = BLOCKLIST_URL)]
    pub url: String,

    /// Directory for downloaded artifacts
    #[arg(long, value_parser, default_value = DATA_DIR)]
    pub data_dir: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Options for the `enrich` subcommand.
///
/// Reads a normalized blocklist CSV and writes an enriched copy with
/// geolocation, ASN, service name, and lifespan columns appended.
#[derive(Debug, Parser)]
pub struct EnrichConfig {
    /// Path to input CSV (e.g. latest_feodo_aggressive.csv)
    #[arg(short, long, value_parser)]
    pub input: PathBuf,

    /// Path to write the enriched CSV
    #[arg(short, long, value_parser)]
    pub output: PathBuf,

    /// Path to the IP geolocation cache JSON
    #[arg(long, value_parser, default_value = GEO_CACHE_PATH)]
    pub cache: PathBuf,

    /// Geolocation batch endpoint URL
    #[arg(long, default_value = GEO_API_URL)]
    pub geo_url: String,

    /// IPs per geolocation request (ip-api allows up to 100)
    #[arg(long, default_value_t = GEO_BATCH_SIZE)]
    pub batch_size: usize,

    /// Geolocation requests per minute (free tier allows ~45)
    #[arg(long, default_value_t = GEO_REQUESTS_PER_MINUTE)]
    pub rpm: u32,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

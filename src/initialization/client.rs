//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

/// User-Agent sent to the blocklist provider and the geolocation service.
const USER_AGENT: &str = concat!("feodo_pipeline/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client with an explicit timeout.
///
/// Neither collaborator specifies a timeout of its own, so every request gets
/// a hard cap; expiry is handled as a lookup failure by the caller.
pub fn init_client(timeout_seconds: u64) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
}

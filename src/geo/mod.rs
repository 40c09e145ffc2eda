//! Batched geolocation/ASN lookups via ip-api.com.
//!
//! The batch endpoint takes a JSON array of `{"query": "<ip>"}` objects, up
//! to 100 per request on the free tier. Between requests we sleep to stay
//! inside the requests-per-minute allowance; the service has no auth and
//! bans callers that exceed it.

pub mod cache;
pub mod types;

use std::time::Duration;

use log::{debug, warn};
use serde_json::json;

use crate::config::GEO_API_FIELDS;
use cache::GeoCache;
use types::{GeoApiReply, GeoRecord};

/// Issues one batch request for up to `batch_size` IPs.
async fn batch_lookup(
    client: &reqwest::Client,
    geo_url: &str,
    ips: &[String],
) -> Result<Vec<GeoApiReply>, reqwest::Error> {
    let payload: Vec<_> = ips.iter().map(|ip| json!({ "query": ip })).collect();

    let replies = client
        .post(geo_url)
        .query(&[("fields", GEO_API_FIELDS)])
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<GeoApiReply>>()
        .await?;

    Ok(replies)
}

/// Resolves all `ips` through the batch endpoint and merges results into the
/// cache.
///
/// Per-IP "fail" replies are cached as unresolved so later runs do not retry
/// them. A failed batch request (network error, bad status, timeout) leaves
/// its IPs out of the cache entirely: the current run degrades them to
/// "unknown" and a later run will try again. Never fatal. The cache is the
/// single source of truth for per-IP outcomes; callers read it back rather
/// than getting a second count from here.
pub async fn resolve_missing(
    client: &reqwest::Client,
    geo_url: &str,
    ips: &[String],
    batch_size: usize,
    rpm: u32,
    cache: &mut GeoCache,
) {
    let batch_size = batch_size.max(1);
    let pause = Duration::from_secs_f64(60.0 / rpm.max(1) as f64);

    let mut chunks = ips.chunks(batch_size).peekable();
    while let Some(chunk) = chunks.next() {
        match batch_lookup(client, geo_url, chunk).await {
            Ok(replies) => {
                for reply in &replies {
                    let record = GeoRecord::from(reply);
                    if !record.resolved {
                        debug!(
                            "No geo data for {}: {}",
                            reply.query,
                            reply.message.as_deref().unwrap_or("no reason given")
                        );
                    }
                    cache.insert(reply.query.clone(), record);
                }
            }
            Err(e) => {
                warn!(
                    "Geo lookup failed for a batch of {} IP(s): {e}. \
                     Continuing with \"unknown\" fields.",
                    chunk.len()
                );
            }
        }

        // Self-throttle between batches, but not after the last one
        if chunks.peek().is_some() {
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::init_client;

    #[tokio::test]
    async fn test_unreachable_endpoint_leaves_ips_uncached() {
        let client = init_client(1).unwrap();
        let mut cache = GeoCache::default();
        let ips = vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()];

        // Port 9 (discard) refuses connections on any sane host
        resolve_missing(
            &client,
            "http://127.0.0.1:9/batch",
            &ips,
            100,
            600,
            &mut cache,
        )
        .await;

        // Transport failure: nothing cached, so both IPs read as unresolved
        assert!(cache.is_empty());
        assert!(ips.iter().all(|ip| cache.get(ip).is_none()));
    }

    #[tokio::test]
    async fn test_no_ips_means_no_requests() {
        let client = init_client(1).unwrap();
        let mut cache = GeoCache::default();

        resolve_missing(&client, "http://127.0.0.1:9/batch", &[], 100, 600, &mut cache).await;

        assert!(cache.is_empty());
    }
}

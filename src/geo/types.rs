//! Geolocation data structures.

use serde::{Deserialize, Serialize};

/// Cached geolocation/ASN data for one IP.
///
/// `resolved` records the service's verdict explicitly: an entry with
/// `resolved = false` means the service answered but had no data for the IP,
/// and we will not ask again on later runs. Sentinel strings ("unknown") only
/// appear at CSV-write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoRecord {
    /// Country name, if the service knew it.
    pub country: Option<String>,
    /// ASN identifier (e.g. "AS15169").
    pub asn: Option<String>,
    /// Organization owning the AS.
    pub asn_org: Option<String>,
    /// Whether the lookup service returned data for this IP.
    pub resolved: bool,
}

impl GeoRecord {
    /// Entry for an IP the service answered "fail" for.
    pub fn unresolved() -> Self {
        GeoRecord {
            country: None,
            asn: None,
            asn_org: None,
            resolved: false,
        }
    }
}

/// Outcome of the geo lookup for one IP within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoStatus {
    /// Already present in the cache before this run.
    Hit,
    /// Queried this run and resolved.
    Resolved,
    /// Queried this run, no data (per-IP failure or batch request failure).
    Unresolved,
}

/// One element of an ip-api.com batch response.
///
/// Field names follow the service's JSON; `as` is "AS<number> <org name>".
#[derive(Debug, Deserialize)]
pub struct GeoApiReply {
    /// "success" or "fail".
    pub status: String,
    /// Failure reason, present when `status` is "fail".
    #[serde(default)]
    pub message: Option<String>,
    /// Country name.
    #[serde(default)]
    pub country: Option<String>,
    /// AS number and organization, space-separated.
    #[serde(rename = "as", default)]
    pub asn: Option<String>,
    /// Organization name.
    #[serde(default)]
    pub org: Option<String>,
    /// The IP the reply is for (echoed back by the service).
    pub query: String,
}

impl From<&GeoApiReply> for GeoRecord {
    fn from(reply: &GeoApiReply) -> Self {
        if reply.status != "success" {
            return GeoRecord::unresolved();
        }

        // "AS15169 Google LLC" -> asn "AS15169", remainder usable as org fallback
        let (asn, asn_from_remainder) = match reply.asn.as_deref() {
            Some(s) if !s.is_empty() => {
                let mut parts = s.splitn(2, ' ');
                let number = parts.next().map(str::to_string);
                let remainder = parts.next().filter(|r| !r.is_empty()).map(str::to_string);
                (number, remainder)
            }
            _ => (None, None),
        };

        let asn_org = reply
            .org
            .clone()
            .filter(|o| !o.is_empty())
            .or(asn_from_remainder);

        GeoRecord {
            country: reply.country.clone().filter(|c| !c.is_empty()),
            asn,
            asn_org,
            resolved: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_reply_splits_asn() {
        let reply = GeoApiReply {
            status: "success".into(),
            message: None,
            country: Some("United States".into()),
            asn: Some("AS15169 Google LLC".into()),
            org: None,
            query: "8.8.8.8".into(),
        };
        let record = GeoRecord::from(&reply);
        assert!(record.resolved);
        assert_eq!(record.country.as_deref(), Some("United States"));
        assert_eq!(record.asn.as_deref(), Some("AS15169"));
        // No org field, so the remainder of "as" is used
        assert_eq!(record.asn_org.as_deref(), Some("Google LLC"));
    }

    #[test]
    fn test_org_field_preferred_over_as_remainder() {
        let reply = GeoApiReply {
            status: "success".into(),
            message: None,
            country: Some("United States".into()),
            asn: Some("AS15169 Google LLC".into()),
            org: Some("Google Public DNS".into()),
            query: "8.8.8.8".into(),
        };
        let record = GeoRecord::from(&reply);
        assert_eq!(record.asn_org.as_deref(), Some("Google Public DNS"));
    }

    #[test]
    fn test_fail_reply_is_unresolved() {
        let reply = GeoApiReply {
            status: "fail".into(),
            message: Some("private range".into()),
            country: None,
            asn: None,
            org: None,
            query: "10.0.0.1".into(),
        };
        let record = GeoRecord::from(&reply);
        assert!(!record.resolved);
        assert!(record.country.is_none());
    }

    #[test]
    fn test_empty_fields_become_none() {
        let reply = GeoApiReply {
            status: "success".into(),
            message: None,
            country: Some(String::new()),
            asn: Some(String::new()),
            org: Some(String::new()),
            query: "1.2.3.4".into(),
        };
        let record = GeoRecord::from(&reply);
        assert!(record.resolved);
        assert!(record.country.is_none());
        assert!(record.asn.is_none());
        assert!(record.asn_org.is_none());
    }
}

//! Record types for the blocklist feed and the enriched output.

use std::net::Ipv4Addr;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::config::{BLOCKLIST_COLUMNS, UNKNOWN};
use crate::error_handling::RowError;
use crate::geo::types::GeoRecord;

/// Timestamp format used by the feed's `first_seen_utc` column.
const FIRST_SEEN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Date format used by the feed's `last_online` column.
const LAST_ONLINE_FORMAT: &str = "%Y-%m-%d";

/// Normalizes a feed column name: trim, lowercase, spaces/dashes to underscores.
pub(crate) fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Positions of the expected columns within an input CSV header.
///
/// Built once per file so row parsing is just indexed access; tolerates
/// reordered or extra columns as long as the expected ones are present.
#[derive(Debug, Clone, Copy)]
pub struct ColumnIndex {
    first_seen: usize,
    ip: usize,
    port: usize,
    c2_status: usize,
    last_online: usize,
    malware: usize,
    width: usize,
}

impl ColumnIndex {
    /// Locates each expected column in `headers`.
    ///
    /// Returns the name of the first missing column on failure.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, String> {
        let normalized: Vec<String> = headers.iter().map(normalize_column).collect();
        let find = |name: &str| -> Result<usize, String> {
            normalized
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| name.to_string())
        };

        Ok(ColumnIndex {
            first_seen: find(BLOCKLIST_COLUMNS[0])?,
            ip: find(BLOCKLIST_COLUMNS[1])?,
            port: find(BLOCKLIST_COLUMNS[2])?,
            c2_status: find(BLOCKLIST_COLUMNS[3])?,
            last_online: find(BLOCKLIST_COLUMNS[4])?,
            malware: find(BLOCKLIST_COLUMNS[5])?,
            width: headers.len(),
        })
    }
}

/// One validated row of the blocklist feed. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct BlocklistRecord {
    /// When the C2 server was first observed (UTC).
    pub first_seen: NaiveDateTime,
    /// C2 server address.
    pub ip: Ipv4Addr,
    /// C2 listener port.
    pub port: u16,
    /// Tracker status for the server (e.g. "online", "offline").
    pub c2_status: String,
    /// Last day the server was seen online; `None` means still ongoing.
    pub last_online: Option<NaiveDate>,
    /// Malware family operating the server.
    pub malware: String,
}

impl BlocklistRecord {
    /// Parses one CSV row, classifying any defect as a [`RowError`].
    pub fn parse(record: &StringRecord, columns: &ColumnIndex) -> Result<Self, RowError> {
        if record.len() != columns.width {
            return Err(RowError::ColumnCount);
        }

        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let first_seen = NaiveDateTime::parse_from_str(field(columns.first_seen), FIRST_SEEN_FORMAT)
            .map_err(|_| RowError::InvalidFirstSeen)?;

        let ip =
            Ipv4Addr::from_str(field(columns.ip)).map_err(|_| RowError::InvalidIp)?;

        let port = field(columns.port)
            .parse::<u16>()
            .map_err(|_| RowError::InvalidPort)?;

        let last_online = match field(columns.last_online) {
            "" => None,
            s => Some(
                NaiveDate::parse_from_str(s, LAST_ONLINE_FORMAT)
                    .map_err(|_| RowError::InvalidLastOnline)?,
            ),
        };

        Ok(BlocklistRecord {
            first_seen,
            ip,
            port,
            c2_status: field(columns.c2_status).to_string(),
            last_online,
            malware: field(columns.malware).to_string(),
        })
    }
}

/// A blocklist record plus the derived enrichment columns, ready to write.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    /// The source record.
    pub record: BlocklistRecord,
    /// Country of the C2 server, or "unknown".
    pub country: String,
    /// ASN identifier, or "unknown".
    pub asn: String,
    /// Organization owning the AS, or "unknown".
    pub asn_org: String,
    /// Service name for the port, or "uncommon".
    pub service: &'static str,
    /// Days between first_seen and last_online (or the injected today).
    pub lifespan_days: i64,
}

impl EnrichedRecord {
    /// Combines a record with its geo data (degrading absent or unresolved
    /// entries to "unknown"), service name, and lifespan.
    pub fn new(
        record: BlocklistRecord,
        geo: Option<&GeoRecord>,
        service: &'static str,
        lifespan_days: i64,
    ) -> Self {
        let unknown = || UNKNOWN.to_string();
        let (country, asn, asn_org) = match geo {
            Some(g) if g.resolved => (
                g.country.clone().unwrap_or_else(unknown),
                g.asn.clone().unwrap_or_else(unknown),
                g.asn_org.clone().unwrap_or_else(unknown),
            ),
            _ => (unknown(), unknown(), unknown()),
        };

        EnrichedRecord {
            record,
            country,
            asn,
            asn_org,
            service,
            lifespan_days,
        }
    }

    /// Output CSV fields, in `BLOCKLIST_COLUMNS` + `ENRICHED_COLUMNS` order.
    pub fn csv_fields(&self) -> Vec<String> {
        let r = &self.record;
        vec![
            r.first_seen.format(FIRST_SEEN_FORMAT).to_string(),
            r.ip.to_string(),
            r.port.to_string(),
            r.c2_status.clone(),
            r.last_online
                .map(|d| d.format(LAST_ONLINE_FORMAT).to_string())
                .unwrap_or_default(),
            r.malware.clone(),
            self.country.clone(),
            self.asn.clone(),
            self.asn_org.clone(),
            self.service.to_string(),
            self.lifespan_days.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_headers() -> StringRecord {
        StringRecord::from(BLOCKLIST_COLUMNS.to_vec())
    }

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_valid_row() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let record = BlocklistRecord::parse(
            &row(&["2024-01-01 00:00:00", "1.2.3.4", "443", "offline", "2024-01-10", "Dridex"]),
            &columns,
        )
        .unwrap();

        assert_eq!(record.ip, Ipv4Addr::new(1, 2, 3, 4));
        assert_eq!(record.port, 443);
        assert_eq!(record.malware, "Dridex");
        assert_eq!(
            record.last_online,
            Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
        );
    }

    #[test]
    fn test_parse_missing_last_online() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let record = BlocklistRecord::parse(
            &row(&["2024-01-01 00:00:00", "1.2.3.4", "443", "online", "", "Dridex"]),
            &columns,
        )
        .unwrap();
        assert!(record.last_online.is_none());
    }

    #[test]
    fn test_parse_bad_ip() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let err = BlocklistRecord::parse(
            &row(&["2024-01-01 00:00:00", "not-an-ip", "443", "online", "", "Dridex"]),
            &columns,
        )
        .unwrap_err();
        assert_eq!(err, RowError::InvalidIp);
    }

    #[test]
    fn test_parse_bad_port() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let err = BlocklistRecord::parse(
            &row(&["2024-01-01 00:00:00", "1.2.3.4", "99999", "online", "", "Dridex"]),
            &columns,
        )
        .unwrap_err();
        assert_eq!(err, RowError::InvalidPort);
    }

    #[test]
    fn test_parse_bad_first_seen() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let err = BlocklistRecord::parse(
            &row(&["soon", "1.2.3.4", "443", "online", "", "Dridex"]),
            &columns,
        )
        .unwrap_err();
        assert_eq!(err, RowError::InvalidFirstSeen);
    }

    #[test]
    fn test_parse_wrong_column_count() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let err = BlocklistRecord::parse(&row(&["2024-01-01 00:00:00", "1.2.3.4"]), &columns)
            .unwrap_err();
        assert_eq!(err, RowError::ColumnCount);
    }

    #[test]
    fn test_column_index_tolerates_reordering() {
        let headers = StringRecord::from(vec![
            "dst_ip",
            "dst_port",
            "malware",
            "first_seen_utc",
            "last_online",
            "c2_status",
        ]);
        let columns = ColumnIndex::from_headers(&headers).unwrap();
        let record = BlocklistRecord::parse(
            &row(&["1.2.3.4", "443", "Dridex", "2024-01-01 00:00:00", "", "online"]),
            &columns,
        )
        .unwrap();
        assert_eq!(record.port, 443);
        assert_eq!(record.malware, "Dridex");
    }

    #[test]
    fn test_column_index_missing_column() {
        let headers = StringRecord::from(vec!["dst_ip", "dst_port"]);
        let err = ColumnIndex::from_headers(&headers).unwrap_err();
        assert_eq!(err, "first_seen_utc");
    }

    #[test]
    fn test_unresolved_geo_degrades_to_unknown() {
        let columns = ColumnIndex::from_headers(&feed_headers()).unwrap();
        let record = BlocklistRecord::parse(
            &row(&["2024-01-01 00:00:00", "1.2.3.4", "443", "online", "", "Dridex"]),
            &columns,
        )
        .unwrap();

        let enriched = EnrichedRecord::new(record, None, "https", 9);
        assert_eq!(enriched.country, UNKNOWN);
        assert_eq!(enriched.asn, UNKNOWN);
        assert_eq!(enriched.asn_org, UNKNOWN);
    }
}

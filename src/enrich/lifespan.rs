//! C2 server lifespan derivation.

use chrono::NaiveDate;

use crate::error_handling::RowError;
use crate::models::BlocklistRecord;

/// Computes how many whole days a C2 server has been observed active.
///
/// `last_online - first_seen`, or `today - first_seen` for servers still
/// ongoing. `today` is injected by the caller so the transform stays
/// clock-free and testable. A `last_online` earlier than `first_seen` is a
/// row defect, not a zero-day lifespan.
pub fn lifespan_days(record: &BlocklistRecord, today: NaiveDate) -> Result<i64, RowError> {
    let end = record.last_online.unwrap_or(today);
    let days = (end - record.first_seen.date()).num_days();
    if days < 0 {
        return Err(RowError::NegativeLifespan);
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::net::Ipv4Addr;

    fn record(first_seen: &str, last_online: Option<&str>) -> BlocklistRecord {
        BlocklistRecord {
            first_seen: NaiveDateTime::parse_from_str(first_seen, "%Y-%m-%d %H:%M:%S").unwrap(),
            ip: Ipv4Addr::new(1, 2, 3, 4),
            port: 443,
            c2_status: "online".to_string(),
            last_online: last_online
                .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            malware: "Dridex".to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_lifespan_with_last_online() {
        let r = record("2024-01-01 00:00:00", Some("2024-01-10"));
        assert_eq!(lifespan_days(&r, day("2099-01-01")).unwrap(), 9);
    }

    #[test]
    fn test_lifespan_ongoing_uses_today() {
        let r = record("2024-01-01 00:00:00", None);
        assert_eq!(lifespan_days(&r, day("2024-01-31")).unwrap(), 30);
    }

    #[test]
    fn test_lifespan_same_day_is_zero() {
        let r = record("2024-01-01 12:34:56", Some("2024-01-01"));
        assert_eq!(lifespan_days(&r, day("2099-01-01")).unwrap(), 0);
    }

    #[test]
    fn test_negative_lifespan_is_row_error() {
        let r = record("2024-01-10 00:00:00", Some("2024-01-01"));
        assert_eq!(
            lifespan_days(&r, day("2099-01-01")).unwrap_err(),
            RowError::NegativeLifespan
        );
    }
}

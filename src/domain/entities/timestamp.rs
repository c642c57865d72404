//! Fixed-width RFC 3339 timestamps
//!
//! Stores use string comparison to order records by creation time, so every
//! timestamp is written with nine fractional digits and a `Z` suffix.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    DateTime::<Utc>::deserialize(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Stamped {
        #[serde(with = "super")]
        at: DateTime<Utc>,
    }

    fn encoded(at: DateTime<Utc>) -> String {
        serde_json::to_value(Stamped { at }).unwrap()["at"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_string_order_follows_time_order() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 6).unwrap();
        let before = whole - chrono::Duration::milliseconds(500);

        assert_eq!(encoded(whole), "2024-03-01T12:00:06.000000000Z");
        assert!(encoded(before) < encoded(whole));
    }

    #[test]
    fn test_reads_back_exactly() {
        let at = Utc::now();
        let json = serde_json::to_string(&Stamped { at }).unwrap();
        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, at);
    }
}

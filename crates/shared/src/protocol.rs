use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Collection segment served by the actions backend.
pub const ACTIONS_COLLECTION: &str = "actions";

/// Request body for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(alias = "action")]
    pub description: String,
    #[serde(with = "wire_date")]
    pub date: NaiveDate,
    pub points: f64,
}

/// Parses a wire date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is
/// truncated to its UTC calendar day.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
}

pub mod wire_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_wire_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date `{raw}`")))
    }
}
